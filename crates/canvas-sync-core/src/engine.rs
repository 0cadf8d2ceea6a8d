//! One sync run end to end, plus the connection backoff around it.
//!
//! resolve courses → per course (concurrently): catalog, local scan, plan →
//! confirm updates → media filter → rotate old copies → transfer.

use std::future::Future;

use futures::future::try_join_all;
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::catalog::build_catalog;
use crate::config::SyncConfig;
use crate::control::SyncControl;
use crate::downloader::{Downloader, ProgressStats};
use crate::error::{Result, SyncError};
use crate::layout::Layout;
use crate::local_state::scan_course;
use crate::planner::{MediaFilter, PlannedFile, Planner, SyncPlan, SyncTask};
use crate::resolver::{resolve_courses, CourseContext};
use crate::rotate::rotate_all;

/// Lowest connection count the run is retried with after connect errors.
pub const MIN_CONNECTIONS: usize = 2;

/// Connection count for the next attempt after a connect error, or `None` when out of retries.
pub fn next_connection_count(current: usize) -> Option<usize> {
    if current <= MIN_CONNECTIONS {
        None
    } else {
        Some((current / 2).max(MIN_CONNECTIONS))
    }
}

/// Hooks for the interactive part of a run.
pub trait UpdatePrompt: Sync {
    /// Called once with the full plan when there is something to download.
    fn show_plan(&self, _plan: &SyncPlan) {}

    /// Whether to download newer versions of files that exist locally.
    fn confirm_updates(&self, later: &[PlannedFile]) -> bool;
}

/// Accepts every update without asking.
pub struct AutoConfirm;

impl UpdatePrompt for AutoConfirm {
    fn confirm_updates(&self, _later: &[PlannedFile]) -> bool {
        true
    }
}

/// What a run found and did.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub courses: Vec<CourseContext>,
    /// Remote files discovered across all courses.
    pub discovered: usize,
    pub unchanged: usize,
    pub new_files: Vec<PlannedFile>,
    pub later_files: Vec<PlannedFile>,
    pub skipped: Vec<PlannedFile>,
    /// Removed by the media-type filter.
    pub filtered_out: Vec<PlannedFile>,
    /// The user declined downloading updated files.
    pub updates_declined: bool,
    pub downloaded: usize,
    pub bytes_transferred: u64,
    pub failures: Vec<String>,
    /// Connection count of the attempt that produced this report.
    pub connection_count: usize,
}

impl SyncReport {
    /// Nothing new or updated was found.
    pub fn already_synced(&self) -> bool {
        self.new_files.is_empty() && self.later_files.is_empty()
    }
}

pub struct Syncer {
    cfg: SyncConfig,
    control: SyncControl,
    progress_tx: Option<mpsc::Sender<ProgressStats>>,
}

impl Syncer {
    pub fn new(cfg: SyncConfig, control: SyncControl) -> Self {
        Self {
            cfg,
            control,
            progress_tx: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Run, halving the connection count and starting over on connect errors.
    pub async fn run(&self, prompt: &dyn UpdatePrompt) -> Result<SyncReport> {
        with_connection_backoff(self.cfg.connection_count.max(1), |connections| {
            self.run_once(connections, prompt)
        })
        .await
    }

    /// A single attempt with a fixed connection count.
    pub async fn run_once(
        &self,
        connections: usize,
        prompt: &dyn UpdatePrompt,
    ) -> Result<SyncReport> {
        let client = ApiClient::new(&self.cfg, connections)?;
        let _closer = close_on_abort(&client, &self.control);
        let layout = Layout::new(&self.cfg.download_dir, self.cfg.no_subfolder);
        tokio::fs::create_dir_all(&self.cfg.download_dir).await?;

        let courses = self
            .until_cancelled(resolve_courses(
                &client,
                &self.cfg.course_codes,
                &self.cfg.course_ids,
            ))
            .await?;
        tracing::info!(courses = courses.len(), "courses resolved");

        let planner = Planner::new(&client, &layout, self.cfg.filesize_threshold_bytes());
        let per_course = try_join_all(
            courses
                .iter()
                .map(|course| plan_course(&client, &layout, &planner, course)),
        );
        let mut plan = SyncPlan::default();
        for p in self.until_cancelled(per_course).await? {
            plan.merge(p);
        }
        plan.sort();
        tracing::info!(
            discovered = plan.discovered,
            unchanged = plan.unchanged,
            new = plan.new_files.len(),
            later = plan.later_files.len(),
            skipped = plan.skipped.len(),
            "plan ready"
        );

        let mut report = SyncReport {
            courses,
            discovered: plan.discovered,
            unchanged: plan.unchanged,
            connection_count: client.connection_count(),
            ..SyncReport::default()
        };
        if plan.is_synced() {
            report.skipped = plan.skipped;
            tracing::info!("all local files are synced");
            return Ok(report);
        }

        prompt.show_plan(&plan);
        if !plan.later_files.is_empty()
            && !self.cfg.auto_confirm
            && !prompt.confirm_updates(&plan.later_files)
        {
            report.updates_declined = true;
            report.later_files = std::mem::take(&mut plan.later_files);
            plan.recompute_totals();
        }
        self.control_check()?;

        let filter = MediaFilter::from_config(&self.cfg);
        if !filter.allows_everything() {
            report.filtered_out = plan.apply_media_filter(&filter);
        }
        let later = rotate_all(
            std::mem::take(&mut plan.later_files),
            !self.cfg.no_keep_older_version,
        )
        .await;
        plan.later_files = later;
        plan.recompute_totals();

        let tasks: Vec<SyncTask> = plan
            .new_files
            .iter()
            .chain(plan.later_files.iter())
            .map(|f| f.task.clone())
            .collect();
        let total = plan.total_new_bytes + plan.total_later_bytes;
        let summary = Downloader::new(client, self.control.clone())
            .with_progress(self.progress_tx.clone())
            .run(tasks, total)
            .await;
        if summary.aborted {
            return Err(SyncError::Cancelled);
        }

        report.downloaded = summary.downloaded;
        report.bytes_transferred = summary.bytes;
        report.failures = summary.failures;
        report.new_files = plan.new_files;
        if !report.updates_declined {
            report.later_files = plan.later_files;
        }
        report.skipped = plan.skipped;
        Ok(report)
    }

    async fn until_cancelled<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            r = fut => r,
            _ = self.control.cancelled() => Err(SyncError::Cancelled),
        }
    }

    fn control_check(&self) -> Result<()> {
        self.control.check().map_err(|_| SyncError::Cancelled)
    }
}

/// Call `attempt` with `start` connections, then with halved counts while it fails to connect.
async fn with_connection_backoff<T, F, Fut>(start: usize, mut attempt: F) -> Result<T>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut connections = start;
    loop {
        match attempt(connections).await {
            Err(e) if e.is_connect() => match next_connection_count(connections) {
                Some(next) => {
                    tracing::warn!(
                        error = %e,
                        connections = next,
                        "server connect error, reducing connection count and retrying"
                    );
                    connections = next;
                }
                None => return Err(e),
            },
            other => return other,
        }
    }
}

/// Closes `client` once the run is aborted, so requests still queued for a
/// connection fail at once. Stops watching when dropped.
struct CloseOnAbort(tokio::task::JoinHandle<()>);

impl Drop for CloseOnAbort {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn close_on_abort(client: &ApiClient, control: &SyncControl) -> CloseOnAbort {
    let client = client.clone();
    let control = control.clone();
    CloseOnAbort(tokio::spawn(async move {
        control.cancelled().await;
        client.close();
    }))
}

async fn plan_course(
    client: &ApiClient,
    layout: &Layout,
    planner: &Planner<'_>,
    course: &CourseContext,
) -> Result<SyncPlan> {
    let catalog = build_catalog(client, course.id).await?;
    let local = scan_course(layout, &course.code, &catalog.folders).await?;
    planner.plan_course(course, &catalog, &local).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_backoff_halves_to_two() {
        assert_eq!(next_connection_count(16), Some(8));
        assert_eq!(next_connection_count(5), Some(2));
        assert_eq!(next_connection_count(3), Some(2));
        assert_eq!(next_connection_count(2), None);
        assert_eq!(next_connection_count(1), None);
    }

    #[tokio::test]
    async fn backoff_tries_halved_counts_until_two() {
        let mut tried = Vec::new();
        let res: Result<()> = with_connection_backoff(8, |n| {
            tried.push(n);
            async { Err(SyncError::Connect("refused".into())) }
        })
        .await;
        assert!(matches!(res, Err(SyncError::Connect(_))));
        assert_eq!(tried, vec![8, 4, 2]);
    }

    #[tokio::test]
    async fn backoff_stops_on_success_or_other_errors() {
        let mut tried = Vec::new();
        let res = with_connection_backoff(16, |n| {
            tried.push(n);
            async move {
                if n > 4 {
                    Err(SyncError::Connect("refused".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(res.unwrap(), 4);
        assert_eq!(tried, vec![16, 8, 4]);

        let mut calls = 0;
        let res: Result<()> = with_connection_backoff(16, |_| {
            calls += 1;
            async { Err(SyncError::Api("Invalid access token.".into())) }
        })
        .await;
        assert!(matches!(res, Err(SyncError::Api(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn abort_closes_client() {
        let cfg = SyncConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: "t".into(),
            ..SyncConfig::default()
        };
        let client = ApiClient::new(&cfg, 1).unwrap();
        let control = SyncControl::new();
        let _closer = close_on_abort(&client, &control);
        control.request_abort();
        tokio::task::yield_now().await;
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            client.get_json("http://127.0.0.1:9/api/v1/courses"),
        )
        .await
        .expect("request should not hang")
        .unwrap_err();
        assert!(matches!(err, SyncError::Cancelled), "got {err:?}");
    }

    #[test]
    fn auto_confirm_accepts() {
        assert!(AutoConfirm.confirm_updates(&[]));
    }
}

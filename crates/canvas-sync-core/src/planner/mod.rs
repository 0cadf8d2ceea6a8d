//! Classify remote files against the local tree.
//!
//! Every remote file with a source URL lands in exactly one of: unchanged,
//! new, later (newer remotely than the local copy) or skipped (new but over
//! the size threshold). Unchanged files never touch the network.

mod filter;

pub use filter::{MediaFilter, MediaKind};

use std::path::PathBuf;

use futures::future::try_join_all;

use crate::api::ApiClient;
use crate::catalog::{CourseCatalog, RemoteFile};
use crate::error::Result;
use crate::fetch_head::remote_size;
use crate::layout::{label, Layout};
use crate::local_state::LocalListing;
use crate::resolver::CourseContext;

/// One remote file to one local destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTask {
    pub source_url: String,
    pub destination: PathBuf,
    pub expected_size: u64,
}

/// A task with the label it is reported under (`CS101/Lectures/w1.pdf`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub label: String,
    pub task: SyncTask,
}

impl PlannedFile {
    pub fn size(&self) -> u64 {
        self.task.expected_size
    }

    /// Size in MB (1 MB = 1_000_000 bytes).
    pub fn size_mb(&self) -> f64 {
        self.task.expected_size as f64 / 1_000_000.0
    }
}

/// Outcome for a single remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No source URL yet.
    Pending,
    Unchanged,
    New(PlannedFile),
    Later(PlannedFile),
    /// New but larger than the threshold; a zero-byte placeholder was created.
    Skipped(PlannedFile),
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub new_files: Vec<PlannedFile>,
    pub later_files: Vec<PlannedFile>,
    pub skipped: Vec<PlannedFile>,
    pub total_new_bytes: u64,
    pub total_later_bytes: u64,
    pub unchanged: usize,
    /// Remote files seen, including unchanged and pending ones.
    pub discovered: usize,
}

impl SyncPlan {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Pending => {}
            Decision::Unchanged => self.unchanged += 1,
            Decision::New(f) => {
                self.total_new_bytes += f.size();
                self.new_files.push(f);
            }
            Decision::Later(f) => {
                self.total_later_bytes += f.size();
                self.later_files.push(f);
            }
            Decision::Skipped(f) => self.skipped.push(f),
        }
    }

    pub fn merge(&mut self, other: SyncPlan) {
        self.new_files.extend(other.new_files);
        self.later_files.extend(other.later_files);
        self.skipped.extend(other.skipped);
        self.total_new_bytes += other.total_new_bytes;
        self.total_later_bytes += other.total_later_bytes;
        self.unchanged += other.unchanged;
        self.discovered += other.discovered;
    }

    /// Order every bucket by label so reports are stable.
    pub fn sort(&mut self) {
        for bucket in [&mut self.new_files, &mut self.later_files, &mut self.skipped] {
            bucket.sort_by(|a, b| a.label.cmp(&b.label));
        }
    }

    /// True when nothing needs downloading.
    pub fn is_synced(&self) -> bool {
        self.new_files.is_empty() && self.later_files.is_empty()
    }

    pub fn recompute_totals(&mut self) {
        self.total_new_bytes = self.new_files.iter().map(PlannedFile::size).sum();
        self.total_later_bytes = self.later_files.iter().map(PlannedFile::size).sum();
    }

    /// Drop new and later files whose media kind is disallowed. Returns the removed entries.
    pub fn apply_media_filter(&mut self, filter: &MediaFilter) -> Vec<PlannedFile> {
        let mut removed = Vec::new();
        for bucket in [&mut self.new_files, &mut self.later_files] {
            let (keep, drop): (Vec<_>, Vec<_>) = std::mem::take(bucket)
                .into_iter()
                .partition(|f| filter.allows(&f.task.destination));
            *bucket = keep;
            removed.extend(drop);
        }
        for f in &removed {
            tracing::info!(
                file = %f.label,
                kind = filter.rejected_kind(&f.task.destination).map_or("media", MediaKind::as_str),
                "removed from download list because of its file type"
            );
        }
        self.recompute_totals();
        removed
    }
}

/// Per-run classification parameters.
pub struct Planner<'a> {
    client: &'a ApiClient,
    layout: &'a Layout,
    threshold_bytes: u64,
}

impl<'a> Planner<'a> {
    pub fn new(client: &'a ApiClient, layout: &'a Layout, threshold_bytes: u64) -> Self {
        Self {
            client,
            layout,
            threshold_bytes,
        }
    }

    /// Classify every file of one course, concurrently.
    pub async fn plan_course(
        &self,
        course: &CourseContext,
        catalog: &CourseCatalog,
        local: &LocalListing,
    ) -> Result<SyncPlan> {
        let decisions = try_join_all(
            catalog
                .files
                .values()
                .map(|file| self.classify(course, file, local)),
        )
        .await?;
        let mut plan = SyncPlan {
            discovered: catalog.files.len(),
            ..SyncPlan::default()
        };
        for d in decisions {
            plan.record(d);
        }
        Ok(plan)
    }

    pub async fn classify(
        &self,
        course: &CourseContext,
        file: &RemoteFile,
        local: &LocalListing,
    ) -> Result<Decision> {
        let Some(source_url) = file.source_url.as_deref() else {
            return Ok(Decision::Pending);
        };
        let destination = self.layout.destination(&course.code, &file.path);
        let local_watermark = local.get(&file.path).copied();
        if matches!(local_watermark, Some(ts) if file.modified_at <= ts) {
            return Ok(Decision::Unchanged);
        }

        let size = remote_size(self.client, source_url).await?;
        let planned = PlannedFile {
            label: label(&course.code, &file.path),
            task: SyncTask {
                source_url: source_url.to_string(),
                destination,
                expected_size: size,
            },
        };
        if local_watermark.is_some() {
            return Ok(Decision::Later(planned));
        }
        if size > self.threshold_bytes {
            if let Err(e) = tokio::fs::File::create(&planned.task.destination).await {
                tracing::warn!(
                    path = %planned.task.destination.display(),
                    error = %e,
                    "could not create placeholder for oversized file"
                );
            }
            return Ok(Decision::Skipped(planned));
        }
        Ok(Decision::New(planned))
    }
}

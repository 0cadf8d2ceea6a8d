//! Concurrent transfer executor.
//!
//! Every task runs on a `JoinSet`; the client's shared semaphore bounds how
//! many bodies stream at once. One task failing never affects the others.

mod progress;
mod transfer;

pub use progress::ProgressStats;
pub use transfer::TransferResult;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::api::ApiClient;
use crate::control::SyncControl;
use crate::planner::SyncTask;

use progress::ProgressTracker;
use transfer::transfer;

/// Totals for one batch of transfers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    pub downloaded: usize,
    pub bytes: u64,
    /// `"{source} => {destination}"` per failed transfer.
    pub failures: Vec<String>,
    pub aborted: bool,
}

pub struct Downloader {
    client: ApiClient,
    control: SyncControl,
    progress_tx: Option<mpsc::Sender<ProgressStats>>,
}

impl Downloader {
    pub fn new(client: ApiClient, control: SyncControl) -> Self {
        Self {
            client,
            control,
            progress_tx: None,
        }
    }

    /// Send progress snapshots to `tx` while transfers run.
    pub fn with_progress(mut self, tx: Option<mpsc::Sender<ProgressStats>>) -> Self {
        self.progress_tx = tx;
        self
    }

    /// Run all `tasks`; `total_bytes` is only used for progress reporting.
    pub async fn run(&self, tasks: Vec<SyncTask>, total_bytes: u64) -> TransferSummary {
        let progress = Arc::new(ProgressTracker::new(
            total_bytes,
            tasks.len(),
            self.progress_tx.clone(),
        ));
        let mut join_set = JoinSet::new();
        for task in tasks {
            let client = self.client.clone();
            let control = self.control.clone();
            let progress = Arc::clone(&progress);
            join_set.spawn(async move {
                let result = transfer(&client, &task, &control, &progress).await;
                (task, result)
            });
        }

        let mut summary = TransferSummary::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, TransferResult::Done(bytes))) => {
                    summary.downloaded += 1;
                    summary.bytes += bytes;
                }
                Ok((task, TransferResult::Failed(line))) => {
                    tracing::debug!(path = %task.destination.display(), "transfer failed");
                    summary.failures.push(line);
                }
                Ok((_, TransferResult::Aborted)) => summary.aborted = true,
                Err(e) => {
                    tracing::error!(error = %e, "transfer task panicked");
                    summary.failures.push(format!("transfer task: {e}"));
                }
            }
        }
        summary.failures.sort();
        if self.control.is_aborted() {
            summary.aborted = true;
        }
        tracing::info!(
            downloaded = summary.downloaded,
            bytes = progress.bytes_done(),
            failed = summary.failures.len(),
            "transfers finished"
        );
        summary
    }
}

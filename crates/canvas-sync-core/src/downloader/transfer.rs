//! One streamed GET into a temp file.

use futures::StreamExt;

use crate::api::ApiClient;
use crate::control::SyncControl;
use crate::error::SyncError;
use crate::planner::SyncTask;
use crate::storage::StorageWriter;

use super::progress::ProgressTracker;

/// How a single transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// Renamed into place after writing this many bytes.
    Done(u64),
    /// Recorded as `"{source} => {destination}"`.
    Failed(String),
    Aborted,
}

fn failure_line(task: &SyncTask) -> String {
    format!("{} => {}", task.source_url, task.destination.display())
}

/// Download `task`. Never leaves a `.temp` file behind.
pub(crate) async fn transfer(
    client: &ApiClient,
    task: &SyncTask,
    control: &SyncControl,
    progress: &ProgressTracker,
) -> TransferResult {
    if control.check().is_err() {
        return TransferResult::Aborted;
    }
    let opened = tokio::select! {
        r = client.open_download(&task.source_url) => r,
        _ = control.cancelled() => return TransferResult::Aborted,
    };
    let (_permit, resp) = match opened {
        Ok(v) => v,
        Err(SyncError::Cancelled) => return TransferResult::Aborted,
        Err(e) => {
            tracing::warn!(url = %task.source_url, error = %e, "request failed");
            return TransferResult::Failed(failure_line(task));
        }
    };
    if resp.status().as_u16() >= 400 {
        tracing::warn!(url = %task.source_url, status = resp.status().as_u16(), "download refused");
        return TransferResult::Failed(failure_line(task));
    }

    let mut writer = match StorageWriter::create(&task.destination).await {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(path = %task.destination.display(), error = %e, "cannot create temp file");
            return TransferResult::Failed(failure_line(task));
        }
    };

    let mut body = resp.bytes_stream();
    loop {
        let chunk = tokio::select! {
            c = body.next() => c,
            _ = control.cancelled() => {
                writer.discard().await;
                return TransferResult::Aborted;
            }
        };
        match chunk {
            Some(Ok(bytes)) => {
                if let Err(e) = writer.write_chunk(&bytes).await {
                    tracing::warn!(path = %writer.temp_path().display(), error = %e, "write failed");
                    writer.discard().await;
                    return TransferResult::Failed(failure_line(task));
                }
                progress.add_bytes(bytes.len() as u64);
            }
            Some(Err(e)) => {
                tracing::warn!(url = %task.source_url, error = %e, "body stream failed");
                writer.discard().await;
                return TransferResult::Failed(failure_line(task));
            }
            None => break,
        }
    }

    if control.check().is_err() {
        writer.discard().await;
        return TransferResult::Aborted;
    }
    let written = writer.bytes_written();
    match writer.finalize().await {
        Ok(()) => {
            progress.file_finished();
            TransferResult::Done(written)
        }
        Err(e) => {
            tracing::warn!(path = %task.destination.display(), error = %e, "rename into place failed");
            TransferResult::Failed(failure_line(task))
        }
    }
}

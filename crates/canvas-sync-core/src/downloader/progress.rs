//! Progress reporting for a batch of transfers (bytes done, ETA, rate).
//!
//! Consumers can compute rate = bytes_done / elapsed_secs and
//! ETA = (total_bytes - bytes_done) / rate.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;

/// Snapshot of transfer progress (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Bytes written so far across all transfers.
    pub bytes_done: u64,
    /// Sum of expected sizes of all planned transfers.
    pub total_bytes: u64,
    /// Elapsed time since the batch started (seconds).
    pub elapsed_secs: f64,
    pub files_done: usize,
    pub file_count: usize,
}

impl ProgressStats {
    /// Total download rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}

/// Shared counters updated by every transfer task.
pub(crate) struct ProgressTracker {
    bytes_done: AtomicU64,
    files_done: AtomicUsize,
    total_bytes: u64,
    file_count: usize,
    started: Instant,
    tx: Option<mpsc::Sender<ProgressStats>>,
}

impl ProgressTracker {
    pub(crate) fn new(
        total_bytes: u64,
        file_count: usize,
        tx: Option<mpsc::Sender<ProgressStats>>,
    ) -> Self {
        Self {
            bytes_done: AtomicU64::new(0),
            files_done: AtomicUsize::new(0),
            total_bytes,
            file_count,
            started: Instant::now(),
            tx,
        }
    }

    pub(crate) fn add_bytes(&self, n: u64) {
        self.bytes_done.fetch_add(n, Ordering::Relaxed);
        self.publish();
    }

    pub(crate) fn file_finished(&self) {
        self.files_done.fetch_add(1, Ordering::Relaxed);
        self.publish();
    }

    pub(crate) fn bytes_done(&self) -> u64 {
        self.bytes_done.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            bytes_done: self.bytes_done(),
            total_bytes: self.total_bytes,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            files_done: self.files_done.load(Ordering::Relaxed),
            file_count: self.file_count,
        }
    }

    /// Non-blocking; a full channel drops the snapshot.
    fn publish(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(self.snapshot());
        }
    }
}

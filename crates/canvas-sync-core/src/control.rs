//! Run control: a shared abort token the CLI sets on Ctrl-C.
//!
//! Transfers check the token before starting and between chunks; a transfer
//! that sees it removes its temp file and stops. Metadata phases race against
//! [`SyncControl::cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Error returned when a transfer is stopped by the user.
#[derive(Debug)]
pub struct TransferAborted;

impl std::fmt::Display for TransferAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transfer aborted by user")
    }
}

impl std::error::Error for TransferAborted {}

/// Cloneable handle; all clones share one token.
#[derive(Debug, Clone, Default)]
pub struct SyncControl {
    aborted: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl SyncControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every task to stop. Idempotent.
    pub fn request_abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once an abort has been requested (immediately if it already was).
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }

    /// `Err(TransferAborted)` once an abort has been requested.
    pub fn check(&self) -> Result<(), TransferAborted> {
        if self.is_aborted() {
            Err(TransferAborted)
        } else {
            Ok(())
        }
    }
}

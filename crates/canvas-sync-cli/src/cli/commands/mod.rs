//! CLI command handlers.

mod report;
mod sync;

pub use sync::run_sync;

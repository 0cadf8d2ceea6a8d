pub mod config;
pub mod error;
pub mod logging;

pub mod api;
pub mod catalog;
pub mod control;
pub mod downloader;
pub mod engine;
pub mod fetch_head;
pub mod layout;
pub mod local_state;
pub mod pagination;
pub mod planner;
pub mod resolver;
pub mod retry;
pub mod rotate;
pub mod storage;

pub use error::{Result, SyncError};

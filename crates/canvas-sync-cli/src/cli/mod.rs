//! CLI for canvas-sync.

mod commands;

use anyhow::Result;
use canvas_sync_core::config::{self, SyncConfig};
use clap::Parser;
use std::path::PathBuf;

use commands::run_sync;

/// Sync files from Canvas courses into a local directory.
#[derive(Debug, Parser)]
#[command(name = "canvas-sync", version)]
#[command(about = "A simple Canvas file syncer", long_about = None)]
pub struct Cli {
    /// Confirm all prompts (download updated files without asking).
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Do not create a subfolder named after each course code.
    #[arg(long)]
    pub no_subfolder: bool,

    /// Maximum number of concurrent connections to the server.
    #[arg(short = 'c', long = "connection", value_name = "N")]
    pub connection: Option<usize>,

    /// Proxy for every request (e.g. http://127.0.0.1:7890).
    #[arg(short = 'x', long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Delete the old copy of an updated file instead of keeping it under a timestamped name.
    #[arg(long)]
    pub no_keep_older_version: bool,

    /// Config file to use instead of the default location.
    #[arg(short = 'p', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug information.
    #[arg(short = 'd', long)]
    pub debug: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        self.apply_overrides(&mut cfg);
        tracing::debug!(
            base_url = %cfg.base_url,
            courses = cfg.course_codes.len() + cfg.course_ids.len(),
            connections = cfg.connection_count,
            "loaded config"
        );
        run_sync(cfg, self.debug).await
    }

    /// Flags win over the config file; boolean flags only ever switch a behavior on.
    pub fn apply_overrides(&self, cfg: &mut SyncConfig) {
        cfg.auto_confirm |= self.yes;
        cfg.no_subfolder |= self.no_subfolder;
        cfg.no_keep_older_version |= self.no_keep_older_version;
        if let Some(n) = self.connection {
            cfg.connection_count = n;
        }
        if let Some(proxy) = &self.proxy {
            cfg.proxy = Some(proxy.clone());
        }
    }
}

#[cfg(test)]
mod tests;

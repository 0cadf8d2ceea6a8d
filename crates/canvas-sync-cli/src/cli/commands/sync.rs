//! `canvas-sync` – plan, confirm and download.

use anyhow::{Context, Result};
use canvas_sync_core::config::SyncConfig;
use canvas_sync_core::control::SyncControl;
use canvas_sync_core::downloader::ProgressStats;
use canvas_sync_core::engine::{Syncer, UpdatePrompt};
use canvas_sync_core::planner::{PlannedFile, SyncPlan};
use canvas_sync_core::SyncError;
use std::io::{BufRead, Write};
use std::time::Instant;

use super::report::{print_plan, print_report};

/// Asks on stdin before downloading updated files.
struct StdinPrompt {
    threshold_mb: f64,
}

impl UpdatePrompt for StdinPrompt {
    fn show_plan(&self, plan: &SyncPlan) {
        print_plan(plan, self.threshold_mb);
    }

    fn confirm_updates(&self, _later: &[PlannedFile]) -> bool {
        print!("Update all?(Y/n) ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        accepts(&answer)
    }
}

/// Anything but an explicit no counts as yes.
pub(crate) fn accepts(answer: &str) -> bool {
    !answer.trim().eq_ignore_ascii_case("n")
}

pub async fn run_sync(cfg: SyncConfig, debug: bool) -> Result<()> {
    cfg.validate()?;
    let prompt = StdinPrompt {
        threshold_mb: cfg.filesize_threshold_mb,
    };

    let control = SyncControl::new();
    {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nOperation cancelled by user, exiting...");
                control.request_abort();
            }
        });
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    const PROGRESS_INTERVAL_MS: u64 = 500;
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.files_done == stats.file_count
            {
                let done_mb = stats.bytes_done as f64 / 1_000_000.0;
                let total_mb = stats.total_bytes as f64 / 1_000_000.0;
                let pct = stats.fraction() * 100.0;
                let rate_mb = stats.bytes_per_sec() / 1_000_000.0;
                let eta = stats
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                print!(
                    "\r  {:.1} / {:.1} MB ({:.1}%)  {} / {} files  {:.2} MB/s  ETA {}  ",
                    done_mb, total_mb, pct, stats.files_done, stats.file_count, rate_mb, eta
                );
                let _ = std::io::stdout().flush();
                last_print = now;
                printed = true;
            }
        }
        if printed {
            println!();
        }
    });

    println!("Finding files on canvas...");
    let syncer = Syncer::new(cfg, control).with_progress(progress_tx);
    let result = syncer.run(&prompt).await;
    drop(syncer);
    let _ = progress_handle.await;

    let report = match result {
        Ok(report) => report,
        Err(e @ SyncError::Connect(_)) => {
            let hint = if debug { "" } else { " Or use -d for detailed information." };
            return Err(e).context(format!("please check your network and token!{hint}"));
        }
        Err(e) => return Err(e.into()),
    };
    print_report(&report)?;
    tracing::info!(
        downloaded = report.downloaded,
        bytes = report.bytes_transferred,
        failed = report.failures.len(),
        "sync completed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::accepts;

    #[test]
    fn only_explicit_no_declines() {
        assert!(accepts("\n"));
        assert!(accepts("y\n"));
        assert!(accepts("Y"));
        assert!(accepts("yes"));
        assert!(!accepts("n\n"));
        assert!(!accepts(" N "));
    }
}

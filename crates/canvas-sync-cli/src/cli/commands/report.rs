//! Plain-text rendering of plans and reports.

use std::io::{self, Write};

use canvas_sync_core::engine::SyncReport;
use canvas_sync_core::planner::{PlannedFile, SyncPlan};

/// `CS101/Lectures/w1.pdf (1.25MB)`
pub fn format_entry(file: &PlannedFile) -> String {
    format!("{} ({:.2}MB)", file.label, file.size_mb())
}

pub fn print_plan(plan: &SyncPlan, threshold_mb: f64) {
    if !plan.skipped.is_empty() {
        println!("These file(s) will not be synced due to their size (over {threshold_mb} MB):");
        for f in &plan.skipped {
            println!("{}", format_entry(f));
        }
    }
    if !plan.new_files.is_empty() {
        println!("Start to download {} file(s)!", plan.new_files.len());
        for f in &plan.new_files {
            println!("{}", format_entry(f));
        }
    }
    if !plan.later_files.is_empty() {
        println!("These file(s) have later version on canvas:");
        for f in &plan.later_files {
            println!("{}", format_entry(f));
        }
    }
}

pub fn print_report(report: &SyncReport) -> io::Result<()> {
    write_report(&mut io::stdout().lock(), report)
}

pub fn write_report(out: &mut impl Write, report: &SyncReport) -> io::Result<()> {
    writeln!(
        out,
        "Synced {} course(s), {} file(s) on canvas.",
        report.courses.len(),
        report.discovered
    )?;
    if report.already_synced() {
        // No plan was shown on this path.
        if !report.skipped.is_empty() {
            writeln!(out, "These file(s) were not synced due to their size:")?;
            for f in &report.skipped {
                writeln!(out, "{}", format_entry(f))?;
            }
        }
        writeln!(out, "All local files are synced!")?;
        return Ok(());
    }
    for f in &report.filtered_out {
        writeln!(out, "Removed {} from the download list because of its file type.", f.label)?;
    }
    if report.updates_declined {
        writeln!(out, "Skipped {} updated file(s).", report.later_files.len())?;
    }
    writeln!(
        out,
        "Downloaded {} file(s), {:.2}MB.",
        report.downloaded,
        report.bytes_transferred as f64 / 1_000_000.0
    )?;
    if !report.failures.is_empty() {
        writeln!(out, "Fail to download these {} file(s):", report.failures.len())?;
        for line in &report.failures {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

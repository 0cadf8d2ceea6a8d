//! Make room for updated files before their new version is downloaded.
//!
//! The existing copy is renamed to `{watermark}_{name}` next to it, or
//! deleted when older versions are not kept. If that name is already taken
//! the existing file stays put and the download is redirected to
//! `{now}_{name}` instead.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::local_state::{epoch_secs, file_watermark};
use crate::planner::PlannedFile;

/// What happened to the existing local copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Old copy moved aside to this path.
    Renamed(PathBuf),
    Removed,
    /// Old copy kept in place; the download goes to this path instead.
    Redirected(PathBuf),
}

/// `dir/{prefix}_{name}` for `dir/name`.
fn prefixed(path: &Path, prefix: i64) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name in {}", path.display()),
        )
    })?;
    Ok(path.with_file_name(format!("{}_{}", prefix, name.to_string_lossy())))
}

/// Rotate the existing copy at `file.task.destination`, updating the destination on redirect.
pub async fn rotate_one(file: &mut PlannedFile, keep_older: bool, now: i64) -> io::Result<Rotation> {
    let dest = file.task.destination.clone();
    if !keep_older {
        tokio::fs::remove_file(&dest).await?;
        return Ok(Rotation::Removed);
    }
    let ts = file_watermark(&dest).await?;
    let sibling = prefixed(&dest, ts)?;
    if !tokio::fs::try_exists(&sibling).await? {
        tokio::fs::rename(&dest, &sibling).await?;
        return Ok(Rotation::Renamed(sibling));
    }
    let mut stamp = now;
    let mut redirected = prefixed(&dest, stamp)?;
    while tokio::fs::try_exists(&redirected).await? {
        stamp += 1;
        redirected = prefixed(&dest, stamp)?;
    }
    file.task.destination = redirected.clone();
    Ok(Rotation::Redirected(redirected))
}

/// Rotate every file; a file whose rotation fails is dropped with a warning.
pub async fn rotate_all(files: Vec<PlannedFile>, keep_older: bool) -> Vec<PlannedFile> {
    let now = epoch_secs(SystemTime::now());
    let mut ready = Vec::with_capacity(files.len());
    for mut file in files {
        match rotate_one(&mut file, keep_older, now).await {
            Ok(rotation) => {
                tracing::debug!(file = %file.label, ?rotation, "rotated local copy");
                ready.push(file);
            }
            Err(e) => {
                tracing::warn!(
                    path = %file.task.destination.display(),
                    error = %e,
                    "skipping updated file, could not move the old copy"
                );
            }
        }
    }
    ready
}

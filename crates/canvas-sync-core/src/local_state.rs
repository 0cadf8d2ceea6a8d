//! Existing local files per course, with the watermark used for change detection.

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::catalog::{normalize_path, FolderMap};
use crate::error::Result;
use crate::layout::Layout;

/// Relative path (same form as `RemoteFile::path`) -> watermark in Unix seconds.
pub type LocalListing = HashMap<String, i64>;

/// Creation time of the file, or its modification time where the platform has no birth time.
pub fn watermark(meta: &Metadata) -> i64 {
    let time = meta
        .created()
        .or_else(|_| meta.modified())
        .unwrap_or(UNIX_EPOCH);
    epoch_secs(time)
}

/// Watermark of the file at `path`.
pub async fn file_watermark(path: &Path) -> std::io::Result<i64> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(watermark(&meta))
}

pub(crate) fn epoch_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Create each folder's local directory if missing and list the plain files directly inside it.
///
/// Local files the catalog does not know about are listed but never touched.
pub async fn scan_course(
    layout: &Layout,
    course_code: &str,
    folders: &FolderMap,
) -> Result<LocalListing> {
    let mut listing = LocalListing::new();
    for folder in folders.values() {
        let dir = layout.folder_dir(course_code, folder);
        tokio::fs::create_dir_all(&dir).await?;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let rel = normalize_path(&format!("{}/{}", folder, name.to_string_lossy()));
            listing.insert(rel, watermark(&meta));
        }
    }
    tracing::debug!(course = course_code, files = listing.len(), "local files scanned");
    Ok(listing)
}

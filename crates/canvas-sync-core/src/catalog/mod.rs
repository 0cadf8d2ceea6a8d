//! Remote catalog of one course: folder paths and files keyed by local-relative path.

mod sanitize;

pub use sanitize::{
    folder_path, join_remote, normalize_path, replace_forbidden, sanitize_display_name,
    ROOT_MARKER,
};

use std::collections::HashMap;

use crate::api::{ApiClient, ApiFile, ApiFolder};
use crate::error::{Result, SyncError};
use crate::pagination::{collect_pages, Page, PAGES_PER_BATCH};

/// Remote folder id -> sanitized folder path (always starts with `/`).
pub type FolderMap = HashMap<i64, String>;

/// A file listed by the API, placed in the local tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Sanitized path relative to the course directory, starting with `/`.
    pub path: String,
    /// `None` while the server is still processing the upload.
    pub source_url: Option<String>,
    /// Last modification on the server, Unix seconds (UTC).
    pub modified_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    pub folders: FolderMap,
    /// Keyed by [`RemoteFile::path`].
    pub files: HashMap<String, RemoteFile>,
}

/// Parse an ISO-8601 timestamp (`Z` or numeric offset, optional fraction) into Unix seconds.
pub fn parse_timestamp(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.timestamp())
}

/// List folders, then the files inside them, for `course_id`.
pub async fn build_catalog(client: &ApiClient, course_id: i64) -> Result<CourseCatalog> {
    let folders = fetch_folders(client, course_id).await?;
    let files = fetch_files(client, course_id, &folders).await?;
    tracing::debug!(
        course_id,
        folders = folders.len(),
        files = files.len(),
        "catalog built"
    );
    Ok(CourseCatalog { folders, files })
}

pub async fn fetch_folders(client: &ApiClient, course_id: i64) -> Result<FolderMap> {
    collect_pages(PAGES_PER_BATCH, |page| async move {
        let url = client.api_url(&format!("courses/{course_id}/folders?page={page}"));
        let page = client.get_page::<ApiFolder>(&url, false).await?;
        Ok::<_, SyncError>(page.map(|folders| {
            folders
                .into_iter()
                .map(|f| (f.id, folder_path(&f.full_name)))
                .collect::<FolderMap>()
        }))
    })
    .await
}

/// List files, keeping only those whose folder is in `folders`.
pub async fn fetch_files(
    client: &ApiClient,
    course_id: i64,
    folders: &FolderMap,
) -> Result<HashMap<String, RemoteFile>> {
    collect_pages(PAGES_PER_BATCH, |page| async move {
        let url = client.api_url(&format!("courses/{course_id}/files?page={page}"));
        let page: Page<Vec<ApiFile>> = client.get_page(&url, false).await?;
        Ok::<_, SyncError>(page.map(|files| {
            files
                .into_iter()
                .filter_map(|f| remote_file(f, folders))
                .map(|f| (f.path.clone(), f))
                .collect::<HashMap<_, _>>()
        }))
    })
    .await
}

fn remote_file(file: ApiFile, folders: &FolderMap) -> Option<RemoteFile> {
    let folder = folders.get(&file.folder_id)?;
    let path = join_remote(folder, &file.display_name);
    let Some(modified_at) = file.modified_at.as_deref().and_then(parse_timestamp) else {
        tracing::warn!(
            %path,
            modified_at = ?file.modified_at,
            "dropping file with unreadable timestamp"
        );
        return None;
    };
    Some(RemoteFile {
        source_url: file.source_url().map(str::to_string),
        path,
        modified_at,
    })
}

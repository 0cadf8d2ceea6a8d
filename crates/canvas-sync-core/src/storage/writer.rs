//! Sequential temp-file writer for one streamed download.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::temp_path;

/// Writes a body into `{final}.temp` and renames it over `{final}` on success.
pub struct StorageWriter {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl StorageWriter {
    /// Create (or truncate) the temp file for `final_path`.
    pub async fn create(final_path: &Path) -> std::io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::create(&temp_path).await?;
        Ok(Self {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    pub async fn write_chunk(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Flush and rename the temp file onto the final path. On failure the temp file is removed.
    pub async fn finalize(self) -> std::io::Result<()> {
        let Self {
            file,
            temp_path,
            final_path,
            ..
        } = self;
        let result = commit(file, &temp_path, &final_path).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        result
    }

    /// Close and delete the temp file.
    pub async fn discard(self) {
        let Self { file, temp_path, .. } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            tracing::debug!(path = %temp_path.display(), error = %e, "temp file already gone");
        }
    }
}

async fn commit(mut file: File, temp_path: &Path, final_path: &Path) -> std::io::Result<()> {
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(temp_path, final_path).await
}

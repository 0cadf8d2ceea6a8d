use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters for metadata requests (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/canvas-sync/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root URL of the Canvas instance (the API lives under `/api/v1`).
    pub base_url: String,
    /// Personal access token, sent as a bearer credential.
    pub token: String,
    /// Course codes to sync, matched case-insensitively.
    pub course_codes: Vec<String>,
    /// Course IDs to sync.
    pub course_ids: Vec<i64>,
    /// Local root that receives one subdirectory per course.
    pub download_dir: PathBuf,
    /// Maximum concurrent HTTP requests.
    pub connection_count: usize,
    /// Optional outbound proxy for every request.
    pub proxy: Option<String>,
    /// New files above this size (MB, 1 MB = 1_000_000 bytes) are skipped with a placeholder.
    pub filesize_threshold_mb: f64,
    /// Put files directly under `download_dir` instead of a course-code subfolder.
    pub no_subfolder: bool,
    /// Delete the old copy of an updated file instead of keeping it under a timestamped name.
    pub no_keep_older_version: bool,
    pub allow_audio: bool,
    pub allow_video: bool,
    pub allow_image: bool,
    /// Download updated files without asking.
    pub auto_confirm: bool,
    /// Connect and read timeout per request, in seconds.
    pub timeout_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jicanvas.com".to_string(),
            token: String::new(),
            course_codes: Vec::new(),
            course_ids: Vec::new(),
            download_dir: PathBuf::from("."),
            connection_count: 16,
            proxy: None,
            filesize_threshold_mb: 250.0,
            no_subfolder: false,
            no_keep_older_version: false,
            allow_audio: true,
            allow_video: true,
            allow_image: true,
            auto_confirm: false,
            timeout_secs: 5,
            retry: None,
        }
    }
}

impl SyncConfig {
    /// `{base_url}/api/v1` without a trailing slash.
    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.base_url.trim_end_matches('/'))
    }

    /// Size threshold in bytes.
    pub fn filesize_threshold_bytes(&self) -> u64 {
        (self.filesize_threshold_mb.max(0.0) * 1_000_000.0) as u64
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().policy()
    }

    /// Check the fields the engine cannot run without.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url: {}", self.base_url))?;
        if self.token.trim().is_empty() {
            anyhow::bail!("no access token configured");
        }
        if self.course_codes.is_empty() && self.course_ids.is_empty() {
            anyhow::bail!("no course_codes or course_ids configured");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("canvas-sync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<SyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path.
pub fn load_from_path(path: &Path) -> Result<SyncConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: SyncConfig = toml::from_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}

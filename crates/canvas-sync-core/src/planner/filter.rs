//! Media-type filter on planned downloads.

use std::path::Path;

use crate::config::SyncConfig;

/// Media kind of a file, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
    Image,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let kind = match ext.as_str() {
            "mp3" | "wav" | "flac" | "aac" | "m4a" | "ogg" | "oga" | "opus" | "wma" | "aif"
            | "aiff" | "mid" | "midi" | "amr" => MediaKind::Audio,
            "mp4" | "m4v" | "mov" | "avi" | "mkv" | "webm" | "wmv" | "flv" | "mpg" | "mpeg"
            | "3gp" | "ogv" => MediaKind::Video,
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" | "svg" | "ico"
            | "heic" | "heif" | "avif" => MediaKind::Image,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

/// Which media kinds may be downloaded. Files of no known media kind are always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaFilter {
    pub allow_audio: bool,
    pub allow_video: bool,
    pub allow_image: bool,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            allow_audio: true,
            allow_video: true,
            allow_image: true,
        }
    }
}

impl MediaFilter {
    pub fn from_config(cfg: &SyncConfig) -> Self {
        Self {
            allow_audio: cfg.allow_audio,
            allow_video: cfg.allow_video,
            allow_image: cfg.allow_image,
        }
    }

    pub fn allows_everything(&self) -> bool {
        self.allow_audio && self.allow_video && self.allow_image
    }

    /// The disallowed media kind of `path`, if any.
    pub fn rejected_kind(&self, path: &Path) -> Option<MediaKind> {
        let kind = MediaKind::from_path(path)?;
        let allowed = match kind {
            MediaKind::Audio => self.allow_audio,
            MediaKind::Video => self.allow_video,
            MediaKind::Image => self.allow_image,
        };
        (!allowed).then_some(kind)
    }

    pub fn allows(&self, path: &Path) -> bool {
        self.rejected_kind(path).is_none()
    }
}

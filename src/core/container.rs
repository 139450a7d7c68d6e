use std::fmt;
use std::path::Path;

use crate::core::error::ReencodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    Webm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Opus,
}

impl Container {
    /// Parses an extension such as `.mp4`, `mp4` or `.WEBM`.
    pub fn from_extension(ext: &str) -> Result<Self, ReencodeError> {
        let bare = ext.strip_prefix('.').unwrap_or(ext);
        match bare.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Container::Mp4),
            "webm" => Ok(Container::Webm),
            _ => Err(ReencodeError::UnsupportedContainer {
                container: ext.to_string(),
            }),
        }
    }

    /// Codec name ffprobe reports for a stream already in this container's target format.
    pub fn target_video_codec(self) -> &'static str {
        match self {
            Container::Mp4 => "hevc",
            Container::Webm => "vp9",
        }
    }

    pub fn native_audio_codec(self) -> Option<AudioCodec> {
        match self {
            Container::Mp4 | Container::Webm => Some(AudioCodec::Opus),
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Mp4 => f.write_str("mp4"),
            Container::Webm => f.write_str("webm"),
        }
    }
}

impl AudioCodec {
    pub fn encoder(self) -> &'static str {
        match self {
            AudioCodec::Opus => "libopus",
        }
    }

    pub fn probe_name(self) -> &'static str {
        match self {
            AudioCodec::Opus => "opus",
        }
    }
}

/// Extension of `path` including the leading dot, or an empty string.
pub fn source_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Output extension as spelled by the user (override) or the source file.
pub fn resolve_extension(source: &Path, container: Option<&str>) -> String {
    match container {
        Some(ext) if ext.contains('.') => ext.to_string(),
        Some(ext) => format!(".{ext}"),
        None => source_extension(source),
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReencodeError {
    #[error("unsupported container '{container}' (expected .mp4 or .webm)")]
    UnsupportedContainer { container: String },
    #[error("no audio codec is defined for the {container} container")]
    IncompatibleAudioPolicy { container: String },
    #[error("output would overwrite the source itself: {}", path.display())]
    SidecarCollision { path: PathBuf },
    #[error("{} binary not found", binary.display())]
    BinaryNotFound { binary: PathBuf },
    #[error("probing {} failed: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },
    #[error("encoder failed on {pass} (exit_code={exit_code:?})")]
    EncodeFailed {
        pass: String,
        exit_code: Option<i32>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReencodeError {
    /// Validation errors are raised before any encoder process starts.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedContainer { .. }
                | Self::IncompatibleAudioPolicy { .. }
                | Self::SidecarCollision { .. }
        )
    }

    /// Process exit status to report for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EncodeFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            err if err.is_validation() => 2,
            _ => 1,
        }
    }
}

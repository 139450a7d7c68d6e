use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sidecar written next to the untouched source.
    Encoded { source: PathBuf, output: PathBuf },
    /// Sidecar renamed onto `target`.
    Overwritten { source: PathBuf, target: PathBuf },
    /// Nothing to do, the video already uses `codec`.
    Skipped { source: PathBuf, codec: String },
}

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::core::command::EncodePass;
use crate::core::error::ReencodeError;
use crate::core::outcome::Outcome;
use crate::core::plan::{EncodingPlan, FinalAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassStatus {
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl PassStatus {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
        }
    }

    pub fn failed(exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Runs one encoder invocation to completion.
pub trait Encoder {
    fn run(&self, pass: &EncodePass) -> Result<PassStatus, ReencodeError>;
}

pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Encoder for FfmpegEncoder {
    fn run(&self, pass: &EncodePass) -> Result<PassStatus, ReencodeError> {
        let args = pass.to_args();
        debug!(
            "{} {}",
            self.ffmpeg_path.display(),
            shell_words::join(&args)
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReencodeError::BinaryNotFound {
                    binary: self.ffmpeg_path.clone(),
                }
            } else {
                ReencodeError::Io(e)
            }
        })?;

        if status.success() {
            Ok(PassStatus::success())
        } else {
            Ok(PassStatus::failed(status.code()))
        }
    }
}

/// Runs every pass of `plan` in order, then applies its final action.
pub fn execute(plan: &EncodingPlan, encoder: &dyn Encoder) -> Result<Outcome, ReencodeError> {
    if plan.is_empty() {
        return Ok(Outcome::Skipped {
            source: plan.source.clone(),
            codec: plan.already_encoded.clone().unwrap_or_default(),
        });
    }

    let started_at = Instant::now();
    let result = run_passes(&plan.passes, encoder);

    if plan.is_two_pass() {
        remove_artifacts(&plan.artifacts);
    }
    result?;

    info!(
        output = %plan.output.display(),
        elapsed_secs = started_at.elapsed().as_secs(),
        "encode finished"
    );

    match &plan.final_action {
        FinalAction::Keep => Ok(Outcome::Encoded {
            source: plan.source.clone(),
            output: plan.output.clone(),
        }),
        FinalAction::Overwrite { target } => {
            std::fs::rename(&plan.output, target)?;
            info!(from = %plan.output.display(), to = %target.display(), "replaced source");
            Ok(Outcome::Overwritten {
                source: plan.source.clone(),
                target: target.clone(),
            })
        }
    }
}

fn run_passes(passes: &[EncodePass], encoder: &dyn Encoder) -> Result<(), ReencodeError> {
    for pass in passes {
        let label = pass.label();
        info!(pass = %label, "starting encoder");
        let status = encoder.run(pass)?;
        if !status.success {
            return Err(ReencodeError::EncodeFailed {
                pass: label,
                exit_code: status.exit_code,
            });
        }
    }
    Ok(())
}

fn remove_artifacts(artifacts: &[PathBuf]) {
    for artifact in artifacts {
        remove_artifact(artifact);
    }
}

fn remove_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed two-pass log"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "could not remove two-pass log"),
    }
}

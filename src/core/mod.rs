pub mod command;
pub mod container;
pub mod error;
pub mod options;
pub mod outcome;
pub mod plan;
pub mod probe;
pub mod runner;

use error::ReencodeError;
use options::{EncoderConfig, Options};
use outcome::Outcome;
use plan::EncodingPlan;
use probe::FfprobeProbe;
use runner::FfmpegEncoder;

/// Builds the plan for `options.source`, probing it with the configured ffprobe.
pub fn plan(options: &Options, config: &EncoderConfig) -> Result<EncodingPlan, ReencodeError> {
    let probe = FfprobeProbe::new(&config.ffprobe_path);
    plan::build_plan(options, &probe)
}

/// Executes a plan with the configured ffmpeg.
pub fn run(plan: &EncodingPlan, config: &EncoderConfig) -> Result<Outcome, ReencodeError> {
    let encoder = FfmpegEncoder::new(&config.ffmpeg_path);
    runner::execute(plan, &encoder)
}

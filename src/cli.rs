use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::options::{EncoderConfig, Options, Verbosity, DEFAULT_DISTINGUISHER};

#[derive(Debug, Parser)]
#[command(name = "reencode", version, about = "Lecture re-encoding helper")]
pub struct Cli {
    /// The file to re-encode
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Use a different container format (mp4 or webm)
    #[arg(value_name = "CONTAINER")]
    pub container: Option<String>,

    /// Use two-pass encoding instead of single-pass
    #[arg(short = '2', long = "two-pass")]
    pub two_pass: bool,

    /// File suffix to add to re-encoded files
    #[arg(short = 'd', long, default_value = DEFAULT_DISTINGUISHER, allow_hyphen_values = true)]
    pub distinguisher: String,

    /// Overwrite the original file after re-encoding
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// Only display errors and the per-file summary
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log more detail (-v for steps, -vv for full encoder command lines)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Drop similar frames
    #[arg(long)]
    pub decimate: bool,

    /// Limit framerate to 5fps
    #[arg(long = "cap-framerate")]
    pub cap_framerate: bool,

    /// Merge the stereo channels into each other
    #[arg(long = "merge-stereo")]
    pub merge_stereo: bool,

    /// Re-encode audio as opus
    #[arg(long = "reencode-audio")]
    pub reencode_audio: bool,

    /// CRF to use for single-pass encoding
    #[arg(long = "video-crf", default_value_t = 23, value_parser = clap::value_parser!(u8).range(0..=63))]
    pub video_crf: u8,

    /// Video bitrate in kbit/s to target with two-pass encoding
    #[arg(long = "video-bitrate", default_value_t = 128, value_parser = clap::value_parser!(u32).range(1..))]
    pub video_bitrate: u32,

    /// Audio bitrate in kbit/s when audio is re-encoded
    #[arg(long = "audio-bitrate", default_value_t = 32, value_parser = clap::value_parser!(u32).range(1..))]
    pub audio_bitrate: u32,

    /// When to color the summary output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// ffmpeg binary to run
    #[arg(long, env = "REENCODE_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe binary to run
    #[arg(long, env = "REENCODE_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose(self.verbose)
        } else {
            Verbosity::Normal
        }
    }

    pub fn options(&self) -> Options {
        Options {
            source: self.file.clone(),
            container: self.container.clone(),
            distinguisher: self.distinguisher.clone(),
            overwrite: self.overwrite,
            two_pass: self.two_pass,
            verbosity: self.verbosity(),
            decimate: self.decimate,
            cap_framerate: self.cap_framerate,
            merge_stereo: self.merge_stereo,
            reencode_audio: self.reencode_audio,
            video_crf: self.video_crf,
            video_bitrate: self.video_bitrate,
            audio_bitrate: self.audio_bitrate,
        }
    }

    pub fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
        }
    }
}

use std::path::PathBuf;

pub const DEFAULT_DISTINGUISHER: &str = ".2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose(u8),
}

impl Verbosity {
    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}

/// Everything that decides how one file is re-encoded. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub source: PathBuf,
    pub container: Option<String>,
    pub distinguisher: String,
    pub overwrite: bool,
    pub two_pass: bool,
    pub verbosity: Verbosity,
    pub decimate: bool,
    pub cap_framerate: bool,
    pub merge_stereo: bool,
    pub reencode_audio: bool,
    pub video_crf: u8,
    /// kbit/s, two-pass only.
    pub video_bitrate: u32,
    /// kbit/s.
    pub audio_bitrate: u32,
}

impl Options {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            container: None,
            distinguisher: DEFAULT_DISTINGUISHER.to_string(),
            overwrite: false,
            two_pass: false,
            verbosity: Verbosity::Normal,
            decimate: false,
            cap_framerate: false,
            merge_stereo: false,
            reencode_audio: false,
            video_crf: 23,
            video_bitrate: 128,
            audio_bitrate: 32,
        }
    }
}

/// Locations of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

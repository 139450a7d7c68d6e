use std::path::PathBuf;

use crate::core::container::AudioCodec;

#[cfg(windows)]
pub const NULL_SINK: &str = "NUL";
#[cfg(not(windows))]
pub const NULL_SINK: &str = "/dev/null";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateControl {
    Crf(u8),
    TwoPass {
        pass: u8,
        bitrate_kbps: u32,
        /// x265 stats file, or the vpx `-passlogfile` prefix.
        stats: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCodecArgs {
    Hevc { rate: RateControl, quiet: bool },
    Vp9 { rate: RateControl },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioArgs {
    Copy,
    Encode { codec: AudioCodec, bitrate_kbps: u32 },
    Drop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    NullSink,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGraph {
    pub filters: Vec<String>,
    /// Extra encoder flags that only make sense alongside the filters.
    pub companions: Vec<String>,
}

impl FilterGraph {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn push(&mut self, filter: impl Into<String>) {
        self.filters.push(filter.into());
    }

    pub fn to_args(&self, flag: &str) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut args = vec![flag.to_string(), self.filters.join(",")];
        args.extend(self.companions.iter().cloned());
        args
    }
}

impl VideoCodecArgs {
    pub fn pass_number(&self) -> Option<u8> {
        let rate = match self {
            VideoCodecArgs::Hevc { rate, .. } | VideoCodecArgs::Vp9 { rate } => rate,
        };
        match rate {
            RateControl::TwoPass { pass, .. } => Some(*pass),
            RateControl::Crf(_) => None,
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self {
            VideoCodecArgs::Hevc { rate, quiet } => {
                args.push("-c:v".to_string());
                args.push("libx265".to_string());
                let mut params = Vec::new();
                match rate {
                    RateControl::Crf(crf) => {
                        args.push("-preset".to_string());
                        args.push("fast".to_string());
                        params.push(format!("crf={crf}"));
                    }
                    RateControl::TwoPass { pass, stats, .. } => {
                        params.push(format!("pass={pass}"));
                        params.push(format!(
                            "stats={}",
                            escape_x265_value(&stats.to_string_lossy())
                        ));
                    }
                }
                if *quiet {
                    params.push("log-level=error".to_string());
                }
                args.push("-x265-params".to_string());
                args.push(params.join(":"));
                if let RateControl::TwoPass { bitrate_kbps, .. } = rate {
                    args.push("-b:v".to_string());
                    args.push(format!("{bitrate_kbps}k"));
                }
            }
            VideoCodecArgs::Vp9 { rate } => {
                args.push("-c:v".to_string());
                args.push("libvpx-vp9".to_string());
                match rate {
                    RateControl::Crf(crf) => {
                        args.push("-crf".to_string());
                        args.push(crf.to_string());
                        args.push("-b:v".to_string());
                        args.push("0".to_string());
                    }
                    RateControl::TwoPass {
                        pass,
                        bitrate_kbps,
                        stats,
                    } => {
                        args.push("-b:v".to_string());
                        args.push(format!("{bitrate_kbps}k"));
                        args.push("-pass".to_string());
                        args.push(pass.to_string());
                        args.push("-passlogfile".to_string());
                        args.push(stats.to_string_lossy().to_string());
                    }
                }
            }
        }
        args
    }
}

impl AudioArgs {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            AudioArgs::Copy => vec!["-c:a".to_string(), "copy".to_string()],
            AudioArgs::Encode {
                codec,
                bitrate_kbps,
            } => vec![
                "-c:a".to_string(),
                codec.encoder().to_string(),
                "-b:a".to_string(),
                format!("{bitrate_kbps}k"),
            ],
            AudioArgs::Drop => vec!["-an".to_string()],
        }
    }
}

impl OutputTarget {
    pub fn to_args(&self) -> Vec<String> {
        match self {
            OutputTarget::File(path) => vec![path.to_string_lossy().to_string()],
            OutputTarget::NullSink => vec![
                "-f".to_string(),
                "null".to_string(),
                NULL_SINK.to_string(),
            ],
        }
    }
}

/// One ffmpeg invocation, kept as typed groups until it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodePass {
    pub global: Vec<String>,
    pub input: PathBuf,
    pub video: VideoCodecArgs,
    pub video_filters: FilterGraph,
    pub audio: AudioArgs,
    pub audio_filters: FilterGraph,
    pub output: OutputTarget,
}

impl EncodePass {
    pub fn label(&self) -> String {
        match self.video.pass_number() {
            Some(pass) => format!("pass {pass}"),
            None => "single pass".to_string(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.global.clone();

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.video.to_args());
        args.extend(self.video_filters.to_args("-filter:v"));
        args.extend(self.audio.to_args());
        args.extend(self.audio_filters.to_args("-af"));
        args.extend(self.output.to_args());

        args
    }
}

/// Escapes the separators x265-params splits on.
fn escape_x265_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == ':' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

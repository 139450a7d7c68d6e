use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::core::error::ReencodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn selector(self) -> &'static str {
        match self {
            StreamKind::Video => "v:0",
            StreamKind::Audio => "a:0",
        }
    }
}

/// Reports the codec of the first stream of a kind, `None` if the file has no such stream.
pub trait Probe {
    fn codec(&self, path: &Path, kind: StreamKind) -> Result<Option<String>, ReencodeError>;
}

pub struct FfprobeProbe {
    ffprobe_path: PathBuf,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    fn args(path: &Path, kind: StreamKind) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            kind.selector().to_string(),
            "-show_entries".to_string(),
            "stream=codec_name".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }
}

impl Probe for FfprobeProbe {
    fn codec(&self, path: &Path, kind: StreamKind) -> Result<Option<String>, ReencodeError> {
        let output = Command::new(&self.ffprobe_path)
            .args(Self::args(path, kind))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ReencodeError::BinaryNotFound {
                        binary: self.ffprobe_path.clone(),
                    }
                } else {
                    ReencodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ReencodeError::ProbeFailed {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let codec = parse_codec_token(&String::from_utf8_lossy(&output.stdout));
        debug!(path = %path.display(), stream = kind.selector(), codec = ?codec, "probed");
        Ok(codec)
    }
}

fn parse_codec_token(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Codec facts about one source file, fetched on first use and kept for that file only.
pub struct ProbeResult<'a> {
    probe: &'a dyn Probe,
    path: &'a Path,
    video: OnceCell<Option<String>>,
    audio: OnceCell<Option<String>>,
}

impl<'a> ProbeResult<'a> {
    pub fn new(probe: &'a dyn Probe, path: &'a Path) -> Self {
        Self {
            probe,
            path,
            video: OnceCell::new(),
            audio: OnceCell::new(),
        }
    }

    pub fn video_codec(&self) -> Result<Option<&str>, ReencodeError> {
        self.video
            .get_or_try_init(|| self.probe.codec(self.path, StreamKind::Video))
            .map(|codec| codec.as_deref())
    }

    pub fn audio_codec(&self) -> Result<Option<&str>, ReencodeError> {
        self.audio
            .get_or_try_init(|| self.probe.codec(self.path, StreamKind::Audio))
            .map(|codec| codec.as_deref())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Answers from fixed codec names and records every query.
    pub struct FakeProbe {
        pub video: Option<&'static str>,
        pub audio: Option<&'static str>,
        pub calls: RefCell<Vec<StreamKind>>,
    }

    impl FakeProbe {
        pub fn new(video: Option<&'static str>, audio: Option<&'static str>) -> Self {
            Self {
                video,
                audio,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Probe for FakeProbe {
        fn codec(&self, _path: &Path, kind: StreamKind) -> Result<Option<String>, ReencodeError> {
            self.calls.borrow_mut().push(kind);
            let codec = match kind {
                StreamKind::Video => self.video,
                StreamKind::Audio => self.audio,
            };
            Ok(codec.map(str::to_string))
        }
    }

    #[test]
    fn probes_each_stream_at_most_once() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let result = ProbeResult::new(&probe, Path::new("lecture.mp4"));

        assert_eq!(result.video_codec().unwrap(), Some("h264"));
        assert_eq!(result.video_codec().unwrap(), Some("h264"));
        assert_eq!(result.audio_codec().unwrap(), Some("aac"));
        assert_eq!(
            *probe.calls.borrow(),
            vec![StreamKind::Video, StreamKind::Audio]
        );
    }

    #[test]
    fn missing_stream_is_none() {
        let probe = FakeProbe::new(Some("vp9"), None);
        let result = ProbeResult::new(&probe, Path::new("slides.webm"));
        assert_eq!(result.audio_codec().unwrap(), None);
    }

    #[test]
    fn codec_token_is_first_non_empty_line() {
        assert_eq!(parse_codec_token("hevc\n"), Some("hevc".to_string()));
        assert_eq!(parse_codec_token("\n  opus \n"), Some("opus".to_string()));
        assert_eq!(parse_codec_token(""), None);
    }

    #[test]
    fn ffprobe_arguments_select_stream() {
        let args = FfprobeProbe::args(Path::new("talk.mp4"), StreamKind::Audio);
        assert_eq!(args[2..4], ["-select_streams", "a:0"]);
        assert_eq!(args.last().map(String::as_str), Some("talk.mp4"));
    }
}

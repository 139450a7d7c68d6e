//! Plan Builder: maps options and source codecs onto concrete encoder passes.
//!
//! Decision order for one file:
//!
//! 1. resolve the output container (override or source extension),
//! 2. skip files whose video is already in the container's target codec,
//! 3. pick the video encoder and rate control (CRF, or two passes at a bitrate),
//! 4. pick the audio handling (explicit re-encode, forced for webm, else copy),
//! 5. assemble filters and output targets.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::command::{
    AudioArgs, EncodePass, FilterGraph, OutputTarget, RateControl, VideoCodecArgs,
};
use crate::core::container::{resolve_extension, source_extension, AudioCodec, Container};
use crate::core::error::ReencodeError;
use crate::core::options::Options;
use crate::core::probe::{Probe, ProbeResult};

pub const DECIMATE_FILTER: &str = "mpdecimate";
pub const CAP_FRAMERATE_FILTER: &str = "fps=fps=5";
pub const MERGE_STEREO_FILTER: &str = "pan=stereo|c0<c0+c1|c1<c0+c1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalAction {
    /// Leave the sidecar next to the source.
    Keep,
    /// Rename the sidecar onto `target`, dropping the distinguisher.
    Overwrite { target: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingPlan {
    pub source: PathBuf,
    pub output: PathBuf,
    pub container: Container,
    pub passes: Vec<EncodePass>,
    pub final_action: FinalAction,
    /// Two-pass statistics files to remove once the last pass returns.
    pub artifacts: Vec<PathBuf>,
    /// Set when the plan is empty because the video already has the target codec.
    pub already_encoded: Option<String>,
}

impl EncodingPlan {
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn is_two_pass(&self) -> bool {
        self.passes.len() == 2
    }
}

pub fn build_plan(options: &Options, probe: &dyn Probe) -> Result<EncodingPlan, ReencodeError> {
    let source = options.source.as_path();
    let requested = resolve_extension(source, options.container.as_deref());
    let container = Container::from_extension(&requested)?;

    // Keep the source's own spelling (`.MP4`) when the container is unchanged.
    let source_ext = source_extension(source);
    let same_container = Container::from_extension(&source_ext).ok() == Some(container);
    let ext = if same_container { source_ext } else { requested };

    let output = sidecar_path(source, &options.distinguisher, &ext);
    if output == source {
        return Err(ReencodeError::SidecarCollision { path: output });
    }

    let final_action = if options.overwrite {
        FinalAction::Overwrite {
            target: sidecar_path(source, "", &ext),
        }
    } else {
        FinalAction::Keep
    };

    let facts = ProbeResult::new(probe, source);

    if same_container {
        if let Some(codec) = facts.video_codec()? {
            if codec == container.target_video_codec() {
                info!(source = %source.display(), codec, "already encoded, skipping");
                return Ok(EncodingPlan {
                    source: source.to_path_buf(),
                    output,
                    container,
                    passes: Vec::new(),
                    final_action,
                    artifacts: Vec::new(),
                    already_encoded: Some(codec.to_string()),
                });
            }
        }
    }

    let video_filters = video_filters(options);
    let audio_filters = audio_filters(options);
    let audio = select_audio(options, container, &facts, !audio_filters.is_empty())?;
    debug!(?container, ?audio, "resolved codecs");

    let quiet = options.verbosity.is_quiet();
    // Every pass replaces a stale output instead of prompting.
    let mut global = vec!["-hide_banner".to_string(), "-y".to_string()];
    if quiet {
        global.extend(["-loglevel", "warning", "-nostats"].map(str::to_string));
    }

    let (passes, artifacts) = if options.two_pass {
        let stats = passlog_prefix(source, &options.distinguisher);
        let video = |pass| {
            video_args(
                container,
                RateControl::TwoPass {
                    pass,
                    bitrate_kbps: options.video_bitrate,
                    stats: stats.clone(),
                },
                quiet,
            )
        };

        let calibration = EncodePass {
            global: global.clone(),
            input: source.to_path_buf(),
            video: video(1),
            video_filters: video_filters.clone(),
            audio: AudioArgs::Drop,
            audio_filters: FilterGraph::default(),
            output: OutputTarget::NullSink,
        };
        let encode = EncodePass {
            global,
            input: source.to_path_buf(),
            video: video(2),
            video_filters,
            audio,
            audio_filters,
            output: OutputTarget::File(output.clone()),
        };
        (
            vec![calibration, encode],
            passlog_artifacts(container, &stats),
        )
    } else {
        let encode = EncodePass {
            global,
            input: source.to_path_buf(),
            video: video_args(container, RateControl::Crf(options.video_crf), quiet),
            video_filters,
            audio,
            audio_filters,
            output: OutputTarget::File(output.clone()),
        };
        (vec![encode], Vec::new())
    };

    Ok(EncodingPlan {
        source: source.to_path_buf(),
        output,
        container,
        passes,
        final_action,
        artifacts,
        already_encoded: None,
    })
}

/// `<dir>/<stem><distinguisher><ext>` next to the source.
pub fn sidecar_path(source: &Path, distinguisher: &str, ext: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{distinguisher}{ext}"))
}

fn passlog_prefix(source: &Path, distinguisher: &str) -> PathBuf {
    sidecar_path(source, distinguisher, ".passlog")
}

fn passlog_artifacts(container: Container, prefix: &Path) -> Vec<PathBuf> {
    let mut artifact = prefix.as_os_str().to_os_string();
    match container {
        Container::Mp4 => {
            artifact.push(".cutree");
            vec![prefix.to_path_buf(), PathBuf::from(artifact)]
        }
        Container::Webm => {
            artifact.push("-0.log");
            vec![PathBuf::from(artifact)]
        }
    }
}

fn video_args(container: Container, rate: RateControl, quiet: bool) -> VideoCodecArgs {
    match container {
        Container::Mp4 => VideoCodecArgs::Hevc { rate, quiet },
        Container::Webm => VideoCodecArgs::Vp9 { rate },
    }
}

fn select_audio(
    options: &Options,
    container: Container,
    facts: &ProbeResult<'_>,
    filtered: bool,
) -> Result<AudioArgs, ReencodeError> {
    let native = container.native_audio_codec();
    let encode = |codec: AudioCodec| AudioArgs::Encode {
        codec,
        bitrate_kbps: options.audio_bitrate,
    };

    if options.reencode_audio {
        return native
            .map(encode)
            .ok_or_else(|| ReencodeError::IncompatibleAudioPolicy {
                container: container.to_string(),
            });
    }

    if let (Container::Webm, Some(codec)) = (container, native) {
        if facts.audio_codec()? != Some(codec.probe_name()) {
            return Ok(encode(codec));
        }
    }

    // ffmpeg refuses to filter a stream it only copies.
    if filtered {
        if let Some(codec) = native {
            return Ok(encode(codec));
        }
    }

    Ok(AudioArgs::Copy)
}

fn video_filters(options: &Options) -> FilterGraph {
    let mut graph = FilterGraph::default();
    if options.decimate {
        graph.push(DECIMATE_FILTER);
        graph.companions.extend(["-vsync", "vfr"].map(str::to_string));
    }
    if options.cap_framerate {
        graph.push(CAP_FRAMERATE_FILTER);
    }
    graph
}

fn audio_filters(options: &Options) -> FilterGraph {
    let mut graph = FilterGraph::default();
    if options.merge_stereo {
        graph.push(MERGE_STEREO_FILTER);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::NULL_SINK;
    use crate::core::options::Verbosity;
    use crate::core::probe::tests::FakeProbe;
    use crate::core::probe::StreamKind;

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|pair| pair[0] == flag && pair[1] == value)
    }

    #[test]
    fn plain_mp4_is_single_pass_crf_with_audio_copy() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let plan = build_plan(&Options::new("lecture.mp4"), &probe).unwrap();

        assert_eq!(plan.passes.len(), 1);
        assert_eq!(plan.output, PathBuf::from("lecture.2.mp4"));
        assert_eq!(plan.final_action, FinalAction::Keep);

        let args = plan.passes[0].to_args();
        assert!(has_pair(&args, "-c:v", "libx265"));
        assert!(has_pair(&args, "-x265-params", "crf=23"));
        assert!(has_pair(&args, "-c:a", "copy"));
        assert!(args.iter().any(|arg| arg == "-y"));
        assert_eq!(args.last().map(String::as_str), Some("lecture.2.mp4"));
        assert!(!args.iter().any(|arg| arg == "-filter:v" || arg == "-af"));
        assert_eq!(*probe.calls.borrow(), vec![StreamKind::Video]);
    }

    #[test]
    fn webm_two_pass_from_mkv() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("lecture.mkv");
        options.container = Some("webm".to_string());
        options.two_pass = true;
        options.video_bitrate = 200;

        let plan = build_plan(&options, &probe).unwrap();
        assert!(plan.is_two_pass());
        assert_eq!(plan.container, Container::Webm);

        let first = plan.passes[0].to_args();
        assert!(has_pair(&first, "-c:v", "libvpx-vp9"));
        assert!(has_pair(&first, "-b:v", "200k"));
        assert!(has_pair(&first, "-pass", "1"));
        assert!(has_pair(&first, "-f", "null"));
        assert_eq!(first.last().map(String::as_str), Some(NULL_SINK));
        assert!(first.iter().any(|arg| arg == "-an"));
        assert!(!first.iter().any(|arg| arg == "-c:a"));

        let second = plan.passes[1].to_args();
        assert!(has_pair(&second, "-pass", "2"));
        assert!(has_pair(&second, "-b:v", "200k"));
        assert!(has_pair(&second, "-c:a", "libopus"));
        assert_eq!(second.last().map(String::as_str), Some("lecture.2.webm"));

        assert_eq!(
            plan.artifacts,
            vec![PathBuf::from("lecture.2.passlog-0.log")]
        );
        // Extension changed, so the video codec never mattered.
        assert_eq!(*probe.calls.borrow(), vec![StreamKind::Audio]);
    }

    #[test]
    fn already_hevc_mp4_is_skipped_regardless_of_flags() {
        let probe = FakeProbe::new(Some("hevc"), Some("aac"));
        let mut options = Options::new("talk.mp4");
        options.two_pass = true;
        options.overwrite = true;
        options.decimate = true;
        options.reencode_audio = true;

        let plan = build_plan(&options, &probe).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.already_encoded.as_deref(), Some("hevc"));
    }

    #[test]
    fn same_codec_under_new_container_is_not_skipped() {
        let probe = FakeProbe::new(Some("vp9"), Some("opus"));
        let mut options = Options::new("talk.webm");
        options.container = Some("mp4".to_string());

        let plan = build_plan(&options, &probe).unwrap();
        assert_eq!(plan.passes.len(), 1);
    }

    #[test]
    fn container_override_differing_only_in_case_still_skips() {
        let probe = FakeProbe::new(Some("hevc"), Some("aac"));
        let mut options = Options::new("Talk.MP4");
        options.container = Some("mp4".to_string());
        options.overwrite = true;

        let plan = build_plan(&options, &probe).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.already_encoded.as_deref(), Some("hevc"));
    }

    #[test]
    fn uppercase_source_keeps_its_extension_spelling() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("Talk.MP4");
        options.container = Some(".mp4".to_string());
        options.overwrite = true;

        let plan = build_plan(&options, &probe).unwrap();
        assert_eq!(plan.output, PathBuf::from("Talk.2.MP4"));
        assert_eq!(
            plan.final_action,
            FinalAction::Overwrite {
                target: PathBuf::from("Talk.MP4")
            }
        );

        options.distinguisher = String::new();
        let err = build_plan(&options, &probe).unwrap_err();
        assert!(matches!(err, ReencodeError::SidecarCollision { .. }));
    }

    #[test]
    fn decimate_and_cap_with_overwrite() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("talk.mp4");
        options.overwrite = true;
        options.decimate = true;
        options.cap_framerate = true;

        let plan = build_plan(&options, &probe).unwrap();
        let args = plan.passes[0].to_args();
        assert!(has_pair(&args, "-filter:v", "mpdecimate,fps=fps=5"));
        assert!(has_pair(&args, "-vsync", "vfr"));
        assert_eq!(
            plan.final_action,
            FinalAction::Overwrite {
                target: PathBuf::from("talk.mp4")
            }
        );
    }

    #[test]
    fn cap_framerate_alone_has_no_vfr_flag() {
        let probe = FakeProbe::new(Some("h264"), None);
        let mut options = Options::new("talk.mp4");
        options.cap_framerate = true;

        let args = build_plan(&options, &probe).unwrap().passes[0].to_args();
        assert!(has_pair(&args, "-filter:v", "fps=fps=5"));
        assert!(!args.iter().any(|arg| arg == "-vsync"));
    }

    #[test]
    fn unsupported_container_fails_before_probing() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        for (source, container) in [("lecture.mkv", None), ("lecture.mp4", Some("avi"))] {
            let mut options = Options::new(source);
            options.container = container.map(str::to_string);
            let err = build_plan(&options, &probe).unwrap_err();
            assert!(matches!(err, ReencodeError::UnsupportedContainer { .. }));
        }
        assert!(probe.calls.borrow().is_empty());
    }

    #[test]
    fn webm_with_non_opus_audio_is_forced_to_opus() {
        let probe = FakeProbe::new(Some("h264"), Some("vorbis"));
        let plan = build_plan(&Options::new("lecture.webm"), &probe).unwrap();
        assert_eq!(
            plan.passes[0].audio,
            AudioArgs::Encode {
                codec: AudioCodec::Opus,
                bitrate_kbps: 32
            }
        );
    }

    #[test]
    fn webm_with_opus_audio_is_copied() {
        let probe = FakeProbe::new(Some("vp8"), Some("opus"));
        let plan = build_plan(&Options::new("lecture.webm"), &probe).unwrap();
        assert_eq!(plan.passes[0].audio, AudioArgs::Copy);
        let args = plan.passes[0].to_args();
        assert!(has_pair(&args, "-crf", "23"));
        assert!(has_pair(&args, "-b:v", "0"));
    }

    #[test]
    fn explicit_reencode_skips_audio_probe() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("lecture.mp4");
        options.reencode_audio = true;
        options.audio_bitrate = 48;

        let plan = build_plan(&options, &probe).unwrap();
        let args = plan.passes[0].to_args();
        assert!(has_pair(&args, "-c:a", "libopus"));
        assert!(has_pair(&args, "-b:a", "48k"));
        assert_eq!(*probe.calls.borrow(), vec![StreamKind::Video]);
    }

    #[test]
    fn merge_stereo_encodes_audio() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("lecture.mp4");
        options.merge_stereo = true;

        let args = build_plan(&options, &probe).unwrap().passes[0].to_args();
        assert!(has_pair(&args, "-af", MERGE_STEREO_FILTER));
        assert!(has_pair(&args, "-c:a", "libopus"));
    }

    #[test]
    fn hevc_two_pass_shares_filters_and_lists_stats_files() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("rec/lecture.mp4");
        options.two_pass = true;
        options.decimate = true;
        options.merge_stereo = true;
        options.verbosity = Verbosity::Quiet;

        let plan = build_plan(&options, &probe).unwrap();
        assert_eq!(plan.passes[0].video_filters, plan.passes[1].video_filters);

        let first = plan.passes[0].to_args();
        assert!(first.iter().any(|arg| arg == "-y"));
        assert!(has_pair(&first, "-loglevel", "warning"));
        assert!(has_pair(
            &first,
            "-x265-params",
            "pass=1:stats=rec/lecture.2.passlog:log-level=error"
        ));
        assert!(!first.iter().any(|arg| arg == "-af"));

        let second = plan.passes[1].to_args();
        assert!(second.iter().any(|arg| arg == "-y"));
        assert!(has_pair(&second, "-b:v", "128k"));
        assert!(has_pair(&second, "-af", MERGE_STEREO_FILTER));

        assert_eq!(
            plan.artifacts,
            vec![
                PathBuf::from("rec/lecture.2.passlog"),
                PathBuf::from("rec/lecture.2.passlog.cutree"),
            ]
        );
    }

    #[test]
    fn empty_distinguisher_on_same_container_collides() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("lecture.mp4");
        options.distinguisher = String::new();

        let err = build_plan(&options, &probe).unwrap_err();
        assert!(matches!(err, ReencodeError::SidecarCollision { .. }));
    }

    #[test]
    fn overwrite_into_new_container_targets_new_extension() {
        let probe = FakeProbe::new(Some("h264"), Some("aac"));
        let mut options = Options::new("lecture.mkv");
        options.container = Some(".mp4".to_string());
        options.overwrite = true;

        let plan = build_plan(&options, &probe).unwrap();
        assert_eq!(
            plan.final_action,
            FinalAction::Overwrite {
                target: PathBuf::from("lecture.mp4")
            }
        );
    }

    #[test]
    fn custom_distinguisher() {
        assert_eq!(
            sidecar_path(Path::new("/srv/week1/intro.mp4"), "-small", ".webm"),
            PathBuf::from("/srv/week1/intro-small.webm")
        );
    }
}

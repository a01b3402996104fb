//! Compiler from a finalized timeline to an ordered export pipeline.
//!
//! The plan is a typed stage list, not a command string; rendering it
//! to FFmpeg arguments is a separate, deterministic step. Compiling
//! the same timeline twice yields identical plans and identical
//! argument vectors.

use cutline_core::{CutlineError, Result};
use cutline_timeline::{MediaRegistry, Timeline, TrackKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::settings::ExportSettings;

/// One stage of the compiled pipeline, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    /// Cut `[trim_start, trim_end]` out of input `input` and reset its
    /// timestamp base to zero so concatenation sees it start at t=0.
    TrimVideo {
        input: usize,
        trim_start: f64,
        trim_end: f64,
    },
    /// Apply the clip gain, then trim and timestamp-reset the audio
    /// identically to the video.
    PrepareAudio {
        input: usize,
        volume: f64,
        trim_start: f64,
        trim_end: f64,
    },
    /// Join all video segments in plan order. Order is semantic:
    /// concatenation is not commutative.
    ConcatVideo { count: usize },
    /// Join all audio segments in the same order.
    ConcatAudio { count: usize },
    /// Resize the concatenated video to the output resolution.
    Scale { width: u32, height: u32 },
    /// Final encode parameters.
    Encode {
        video_encoder: String,
        crf: u32,
        video_bitrate_kbps: u32,
        audio_encoder: Option<String>,
    },
    /// The rendered command asks the encoder for machine-readable
    /// progress on its own (`-progress pipe:1`).
    ReportProgress,
}

/// An ordered, self-contained description of one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlan {
    /// Input file per clip, ascending by clip start.
    pub inputs: Vec<String>,
    /// Clip ids in the same order, for host bookkeeping.
    pub clip_order: Vec<Uuid>,
    pub stages: Vec<Stage>,
    pub settings: ExportSettings,
    /// Duration of the concatenated output in seconds.
    pub total_duration: f64,
    /// Frame count of the output at the settings frame rate.
    pub total_frames: i64,
}

/// Compile a read-only timeline snapshot into an export plan.
///
/// Clips are taken across all tracks in ascending-`start` order,
/// regardless of the order they were added. Video-track clips join the
/// video concat (and the audio concat when eligible); audio-track
/// clips contribute audio-only segments. Audio stages are emitted only
/// when audio is enabled and neither the clip nor its track is muted.
pub fn compile(
    timeline: &Timeline,
    registry: &dyn MediaRegistry,
    settings: &ExportSettings,
) -> Result<ExportPlan> {
    settings.validate()?;

    let clips = timeline.clips_sorted_by_start();
    if clips.is_empty() {
        return Err(CutlineError::Validation(
            "timeline has no clips to export".into(),
        ));
    }

    let mut inputs = Vec::new();
    let mut clip_order = Vec::new();
    let mut video_trims = Vec::new();
    let mut audio_preps = Vec::new();
    let mut total_duration = 0.0;

    for clip in &clips {
        let source = registry.resolve(clip.media_id).ok_or_else(|| {
            CutlineError::NotFound(format!("media source {} not registered", clip.media_id))
        })?;
        let track = timeline.track(clip.track_id).ok_or_else(|| {
            CutlineError::NotFound(format!("track {} not in timeline", clip.track_id))
        })?;
        let audio_eligible =
            settings.audio.enabled && source.has_audio && !clip.muted && !track.muted;

        match track.kind {
            TrackKind::Video => {
                if !source.has_video {
                    return Err(CutlineError::Validation(format!(
                        "source {} has no video stream; cannot join the video concat",
                        source.path
                    )));
                }
                let input = inputs.len();
                inputs.push(source.path.clone());
                clip_order.push(clip.id);
                total_duration += clip.trimmed_duration();
                video_trims.push(Stage::TrimVideo {
                    input,
                    trim_start: clip.trim_start,
                    trim_end: clip.trim_end,
                });
                if audio_eligible {
                    audio_preps.push(Stage::PrepareAudio {
                        input,
                        volume: clip.volume,
                        trim_start: clip.trim_start,
                        trim_end: clip.trim_end,
                    });
                }
            }
            TrackKind::Audio => {
                // Audio-only segment; skipped entirely when ineligible
                if audio_eligible {
                    let input = inputs.len();
                    inputs.push(source.path.clone());
                    clip_order.push(clip.id);
                    audio_preps.push(Stage::PrepareAudio {
                        input,
                        volume: clip.volume,
                        trim_start: clip.trim_start,
                        trim_end: clip.trim_end,
                    });
                }
            }
        }
    }

    if video_trims.is_empty() {
        return Err(CutlineError::Validation(
            "timeline has no video clips to export".into(),
        ));
    }

    let mut stages = Vec::new();
    let video_count = video_trims.len();
    let audio_count = audio_preps.len();
    stages.extend(video_trims);
    stages.extend(audio_preps);
    stages.push(Stage::ConcatVideo { count: video_count });
    if audio_count > 0 {
        stages.push(Stage::ConcatAudio { count: audio_count });
    }
    stages.push(Stage::Scale {
        width: settings.width,
        height: settings.height,
    });
    stages.push(Stage::Encode {
        video_encoder: settings.container.video_encoder().to_string(),
        crf: settings.quality.crf(),
        video_bitrate_kbps: settings.video_bitrate_kbps,
        audio_encoder: (audio_count > 0)
            .then(|| settings.container.audio_encoder().to_string()),
    });
    stages.push(Stage::ReportProgress);

    let total_frames = settings.frame_rate.frames_for_secs(total_duration);
    debug!(
        clips = clips.len(),
        total_duration, total_frames, "Export plan compiled"
    );

    Ok(ExportPlan {
        inputs,
        clip_order,
        stages,
        settings: settings.clone(),
        total_duration,
        total_frames,
    })
}

impl ExportPlan {
    /// Full output path from the settings.
    pub fn output_path(&self) -> PathBuf {
        self.settings.output_path()
    }

    /// Whether the plan carries any audio segments.
    pub fn has_audio(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s, Stage::ConcatAudio { .. }))
    }

    /// Render the plan to an FFmpeg argument vector.
    ///
    /// Segment filters feed labeled streams into order-preserving
    /// concats, the video side is scaled, and the encode flags carry
    /// the CRF/bitrate/audio parameters. Deterministic for a given
    /// plan.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into()];
        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.clone());
        }

        let mut filter = String::new();
        let mut video_labels = Vec::new();
        let mut audio_labels = Vec::new();

        for stage in &self.stages {
            match stage {
                Stage::TrimVideo {
                    input,
                    trim_start,
                    trim_end,
                } => {
                    let label = format!("v{input}");
                    filter.push_str(&format!(
                        "[{input}:v]trim=start={trim_start}:end={trim_end},setpts=PTS-STARTPTS[{label}];"
                    ));
                    video_labels.push(label);
                }
                Stage::PrepareAudio {
                    input,
                    volume,
                    trim_start,
                    trim_end,
                } => {
                    let label = format!("a{input}");
                    filter.push_str(&format!(
                        "[{input}:a]volume={volume},atrim=start={trim_start}:end={trim_end},asetpts=PTS-STARTPTS[{label}];"
                    ));
                    audio_labels.push(label);
                }
                Stage::ConcatVideo { count } => {
                    if *count == 1 {
                        filter.push_str(&format!("[{}]null[vcat];", video_labels[0]));
                    } else {
                        for label in &video_labels {
                            filter.push_str(&format!("[{label}]"));
                        }
                        filter.push_str(&format!("concat=n={count}:v=1:a=0[vcat];"));
                    }
                }
                Stage::ConcatAudio { count } => {
                    if *count == 1 {
                        filter.push_str(&format!("[{}]anull[acat];", audio_labels[0]));
                    } else {
                        for label in &audio_labels {
                            filter.push_str(&format!("[{label}]"));
                        }
                        filter.push_str(&format!("concat=n={count}:v=0:a=1[acat];"));
                    }
                }
                Stage::Scale { width, height } => {
                    filter.push_str(&format!("[vcat]scale={width}:{height}[vout]"));
                }
                Stage::Encode { .. } | Stage::ReportProgress => {}
            }
        }

        args.push("-filter_complex".into());
        args.push(filter);
        args.push("-map".into());
        args.push("[vout]".into());
        if self.has_audio() {
            args.push("-map".into());
            args.push("[acat]".into());
        }

        for stage in &self.stages {
            match stage {
                Stage::Encode {
                    video_encoder,
                    crf,
                    video_bitrate_kbps,
                    audio_encoder,
                } => {
                    args.push("-c:v".into());
                    args.push(video_encoder.clone());
                    args.push("-crf".into());
                    args.push(crf.to_string());
                    args.push("-b:v".into());
                    args.push(format!("{video_bitrate_kbps}k"));
                    args.push("-r".into());
                    args.push(self.settings.frame_rate.as_ffmpeg_arg());
                    args.push("-pix_fmt".into());
                    args.push("yuv420p".into());
                    if let Some(audio_encoder) = audio_encoder {
                        args.push("-c:a".into());
                        args.push(audio_encoder.clone());
                        args.push("-b:a".into());
                        args.push(format!("{}k", self.settings.audio.bitrate_kbps));
                        args.push("-ar".into());
                        args.push(self.settings.audio.sample_rate.to_string());
                        args.push("-ac".into());
                        args.push(self.settings.audio.channels.to_string());
                    }
                }
                Stage::ReportProgress => {
                    args.push("-progress".into());
                    args.push("pipe:1".into());
                }
                _ => {}
            }
        }

        args.push(self.output_path().to_string_lossy().into_owned());
        args
    }
}

//! Bidirectional mapping between global timeline time and
//! (active clip, source-relative time).

use cutline_timeline::{Clip, Timeline};
use uuid::Uuid;

/// Maximum clamping applied silently when mapping into a clip's trimmed
/// range; anything larger is reported as a gap instead of showing stale
/// content.
pub const CLAMP_EPSILON: f64 = 0.1;

/// The clip under the playhead and the source-relative time within it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveClip {
    pub clip_id: Uuid,
    /// Source-relative time, clamped into `[trim_start, trim_end]`.
    pub source_time: f64,
}

/// Resolve which clip is active at global time `t`.
///
/// Candidates come from every track, ascending by `start`; the winner
/// is the clip with the highest `start` not exceeding `t` whose
/// placement still covers `t` (end-inclusive). Times that would need
/// more than [`CLAMP_EPSILON`] of clamping into the trimmed source
/// range count as gaps.
pub fn find_active_clip(timeline: &Timeline, t: f64) -> Option<ActiveClip> {
    let clips = timeline.clips_sorted_by_start();
    let clip = *clips.iter().rfind(|c| c.start <= t)?;

    if t > clip.end() {
        // Gap after this clip, before the next
        return None;
    }

    let raw = clip.source_time_at(t);
    let source_time = raw.clamp(clip.trim_start, clip.trim_end);
    if (raw - source_time).abs() > CLAMP_EPSILON {
        return None;
    }
    Some(ActiveClip {
        clip_id: clip.id,
        source_time,
    })
}

/// The first clip starting strictly after `start`, in ascending-start
/// order. Used when playback reaches a clip boundary: inter-clip gaps
/// are skipped at the transition.
pub fn next_clip_after(timeline: &Timeline, start: f64) -> Option<&Clip> {
    timeline
        .clips_sorted_by_start()
        .into_iter()
        .find(|c| c.start > start)
}

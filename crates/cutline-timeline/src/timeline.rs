//! The timeline container: tracks, the clip store, and every mutation
//! that must re-establish the model invariants.

use std::collections::HashMap;

use cutline_core::{CutlineError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::clip::{Clip, ClipPatch};
use crate::media::MediaRegistry;
use crate::track::Track;

/// Minimum displayed duration for an empty or near-empty timeline.
pub const MIN_DISPLAY_DURATION: f64 = 60.0;

/// Display durations round up to this interval.
pub const DISPLAY_INTERVAL: f64 = 10.0;

/// Edges closer than this are considered the same edge.
const EDGE_EPSILON: f64 = 1e-6;

/// How same-track overlap is treated on mutation.
///
/// `Strict` rejects any placement that overlaps an existing clip on the
/// same track; `Permissive` accepts it and leaves render order among
/// overlapping clips undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlapPolicy {
    #[default]
    Strict,
    Permissive,
}

/// Ordered tracks plus the clip store keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Tracks in display order
    pub tracks: Vec<Track>,
    /// All clips, keyed by id
    clips: HashMap<Uuid, Clip>,
    /// Same-track overlap policy
    pub overlap_policy: OverlapPolicy,
}

impl Timeline {
    /// Create an empty timeline with the strict overlap policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty timeline with an explicit overlap policy.
    pub fn with_overlap_policy(policy: OverlapPolicy) -> Self {
        Self {
            overlap_policy: policy,
            ..Self::default()
        }
    }

    // ── Tracks ──────────────────────────────────────────────────

    /// Add a track, returning its id.
    pub fn add_track(&mut self, track: Track) -> Uuid {
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Find a track by id.
    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: Uuid) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == id)
    }

    // ── Clips ───────────────────────────────────────────────────

    /// Find a clip by id.
    pub fn clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.get(&id)
    }

    /// Number of clips across all tracks.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// All clips across all tracks, ascending by timeline start.
    /// Ties break on clip id so the order is stable regardless of the
    /// clip store's internal iteration order.
    pub fn clips_sorted_by_start(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.values().collect();
        clips.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        clips
    }

    /// Clips on one track, ascending by timeline start.
    pub fn clips_on_track(&self, track_id: Uuid) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self
            .clips
            .values()
            .filter(|c| c.track_id == track_id)
            .collect();
        clips.sort_by(|a, b| {
            a.start
                .partial_cmp(&b.start)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        clips
    }

    /// Validate and insert a clip. The referenced media source must
    /// resolve, every clip invariant must hold, and under the strict
    /// policy the placement must not overlap a same-track clip.
    pub fn add_clip(&mut self, clip: Clip, registry: &dyn MediaRegistry) -> Result<Uuid> {
        let source = registry.resolve(clip.media_id).ok_or_else(|| {
            CutlineError::NotFound(format!("media source {} not registered", clip.media_id))
        })?;
        clip.validate(source)?;

        if self.track(clip.track_id).is_none() {
            return Err(CutlineError::NotFound(format!(
                "track {} does not exist",
                clip.track_id
            )));
        }
        self.check_overlap(&clip, None)?;

        let id = clip.id;
        debug!(clip = %id, track = %clip.track_id, start = clip.start, "Clip added");
        self.track_mut(clip.track_id)
            .expect("track presence checked above")
            .attach(id);
        self.clips.insert(id, clip);
        Ok(id)
    }

    /// Merge a patch into a clip and re-validate.
    ///
    /// Clamping follows the model rules: `start` to >= 0, `trim_start`
    /// to >= 0, `trim_end` to the source duration, `volume` to [0, 1].
    /// A patch that is still invalid after clamping (inverted trim
    /// range, nonpositive duration, strict-policy overlap) is rejected
    /// whole; the stored clip is untouched.
    pub fn update_clip(
        &mut self,
        id: Uuid,
        patch: &ClipPatch,
        registry: &dyn MediaRegistry,
    ) -> Result<()> {
        let current = self
            .clips
            .get(&id)
            .ok_or_else(|| CutlineError::NotFound(format!("clip {id} does not exist")))?;
        let source = registry.resolve(current.media_id).ok_or_else(|| {
            CutlineError::NotFound(format!("media source {} not registered", current.media_id))
        })?;

        let mut candidate = current.clone();
        if let Some(start) = patch.start {
            candidate.start = start.max(0.0);
        }
        if let Some(duration) = patch.duration {
            candidate.duration = duration;
        }
        if let Some(trim_start) = patch.trim_start {
            candidate.trim_start = trim_start.max(0.0);
        }
        if let Some(trim_end) = patch.trim_end {
            candidate.trim_end = trim_end.min(source.duration);
        }
        if let Some(volume) = patch.volume {
            candidate.volume = volume.clamp(0.0, 1.0);
        }
        if let Some(muted) = patch.muted {
            candidate.muted = muted;
        }

        candidate.validate(source)?;
        if patch.moves_placement() {
            self.check_overlap(&candidate, Some(id))?;
        }

        debug!(clip = %id, "Clip updated");
        self.clips.insert(id, candidate);
        Ok(())
    }

    /// Remove a clip from the store and its track.
    pub fn remove_clip(&mut self, id: Uuid) -> Result<Clip> {
        let clip = self
            .clips
            .remove(&id)
            .ok_or_else(|| CutlineError::NotFound(format!("clip {id} does not exist")))?;
        if let Some(track) = self.track_mut(clip.track_id) {
            track.detach(id);
        }
        debug!(clip = %id, "Clip removed");
        Ok(clip)
    }

    /// Split a clip in two at a global time strictly inside its
    /// placement. Returns `(left, right)` ids; the halves tile the
    /// original placement and source range.
    pub fn split_clip(&mut self, id: Uuid, at: f64) -> Result<(Uuid, Uuid)> {
        let clip = self
            .clips
            .get(&id)
            .ok_or_else(|| CutlineError::NotFound(format!("clip {id} does not exist")))?;

        let offset = at - clip.start;
        if offset <= EDGE_EPSILON || offset >= clip.duration - EDGE_EPSILON {
            return Err(CutlineError::Validation(format!(
                "split point {at} is not inside clip ({} .. {})",
                clip.start,
                clip.end()
            )));
        }
        if offset >= clip.trimmed_duration() {
            return Err(CutlineError::Validation(format!(
                "split point {at} lies past the clip's trimmed content"
            )));
        }

        let mut right = clip.clone();
        right.id = Uuid::new_v4();
        right.start = at;
        right.duration = clip.duration - offset;
        right.trim_start = clip.trim_start + offset;

        let left = self.clips.get_mut(&id).expect("clip presence checked above");
        left.duration = offset;
        left.trim_end = left.trim_start + offset;

        let right_id = right.id;
        let track_id = right.track_id;
        self.clips.insert(right_id, right);
        if let Some(track) = self.track_mut(track_id) {
            track.attach(right_id);
        }
        debug!(clip = %id, right = %right_id, at, "Clip split");
        Ok((id, right_id))
    }

    // ── Derived queries ─────────────────────────────────────────

    /// Every clip edge (`start` and `start + duration`) across all
    /// tracks, strictly ascending, deduplicated. Snap engine input.
    pub fn clip_edges(&self) -> Vec<f64> {
        let mut edges = Vec::with_capacity(self.clips.len() * 2);
        for clip in self.clips.values() {
            edges.push(clip.start);
            edges.push(clip.end());
        }
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        edges.dedup_by(|a, b| (*a - *b).abs() < EDGE_EPSILON);
        edges
    }

    /// Timeline end of the last clip, unrounded. Zero when empty.
    pub fn content_duration(&self) -> f64 {
        self.clips
            .values()
            .map(Clip::end)
            .fold(0.0, f64::max)
    }

    /// Display duration: content end rounded up to the display
    /// interval, never below the minimum.
    pub fn total_duration(&self) -> f64 {
        let content = self.content_duration();
        let rounded = (content / DISPLAY_INTERVAL).ceil() * DISPLAY_INTERVAL;
        rounded.max(MIN_DISPLAY_DURATION)
    }

    fn check_overlap(&self, candidate: &Clip, exclude: Option<Uuid>) -> Result<()> {
        if self.overlap_policy == OverlapPolicy::Permissive {
            return Ok(());
        }
        let placement = candidate.placement();
        for other in self.clips.values() {
            if other.track_id != candidate.track_id || Some(other.id) == exclude {
                continue;
            }
            if let Some(overlap) = placement.intersection(other.placement()) {
                return Err(CutlineError::Validation(format!(
                    "clip overlaps {} on the same track ({}s-{}s)",
                    other.id,
                    overlap.start,
                    overlap.end()
                )));
            }
        }
        Ok(())
    }
}

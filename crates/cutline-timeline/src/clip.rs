//! Clip types for the timeline.

use cutline_core::{CutlineError, Result, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::media::MediaSource;

/// A placement of a trimmed sub-range of a media source onto a track.
///
/// `start`/`duration` describe the span the clip occupies on the
/// timeline; `trim_start`/`trim_end` describe the sub-range of the
/// source that is actually played. A clip references its source by id
/// and never owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Referenced media source
    pub media_id: Uuid,
    /// Owning track
    pub track_id: Uuid,
    /// Timeline position in seconds (>= 0)
    pub start: f64,
    /// Placement length on the timeline in seconds (> 0)
    pub duration: f64,
    /// Source in point in seconds
    pub trim_start: f64,
    /// Source out point in seconds
    pub trim_end: f64,
    /// Per-clip gain, 0.0..=1.0
    pub volume: f64,
    /// Mute flag
    pub muted: bool,
}

impl Clip {
    /// Create a clip covering the source's full range, placed at `start`.
    pub fn from_source(source: &MediaSource, track_id: Uuid, start: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_id: source.id,
            track_id,
            start,
            duration: source.duration,
            trim_start: 0.0,
            trim_end: source.duration,
            volume: 1.0,
            muted: false,
        }
    }

    /// Length of the source sub-range that is played.
    #[inline]
    pub fn trimmed_duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }

    /// The span this clip occupies on the timeline.
    #[inline]
    pub fn placement(&self) -> TimeRange {
        TimeRange::new(self.start, self.duration)
    }

    /// Timeline position of the clip's right edge.
    #[inline]
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Map a global timeline time to source-relative time. Unclamped;
    /// callers that need gap detection apply the clamp epsilon.
    #[inline]
    pub fn source_time_at(&self, global: f64) -> f64 {
        self.trim_start + (global - self.start)
    }

    /// Map a source-relative time back to global timeline time.
    #[inline]
    pub fn global_time_at(&self, source_time: f64) -> f64 {
        self.start + (source_time - self.trim_start)
    }

    /// Check every clip invariant against the referenced source.
    pub fn validate(&self, source: &MediaSource) -> Result<()> {
        if self.start < 0.0 {
            return Err(CutlineError::Validation(format!(
                "clip start must be >= 0, got {}",
                self.start
            )));
        }
        if self.duration <= 0.0 {
            return Err(CutlineError::Validation(format!(
                "clip duration must be > 0, got {}",
                self.duration
            )));
        }
        if self.trim_start < 0.0 {
            return Err(CutlineError::Validation(format!(
                "trim start must be >= 0, got {}",
                self.trim_start
            )));
        }
        if self.trim_start >= self.trim_end {
            return Err(CutlineError::Validation(format!(
                "trim start {} must be before trim end {}",
                self.trim_start, self.trim_end
            )));
        }
        if self.trim_end > source.duration {
            return Err(CutlineError::Validation(format!(
                "trim end {} exceeds source duration {}",
                self.trim_end, source.duration
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(CutlineError::Validation(format!(
                "volume must be in 0..=1, got {}",
                self.volume
            )));
        }
        Ok(())
    }
}

/// Partial update for [`Clip`]. Unset fields are left untouched.
///
/// Applied by `Timeline::update_clip`, which clamps where the model
/// allows it and rejects whole patches that cannot be made valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipPatch {
    pub start: Option<f64>,
    pub duration: Option<f64>,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub volume: Option<f64>,
    pub muted: Option<bool>,
}

impl ClipPatch {
    /// Patch that moves the clip to a new timeline position.
    pub fn move_to(start: f64) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    /// Patch that sets both trim points.
    pub fn trim(trim_start: f64, trim_end: f64) -> Self {
        Self {
            trim_start: Some(trim_start),
            trim_end: Some(trim_end),
            ..Default::default()
        }
    }

    /// Whether this patch changes the clip's placement on the timeline.
    pub fn moves_placement(&self) -> bool {
        self.start.is_some() || self.duration.is_some()
    }
}

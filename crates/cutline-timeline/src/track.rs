//! Track types for the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

/// A track holding an ordered set of clip ids.
///
/// Clip data lives in the timeline's clip store; the track only carries
/// membership and track-wide audio state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    /// Track name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    /// Ids of clips on this track (unique, no implied time order)
    pub clip_ids: Vec<Uuid>,
    /// Track gain, 0.0..=1.0
    pub volume: f64,
    /// Is track muted
    pub muted: bool,
    /// Is track soloed
    pub solo: bool,
}

impl Track {
    /// Create a new video track.
    pub fn new_video(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: TrackKind::Video,
            clip_ids: Vec::new(),
            volume: 1.0,
            muted: false,
            solo: false,
        }
    }

    /// Create a new audio track.
    pub fn new_audio(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: TrackKind::Audio,
            clip_ids: Vec::new(),
            volume: 1.0,
            muted: false,
            solo: false,
        }
    }

    /// Whether the given clip belongs to this track.
    pub fn contains(&self, clip_id: Uuid) -> bool {
        self.clip_ids.contains(&clip_id)
    }

    /// Number of clips on this track.
    pub fn clip_count(&self) -> usize {
        self.clip_ids.len()
    }

    pub(crate) fn attach(&mut self, clip_id: Uuid) {
        if !self.clip_ids.contains(&clip_id) {
            self.clip_ids.push(clip_id);
        }
    }

    pub(crate) fn detach(&mut self, clip_id: Uuid) {
        self.clip_ids.retain(|id| *id != clip_id);
    }
}

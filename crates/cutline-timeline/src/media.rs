//! Media source references and the registry lookup contract.
//!
//! Import, validation, and probing live outside the core; the timeline
//! only ever reads a source's duration, resolution, and stream flags.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for a registered media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSource {
    /// Unique source ID
    pub id: Uuid,
    /// Path to the media file
    pub path: String,
    /// Total duration in seconds
    pub duration: f64,
    /// Native width in pixels
    pub width: u32,
    /// Native height in pixels
    pub height: u32,
    /// Whether the file carries a video stream
    pub has_video: bool,
    /// Whether the file carries an audio stream
    pub has_audio: bool,
}

impl MediaSource {
    /// Create a new media source reference.
    pub fn new(path: impl Into<String>, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            duration,
            width: 1920,
            height: 1080,
            has_video: true,
            has_audio: true,
        }
    }

    /// Builder-style resolution override.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Builder-style stream flag override.
    pub fn with_streams(mut self, has_video: bool, has_audio: bool) -> Self {
        self.has_video = has_video;
        self.has_audio = has_audio;
        self
    }
}

/// Lookup contract the timeline validates clip references against.
///
/// The import subsystem owns the sources; the core never mutates one.
pub trait MediaRegistry {
    /// Resolve a source by id.
    fn resolve(&self, id: Uuid) -> Option<&MediaSource>;
}

/// Simple in-memory registry used by the CLI and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryRegistry {
    sources: std::collections::HashMap<Uuid, MediaSource>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, returning its id.
    pub fn insert(&mut self, source: MediaSource) -> Uuid {
        let id = source.id;
        self.sources.insert(id, source);
        id
    }

    /// Remove a source by id.
    pub fn remove(&mut self, id: Uuid) -> Option<MediaSource> {
        self.sources.remove(&id)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterate over all registered sources.
    pub fn iter(&self) -> impl Iterator<Item = &MediaSource> {
        self.sources.values()
    }
}

impl MediaRegistry for InMemoryRegistry {
    fn resolve(&self, id: Uuid) -> Option<&MediaSource> {
        self.sources.get(&id)
    }
}

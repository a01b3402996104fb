//! The playback surface abstraction.
//!
//! The real decoding/rendering element lives outside the core. The
//! controller drives it through this trait and receives its events from
//! the host loop, which makes the whole time-mapping path testable
//! without a decoder.

/// Commands the controller issues to the underlying playback element.
///
/// Failures are reported asynchronously through
/// [`SurfaceEvent::Error`], mirroring how a media element behaves.
pub trait PlaybackSurface {
    /// Bind a media file to the surface.
    fn load(&mut self, path: &str);
    /// Begin or resume playback.
    fn play(&mut self);
    /// Pause playback, keeping the current position.
    fn pause(&mut self);
    /// Seek to a source-relative time in seconds.
    fn seek(&mut self, time: f64);
    /// Current source-relative position in seconds.
    fn current_time(&self) -> f64;
}

/// Events the surface reports back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Metadata for the loaded file is available.
    LoadedMetadata,
    /// Periodic position report; the payload is source-relative time.
    /// These events, not a wall clock, are authoritative during
    /// playback.
    TimeUpdate(f64),
    /// The source reached its natural end.
    Ended,
    /// The surface failed (decode error, missing file, ...).
    Error(String),
}

//! Cutline Playback - Time mapping and playback control
//!
//! Maps the global playhead onto trimmed, time-shifted media sources
//! and drives an abstract playback surface through clip transitions,
//! gaps, and scrubbing:
//! - `mapper`: global time ⇄ (active clip, source-relative time)
//! - `surface`: the injected contract over the real decoder element
//! - `controller`: the Idle/Playing/Paused/Ended state machine

pub mod controller;
pub mod mapper;
pub mod surface;

pub use controller::{
    PlaybackController, PlaybackEvent, PlaybackMode, PlaybackState, SEEK_EPSILON,
};
pub use mapper::{find_active_clip, next_clip_after, ActiveClip, CLAMP_EPSILON};
pub use surface::{PlaybackSurface, SurfaceEvent};

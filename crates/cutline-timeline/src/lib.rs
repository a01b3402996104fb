//! Cutline Timeline - Timeline data model
//!
//! Implements the compositor's editing model:
//! - Media source references and the registry lookup contract
//! - Tracks containing clips (trimmed, time-shifted source windows)
//! - Mutations that re-validate every invariant (add, update, remove, split)
//! - The snap engine used to constrain edit positions

pub mod clip;
pub mod media;
pub mod snap;
pub mod timeline;
pub mod track;

pub use clip::{Clip, ClipPatch};
pub use media::{InMemoryRegistry, MediaRegistry, MediaSource};
pub use snap::{snap_position, snap_to_edges, snap_to_grid, Snap};
pub use timeline::{OverlapPolicy, Timeline, DISPLAY_INTERVAL, MIN_DISPLAY_DURATION};
pub use track::{Track, TrackKind};

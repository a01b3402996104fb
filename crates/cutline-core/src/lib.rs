//! Cutline Core - Foundation types for the timeline compositor
//!
//! This crate provides the fundamental types used throughout Cutline:
//! - Time representation (FrameRate, TimeRange, timecode parsing)
//! - The error taxonomy shared by every crate

pub mod error;
pub mod time;

pub use error::{CutlineError, Result};
pub use time::{format_timecode, parse_timecode, FrameRate, TimeRange};

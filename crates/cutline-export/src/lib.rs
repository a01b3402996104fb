//! Cutline Export - Pipeline compiler and encoder job management
//!
//! Turns a finalized timeline into a deterministic, ordered pipeline
//! description (trim → gain → concat → scale → encode), renders it to
//! FFmpeg arguments, and runs it as a caller-owned job with a typed
//! event stream, machine-readable progress parsing, and idempotent
//! cancellation.

pub mod encoder;
pub mod job;
pub mod plan;
pub mod progress;
pub mod settings;

pub use encoder::{Encoder, EncoderHandle, ExitReport, FfmpegEncoder};
pub use job::{ExportEvent, ExportJob};
pub use plan::{compile, ExportPlan, Stage};
pub use progress::{ExportProgress, ProgressParser};
pub use settings::{AudioSettings, Container, ExportSettings, Quality};

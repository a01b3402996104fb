//! Error types for Cutline.

use thiserror::Error;

/// Main error type for Cutline operations.
///
/// A queried time falling into a timeline gap is deliberately *not* an
/// error — gap results are `Option`-shaped at the call sites that can
/// produce them.
#[derive(Error, Debug)]
pub enum CutlineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input that blocks an operation. The operation is never
    /// partially applied.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A clip, track, or media-source id that could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure to spawn or drive the encoder process.
    #[error("Encoder error: {0}")]
    Encoder(String),

    /// The encoder process exited with a nonzero status.
    #[error("Encoder exited with status {code:?}: {stderr}")]
    Subprocess {
        code: Option<i32>,
        stderr: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Cutline operations.
pub type Result<T> = std::result::Result<T, CutlineError>;

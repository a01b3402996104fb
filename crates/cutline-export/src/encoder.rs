//! The encoder subprocess contract and its system-FFmpeg implementation.

use cutline_core::{CutlineError, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use tracing::{debug, warn};

/// Exit information for a finished encoder process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    pub code: Option<i32>,
    /// Captured stderr text, attached to failures.
    pub stderr: String,
}

/// Spawns encoder processes for compiled argument vectors.
pub trait Encoder: Send + Sync {
    fn spawn(&self, args: &[String]) -> Result<Box<dyn EncoderHandle>>;
}

/// A running encoder process.
pub trait EncoderHandle: Send {
    /// Take the machine-readable progress stream. Yields once; the
    /// job's reader thread owns it afterwards.
    fn take_progress_reader(&mut self) -> Option<Box<dyn BufRead + Send>>;
    /// Hard-kill the process. Safe to call on an exited process.
    fn kill(&mut self);
    /// Block until the process exits and report the outcome.
    fn wait(&mut self) -> ExitReport;
}

/// System FFmpeg located on `PATH`.
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl FfmpegEncoder {
    /// Locate `ffmpeg` on the search path.
    pub fn locate() -> Result<Self> {
        let binary = which::which("ffmpeg")
            .map_err(|e| CutlineError::Encoder(format!("ffmpeg not found on PATH: {e}")))?;
        debug!(binary = %binary.display(), "Located ffmpeg");
        Ok(Self { binary })
    }

    /// Use an explicit binary path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Encoder for FfmpegEncoder {
    fn spawn(&self, args: &[String]) -> Result<Box<dyn EncoderHandle>> {
        let child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CutlineError::Encoder(format!("failed to spawn ffmpeg: {e}")))?;
        debug!(pid = child.id(), "Spawned ffmpeg");
        Ok(Box::new(FfmpegHandle { child }))
    }
}

struct FfmpegHandle {
    child: Child,
}

impl EncoderHandle for FfmpegHandle {
    fn take_progress_reader(&mut self) -> Option<Box<dyn BufRead + Send>> {
        self.child
            .stdout
            .take()
            .map(|stdout| Box::new(BufReader::new(stdout)) as Box<dyn BufRead + Send>)
    }

    fn kill(&mut self) {
        if let Err(e) = self.child.kill() {
            warn!(error = %e, "Kill signal failed (process may have exited)");
        }
        let _ = self.child.wait();
    }

    fn wait(&mut self) -> ExitReport {
        let status = match self.child.wait() {
            Ok(status) => status,
            Err(e) => {
                return ExitReport {
                    success: false,
                    code: None,
                    stderr: format!("failed to wait for ffmpeg: {e}"),
                }
            }
        };

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        ExitReport {
            success: status.success(),
            code: status.code(),
            stderr,
        }
    }
}

//! Parser for the encoder's machine-readable progress stream.
//!
//! FFmpeg's `-progress pipe:1` output is `key=value` lines grouped into
//! blocks ending with `progress=continue` or `progress=end`:
//!
//! ```text
//! frame=100
//! fps=30.0
//! out_time=00:00:03.33
//! speed=2.5x
//! progress=continue
//! ```
//!
//! Chunks may arrive batched or split mid-line; the parser buffers and
//! tolerates unknown, missing, or out-of-order keys. An update is
//! emitted per block boundary once both `frame` and `out_time` have
//! been observed at least once.

use cutline_core::parse_timecode;
use serde::{Deserialize, Serialize};

/// Guard against division by a near-zero progress fraction or speed.
const PROGRESS_EPSILON: f64 = 1e-4;

/// One progress update with its ETA estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Last frame the encoder reported.
    pub frame: u64,
    /// Current output time in seconds.
    pub out_time: f64,
    /// Encoding speed multiplier (1.0 = realtime).
    pub speed: f64,
    /// Fraction of the output completed, 0.0..=1.0.
    pub fraction: f64,
    /// Estimated total output duration in seconds.
    pub estimated_total: f64,
    /// Estimated seconds of wall time remaining.
    pub eta: f64,
}

/// Accumulating parser over a possibly-fragmented progress stream.
#[derive(Debug)]
pub struct ProgressParser {
    total_duration: f64,
    buffer: String,
    frame: Option<u64>,
    out_time: Option<f64>,
    speed: f64,
    finished: bool,
}

impl ProgressParser {
    /// Create a parser for an output of the given total duration.
    pub fn new(total_duration: f64) -> Self {
        Self {
            total_duration,
            buffer: String::new(),
            frame: None,
            out_time: None,
            speed: 1.0,
            finished: false,
        }
    }

    /// Feed a chunk of stream data. Returns the updates completed by
    /// this chunk, one per block boundary reached.
    pub fn feed(&mut self, chunk: &str) -> Vec<ExportProgress> {
        self.buffer.push_str(chunk);

        let mut updates = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            if let Some(update) = self.accept_line(line.trim_end()) {
                updates.push(update);
            }
        }
        updates
    }

    /// Whether the terminal `progress=end` marker has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn accept_line(&mut self, line: &str) -> Option<ExportProgress> {
        let (key, value) = line.split_once('=')?;
        match (key.trim(), value.trim()) {
            ("frame", value) => {
                if let Ok(frame) = value.parse() {
                    self.frame = Some(frame);
                }
            }
            ("out_time", value) => {
                if let Some(secs) = parse_timecode(value) {
                    self.out_time = Some(secs);
                }
            }
            ("speed", value) => {
                if let Some(speed) = value.strip_suffix('x').and_then(|v| v.parse().ok()) {
                    self.speed = speed;
                }
            }
            ("progress", value) => {
                if value == "end" {
                    self.finished = true;
                }
                return self.snapshot();
            }
            // Unknown keys (fps, bitrate, out_time_ms, ...) are fine
            _ => {}
        }
        None
    }

    /// Build an update if both required keys have been observed.
    fn snapshot(&self) -> Option<ExportProgress> {
        let frame = self.frame?;
        let out_time = self.out_time?;

        let fraction = if self.total_duration > 0.0 {
            (out_time / self.total_duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let estimated_total = out_time / fraction.max(PROGRESS_EPSILON);
        let speed = self.speed.max(PROGRESS_EPSILON);
        let eta = ((estimated_total - out_time) / speed).max(0.0);

        Some(ExportProgress {
            frame,
            out_time,
            speed: self.speed,
            fraction,
            estimated_total,
            eta,
        })
    }
}

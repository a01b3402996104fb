//! Time primitives for the compositor.
//!
//! Timeline positions and durations are seconds as `f64` — the editing
//! model works in continuous time and compares with small epsilons.
//! Frame rates stay rational (e.g. 30000/1001 for 29.97 fps) so frame
//! counts can be computed without floating-point accumulation.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame in seconds.
    #[inline]
    pub fn frame_duration_secs(self) -> f64 {
        self.denominator as f64 / self.numerator as f64
    }

    /// Number of whole frames covering `secs` seconds.
    ///
    /// Goes through rational arithmetic so fractional rates
    /// (24000/1001 and friends) do not drift.
    pub fn frames_for_secs(self, secs: f64) -> i64 {
        const PRECISION: i64 = 1_000_000;
        let t = Rational64::new((secs * PRECISION as f64).round() as i64, PRECISION);
        let frames = t * Rational64::new(self.numerator as i64, self.denominator as i64);
        *frames.numer() / *frames.denom()
    }

    /// FFmpeg-style `num/den` rendering.
    pub fn as_ffmpeg_arg(self) -> String {
        format!("{}/{}", self.numerator, self.denominator)
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A time range in seconds with inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: f64,
    /// Duration of the range
    pub duration: f64,
}

impl TimeRange {
    /// Create a new time range from start and duration.
    #[inline]
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// Create a time range from start and end times.
    #[inline]
    pub fn from_start_end(start: f64, end: f64) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Check if two ranges overlap.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start: 0.0,
        duration: 0.0,
    };
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Format seconds as `HH:MM:SS.ff`.
pub fn format_timecode(secs: f64) -> String {
    let secs = secs.max(0.0);
    let hours = (secs / 3600.0) as u64;
    let minutes = ((secs / 60.0) as u64) % 60;
    let rem = secs - (hours * 3600 + minutes * 60) as f64;
    format!("{:02}:{:02}:{:05.2}", hours, minutes, rem)
}

/// Parse an `HH:MM:SS.ff` timecode into seconds.
///
/// The fractional part may carry any number of digits (FFmpeg emits six).
/// Returns `None` for non-time values such as `N/A`.
pub fn parse_timecode(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.starts_with('-') {
        return None;
    }
    let mut parts = s.splitn(3, ':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if minutes < 0.0 || seconds < 0.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

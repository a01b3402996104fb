//! Export settings with validation at construction.

use cutline_core::{CutlineError, FrameRate, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Container {
    Mp4,
    Mov,
    WebM,
    Mkv,
}

impl Container {
    /// File extension for this container.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::WebM => "webm",
            Self::Mkv => "mkv",
        }
    }

    /// FFmpeg video encoder used for this container.
    pub fn video_encoder(self) -> &'static str {
        match self {
            Self::Mp4 | Self::Mov | Self::Mkv => "libx264",
            Self::WebM => "libvpx-vp9",
        }
    }

    /// FFmpeg audio encoder used for this container.
    pub fn audio_encoder(self) -> &'static str {
        match self {
            Self::Mp4 | Self::Mov | Self::Mkv => "aac",
            Self::WebM => "libopus",
        }
    }
}

/// Quality tier, mapped to an encoder compression level (CRF).
/// Lower CRF = higher quality and larger output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    Low,
    Medium,
    High,
    Ultra,
}

impl Quality {
    /// CRF value for this tier.
    pub fn crf(self) -> u32 {
        match self {
            Self::Low => 28,
            Self::Medium => 23,
            Self::High => 18,
            Self::Ultra => 15,
        }
    }
}

/// Audio encode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Export audio at all.
    pub enabled: bool,
    /// Audio bitrate in kbps.
    pub bitrate_kbps: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bitrate_kbps: 192,
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

/// Validated export configuration.
///
/// Construct through [`ExportSettings::new`] or a preset; both validate
/// once up front, so downstream stages never re-check field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Directory the output file is written into.
    pub output_dir: PathBuf,
    /// Output file name without extension.
    pub file_name: String,
    pub container: Container,
    pub quality: Quality,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub frame_rate: FrameRate,
    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,
    pub audio: AudioSettings,
}

impl ExportSettings {
    /// Create settings with 1080p/H.264 defaults and validate them.
    pub fn new(output_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Result<Self> {
        let settings = Self {
            output_dir: output_dir.into(),
            file_name: file_name.into(),
            container: Container::Mp4,
            quality: Quality::High,
            width: 1920,
            height: 1080,
            frame_rate: FrameRate::FPS_30,
            video_bitrate_kbps: 8_000,
            audio: AudioSettings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// 1080p30 H.264 upload preset.
    pub fn youtube_1080p(
        output_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Result<Self> {
        Self::new(output_dir, file_name)
    }

    /// 720p30 web preset at a lighter bitrate.
    pub fn web_720p(output_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Result<Self> {
        let mut settings = Self::new(output_dir, file_name)?;
        settings.width = 1280;
        settings.height = 720;
        settings.quality = Quality::Medium;
        settings.video_bitrate_kbps = 4_000;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every field. Callers that mutate fields after construction
    /// re-validate here (the compiler does this once per compile).
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CutlineError::Validation("output directory is empty".into()));
        }
        if self.file_name.trim().is_empty() {
            return Err(CutlineError::Validation("output file name is empty".into()));
        }
        if self.file_name.contains(['/', '\\']) {
            return Err(CutlineError::Validation(format!(
                "output file name {:?} must not contain path separators",
                self.file_name
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CutlineError::Validation(format!(
                "output resolution {}x{} is invalid",
                self.width, self.height
            )));
        }
        if self.frame_rate.numerator == 0 || self.frame_rate.denominator == 0 {
            return Err(CutlineError::Validation("frame rate is invalid".into()));
        }
        if self.video_bitrate_kbps == 0 {
            return Err(CutlineError::Validation("video bitrate is zero".into()));
        }
        if self.audio.enabled {
            if self.audio.bitrate_kbps == 0 || self.audio.sample_rate == 0 {
                return Err(CutlineError::Validation(
                    "audio bitrate/sample rate is zero".into(),
                ));
            }
            if self.audio.channels == 0 {
                return Err(CutlineError::Validation("audio channel count is zero".into()));
            }
        }
        Ok(())
    }

    /// Full output path: directory, file name, container extension.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.file_name, self.container.extension()))
    }
}

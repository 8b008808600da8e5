//! Editor configuration: frame rate, lane grid and pixel geometry, and the
//! tuning knobs for snapping, pushing and history depth.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use timeline::{Fps, Frame, DEFAULT_OVERLAP_BUFFER, DEFAULT_SNAP_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_rows must be at least 1")]
    NoRows,

    #[error("frame rate {num}/{den} is not positive")]
    InvalidFps { num: u32, den: u32 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Only used to convert frames to milliseconds for caption timing.
    pub fps: Fps,
    pub max_rows: u32,
    pub row_height_px: f32,
    /// Pixel width of the full timeline, mapped onto `total_duration_frames`.
    pub timeline_width_px: f32,
    pub total_duration_frames: Frame,
    pub snap_threshold: Frame,
    pub overlap_buffer: Frame,
    pub push_enabled: bool,
    pub snap_enabled: bool,
    /// Maximum number of undo steps kept (0 = unbounded).
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            max_rows: 5,
            row_height_px: 44.0,
            timeline_width_px: 1000.0,
            total_duration_frames: 900,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            overlap_buffer: DEFAULT_OVERLAP_BUFFER,
            push_enabled: true,
            snap_enabled: true,
            history_limit: 100,
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rows == 0 {
            return Err(ConfigError::NoRows);
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ConfigError::InvalidFps { num: self.fps.num, den: self.fps.den });
        }
        for (field, value) in [
            ("row_height_px", self.row_height_px),
            ("timeline_width_px", self.timeline_width_px),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::NotPositive { field, value: value as f64 });
            }
        }
        if self.total_duration_frames <= 0 {
            return Err(ConfigError::NotPositive {
                field: "total_duration_frames",
                value: self.total_duration_frames as f64,
            });
        }
        for (field, value) in [("snap_threshold", self.snap_threshold), ("overlap_buffer", self.overlap_buffer)] {
            if value < 0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// Frames covered by one horizontal pixel.
    pub fn frames_per_px(&self) -> f64 {
        self.total_duration_frames as f64 / self.timeline_width_px as f64
    }
}

//! Engine configuration.
//!
//! Every tunable has a default in [`crate::consts`]; a host passes a JSON
//! object with only the keys it wants to override. Parsed values are checked
//! by [`LensConfig::validate`] before the engine sees them.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_PIXELS_PER_CM, HIT_RADIUS_PX, INPUT_SAMPLE_RATE, MAX_SCALE, MIN_SCALE, OUTPUT_SAMPLE_RATE,
    STREAM_FRAME_HEIGHT, STREAM_FRAME_INTERVAL_MS, STREAM_FRAME_WIDTH, STREAM_JPEG_QUALITY,
};

/// Errors produced while loading or validating a [`LensConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value that must be positive and finite was not.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// `min_scale` is not below `max_scale`.
    #[error("min_scale ({min}) must be below max_scale ({max})")]
    ScaleRange { min: f64, max: f64 },

    /// JPEG quality outside `(0, 1]`.
    #[error("stream_jpeg_quality must be in (0, 1], got {0}")]
    JpegQuality(f64),

    /// A sample rate or frame dimension of zero.
    #[error("{0} must be non-zero")]
    Zero(&'static str),
}

/// Tunables for measurement, interaction and live streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Source pixels per centimeter; stands in for calibration.
    pub pixels_per_cm: f64,
    /// Screen-space pick radius for grabbing a point.
    pub hit_radius_px: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Minimum spacing between streamed video frames.
    pub frame_interval_ms: f64,
    pub stream_frame_width: u32,
    pub stream_frame_height: u32,
    pub stream_jpeg_quality: f64,
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    /// Clamp placed and dragged coordinates to `[0, 1]`.
    pub clamp_points: bool,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            pixels_per_cm: DEFAULT_PIXELS_PER_CM,
            hit_radius_px: HIT_RADIUS_PX,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            frame_interval_ms: STREAM_FRAME_INTERVAL_MS,
            stream_frame_width: STREAM_FRAME_WIDTH,
            stream_frame_height: STREAM_FRAME_HEIGHT,
            stream_jpeg_quality: STREAM_JPEG_QUALITY,
            input_sample_rate: INPUT_SAMPLE_RATE,
            output_sample_rate: OUTPUT_SAMPLE_RATE,
            clamp_points: true,
        }
    }
}

impl LensConfig {
    /// Parse a JSON object, filling missing keys from the defaults, then validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the matching
    /// validation variant for out-of-range values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("pixels_per_cm", self.pixels_per_cm)?;
        positive("hit_radius_px", self.hit_radius_px)?;
        positive("min_scale", self.min_scale)?;
        positive("max_scale", self.max_scale)?;
        positive("frame_interval_ms", self.frame_interval_ms)?;
        if self.min_scale >= self.max_scale {
            return Err(ConfigError::ScaleRange { min: self.min_scale, max: self.max_scale });
        }
        if !(self.stream_jpeg_quality > 0.0 && self.stream_jpeg_quality <= 1.0) {
            return Err(ConfigError::JpegQuality(self.stream_jpeg_quality));
        }
        for (field, value) in [
            ("stream_frame_width", self.stream_frame_width),
            ("stream_frame_height", self.stream_frame_height),
            ("input_sample_rate", self.input_sample_rate),
            ("output_sample_rate", self.output_sample_rate),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(field));
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(ConfigError::NotPositive { field, value }) }
}

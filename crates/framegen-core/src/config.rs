//! Engine configuration.
//!
//! [`EngineConfig`] is the single source of truth for the control plane.
//! It is serializable so hosts can ship it as YAML or JSON; every field has
//! a default, so partial documents are accepted.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use framegen_errors::ValidationError;
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_FRAME_BUDGET_NS, DEFAULT_REFRESH_RATE_HZ};

/// Smallest model resolution scale the pipeline will run at.
pub const MIN_MODEL_SCALE: f32 = 0.25;

/// Largest model resolution scale.
pub const MAX_MODEL_SCALE: f32 = 1.0;

/// Output multiplier: how many frames are presented per captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum InterpolationMode {
    /// Passthrough, no synthetic frames
    #[serde(rename = "off")]
    Off = 0,
    /// One synthetic frame per pair
    #[default]
    #[serde(rename = "2x")]
    Double = 1,
    /// Two synthetic frames per pair
    #[serde(rename = "3x")]
    Triple = 2,
    /// Three synthetic frames per pair
    #[serde(rename = "4x")]
    Quadruple = 3,
}

impl InterpolationMode {
    /// Number of synthetic frames generated between two captured frames.
    #[inline]
    #[must_use]
    pub const fn intermediate_count(self) -> usize {
        self as usize
    }

    /// Numeric code used by the control surface.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decode a control-surface mode code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(InterpolationMode::Off),
            1 => Some(InterpolationMode::Double),
            2 => Some(InterpolationMode::Triple),
            3 => Some(InterpolationMode::Quadruple),
            _ => None,
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationMode::Off => "off",
            InterpolationMode::Double => "2x",
            InterpolationMode::Triple => "3x",
            InterpolationMode::Quadruple => "4x",
        };
        f.write_str(name)
    }
}

impl FromStr for InterpolationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(InterpolationMode::Off),
            "2x" | "1" => Ok(InterpolationMode::Double),
            "3x" | "2" => Ok(InterpolationMode::Triple),
            "4x" | "3" => Ok(InterpolationMode::Quadruple),
            other => Err(ValidationError::invalid_enum(
                "mode",
                other,
                "off, 2x, 3x, 4x",
            )),
        }
    }
}

/// Map a quality knob value to a model resolution scale tier.
///
/// `q < 0.3` gives 0.25, `q < 0.6` gives 0.5, anything else 0.75.
#[must_use]
pub fn scale_for_quality(quality: f32) -> f32 {
    let q = quality.clamp(0.0, 1.0);
    if q < 0.3 {
        0.25
    } else if q < 0.6 {
        0.5
    } else {
        0.75
    }
}

/// Block-matching and consistency parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Pyramid depth including full resolution
    pub pyramid_levels: u32,
    /// Block edge length in pixels
    pub block_size: u32,
    /// Search radius in pixels at the coarsest level
    pub search_radius: u32,
    /// Forward-backward error above which a pixel is occluded
    pub consistency_threshold: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            pyramid_levels: 4,
            block_size: 8,
            search_radius: 16,
            consistency_threshold: 1.5,
        }
    }
}

impl MotionParams {
    /// Check all parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=8).contains(&self.pyramid_levels) {
            return Err(ValidationError::out_of_range(
                "pyramid_levels",
                self.pyramid_levels,
                1,
                8,
            ));
        }
        if !(2..=64).contains(&self.block_size) {
            return Err(ValidationError::out_of_range(
                "block_size",
                self.block_size,
                2,
                64,
            ));
        }
        if !(1..=64).contains(&self.search_radius) {
            return Err(ValidationError::out_of_range(
                "search_radius",
                self.search_radius,
                1,
                64,
            ));
        }
        if !(self.consistency_threshold.is_finite() && self.consistency_threshold > 0.0) {
            return Err(ValidationError::constraint(
                "consistency_threshold must be positive",
            ));
        }
        Ok(())
    }
}

/// Control-plane configuration read by every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Source frame width
    pub width: u32,
    /// Source frame height
    pub height: u32,
    /// Output multiplier
    pub mode: InterpolationMode,
    /// Per-frame interpolation budget
    pub max_frame_time_ns: u64,
    /// Quality knob in [0, 1]
    pub quality: f32,
    /// Model resolution scale in [0.25, 1]
    pub model_scale: f32,
    /// Captured-frame queue capacity
    pub capture_queue_depth: usize,
    /// Present queue capacity
    pub present_queue_depth: usize,
    /// Enable thermal throttling
    pub thermal_protection: bool,
    /// Display refresh rate in Hz
    pub target_refresh_rate: u32,
    /// Neural model file, if any
    pub model_path: Option<PathBuf>,
    /// Directory holding `<pipeline>.spv` shader modules
    pub shader_dir: Option<PathBuf>,
    /// Motion search parameters
    pub motion: MotionParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            mode: InterpolationMode::Double,
            max_frame_time_ns: DEFAULT_FRAME_BUDGET_NS,
            quality: 0.5,
            model_scale: 0.5,
            capture_queue_depth: 8,
            present_queue_depth: 16,
            thermal_protection: true,
            target_refresh_rate: DEFAULT_REFRESH_RATE_HZ,
            model_path: None,
            shader_dir: None,
            motion: MotionParams::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for a display of the given size and rate.
    ///
    /// The per-frame budget becomes one display interval, `1e9 / rate` ns.
    #[must_use]
    pub fn for_display(
        width: u32,
        height: u32,
        mode: InterpolationMode,
        quality: f32,
        target_refresh_rate: u32,
    ) -> Self {
        let mut config = Self {
            width,
            height,
            mode,
            target_refresh_rate,
            ..Self::default()
        };
        config.set_quality(quality);
        if target_refresh_rate > 0 {
            config.max_frame_time_ns = 1_000_000_000 / u64::from(target_refresh_rate);
        }
        config
    }

    /// Set the output mode.
    #[must_use]
    pub fn with_mode(mut self, mode: InterpolationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the neural model path.
    #[must_use]
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the shader directory.
    #[must_use]
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Enable or disable thermal protection.
    #[must_use]
    pub fn with_thermal_protection(mut self, enabled: bool) -> Self {
        self.thermal_protection = enabled;
        self
    }

    /// Set the per-frame budget.
    #[must_use]
    pub fn with_budget_ns(mut self, budget_ns: u64) -> Self {
        self.max_frame_time_ns = budget_ns;
        self
    }

    /// Set the quality knob, clamped to [0, 1].
    pub fn set_quality(&mut self, quality: f32) {
        self.quality = if quality.is_nan() {
            0.0
        } else {
            quality.clamp(0.0, 1.0)
        };
    }

    /// Set the model scale, clamped to [0.25, 1].
    pub fn set_model_scale(&mut self, scale: f32) {
        self.model_scale = if scale.is_nan() {
            MIN_MODEL_SCALE
        } else {
            scale.clamp(MIN_MODEL_SCALE, MAX_MODEL_SCALE)
        };
    }

    /// Per-frame budget as a [`Duration`].
    #[must_use]
    pub fn budget(&self) -> Duration {
        Duration::from_nanos(self.max_frame_time_ns)
    }

    /// Interval between presented frames.
    #[must_use]
    pub fn present_interval(&self) -> Duration {
        let rate = u64::from(self.target_refresh_rate.max(1));
        Duration::from_nanos(1_000_000_000 / rate)
    }

    /// Clamp every field into its valid range.
    pub fn normalize(&mut self) {
        self.set_quality(self.quality);
        self.set_model_scale(self.model_scale);
        self.capture_queue_depth = self.capture_queue_depth.max(2);
        self.present_queue_depth = self.present_queue_depth.max(2);
        self.target_refresh_rate = self.target_refresh_rate.clamp(1, 1000);
        self.max_frame_time_ns = self.max_frame_time_ns.max(1);
        self.motion.pyramid_levels = self.motion.pyramid_levels.clamp(1, 8);
        self.motion.block_size = self.motion.block_size.clamp(2, 64);
        self.motion.search_radius = self.motion.search_radius.clamp(1, 64);
        if !(self.motion.consistency_threshold.is_finite() && self.motion.consistency_threshold > 0.0) {
            self.motion.consistency_threshold = MotionParams::default().consistency_threshold;
        }
    }

    /// Check the configuration is usable as-is.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.width == 0 || self.height == 0 {
            return Err(ValidationError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ValidationError::out_of_range("quality", self.quality, 0.0, 1.0));
        }
        if !(MIN_MODEL_SCALE..=MAX_MODEL_SCALE).contains(&self.model_scale) {
            return Err(ValidationError::out_of_range(
                "model_scale",
                self.model_scale,
                MIN_MODEL_SCALE,
                MAX_MODEL_SCALE,
            ));
        }
        if self.capture_queue_depth < 2 {
            return Err(ValidationError::out_of_range(
                "capture_queue_depth",
                self.capture_queue_depth,
                2,
                usize::MAX,
            ));
        }
        if self.present_queue_depth < 2 {
            return Err(ValidationError::out_of_range(
                "present_queue_depth",
                self.present_queue_depth,
                2,
                usize::MAX,
            ));
        }
        if !(1..=1000).contains(&self.target_refresh_rate) {
            return Err(ValidationError::out_of_range(
                "target_refresh_rate",
                self.target_refresh_rate,
                1,
                1000,
            ));
        }
        if self.max_frame_time_ns == 0 {
            return Err(ValidationError::constraint("max_frame_time_ns must be positive"));
        }
        self.motion.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, InterpolationMode::Double);
        assert_eq!(config.max_frame_time_ns, 8_000_000);
        assert!((config.quality - 0.5).abs() < f32::EPSILON);
        assert!((config.model_scale - 0.5).abs() < f32::EPSILON);
        assert!(config.thermal_protection);
        assert_eq!(config.target_refresh_rate, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_display_derives_budget() {
        let config = EngineConfig::for_display(640, 360, InterpolationMode::Quadruple, 0.8, 60);
        assert_eq!(config.max_frame_time_ns, 16_666_666);
        assert_eq!(config.present_interval(), Duration::from_nanos(16_666_666));
        assert_eq!(config.mode.intermediate_count(), 3);
    }

    #[test]
    fn test_mode_codes() {
        for code in 0..4u8 {
            let mode = InterpolationMode::from_code(code);
            assert_eq!(mode.map(InterpolationMode::code), Some(code));
        }
        assert_eq!(InterpolationMode::from_code(4), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("3x".parse::<InterpolationMode>().ok(), Some(InterpolationMode::Triple));
        assert_eq!("OFF".parse::<InterpolationMode>().ok(), Some(InterpolationMode::Off));
        assert!("5x".parse::<InterpolationMode>().is_err());
    }

    #[test]
    fn test_quality_tiers() {
        assert!((scale_for_quality(0.0) - 0.25).abs() < f32::EPSILON);
        assert!((scale_for_quality(0.29) - 0.25).abs() < f32::EPSILON);
        assert!((scale_for_quality(0.3) - 0.5).abs() < f32::EPSILON);
        assert!((scale_for_quality(0.59) - 0.5).abs() < f32::EPSILON);
        assert!((scale_for_quality(0.6) - 0.75).abs() < f32::EPSILON);
        assert!((scale_for_quality(7.0) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalize_clamps() {
        let mut config = EngineConfig {
            quality: 3.0,
            model_scale: 0.01,
            capture_queue_depth: 0,
            target_refresh_rate: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
        config.normalize();
        assert!(config.validate().is_ok());
        assert!((config.model_scale - MIN_MODEL_SCALE).abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let config = EngineConfig {
            width: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDimensions { .. })
        ));
    }
}

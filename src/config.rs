//! Static scene configuration.
//!
//! [`Settings`] holds population sizes, spatial extents, the damping time
//! constant and the aesthetic tuning constants. It is read once at startup
//! (optionally from a JSON file) and validated before anything is generated.
//!
//! # Example settings file
//!
//! Every field is optional; missing fields take the defaults shown here.
//!
//! ```json
//! {
//!     "point_count": 15000,
//!     "entity_count": 400,
//!     "scatter_radius": 25.0,
//!     "cone_height": 14.0,
//!     "cone_radius": 5.5,
//!     "time_constant": 0.8,
//!     "entities": { "spiral_step": 0.5, "box_threshold": 0.6 },
//!     "colors": { "deep": "#011f10", "light": "#FFF8DC" }
//! }
//! ```

use crate::color;
use crate::error::{ConfigError, SettingsError};
use crate::layout::{ConeShape, SphereShape};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Size of the homogeneous point population.
    pub point_count: usize,
    /// Size of the heterogeneous entity population.
    pub entity_count: usize,
    /// Radius of the scattered point cloud.
    pub scatter_radius: f32,
    /// Height of the assembled cone.
    pub cone_height: f32,
    /// Base radius of the assembled cone.
    pub cone_radius: f32,
    /// Damping time constant in seconds.
    pub time_constant: f32,
    /// Entity-specific layout and attribute tuning.
    pub entities: EntityTuning,
    /// Palette, as sRGB hex strings.
    pub colors: ColorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            point_count: 15_000,
            entity_count: 400,
            scatter_radius: 25.0,
            cone_height: 14.0,
            cone_radius: 5.5,
            time_constant: 0.8,
            entities: EntityTuning::default(),
            colors: ColorSettings::default(),
        }
    }
}

/// Layout and attribute constants for the entity population.
///
/// These are visual tuning values. They are kept as defaults, not invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityTuning {
    /// Entity scatter radius relative to [`Settings::scatter_radius`].
    pub scatter_scale: f32,
    /// Height trimmed from the cone's vertical span so entities stay off the tip and base.
    pub height_margin: f32,
    /// Entity cone radius relative to [`Settings::cone_radius`].
    pub radius_scale: f32,
    /// Azimuth increment per entity index, in radians.
    pub spiral_step: f32,
    /// A uniform draw above this makes the entity a box; otherwise a sphere.
    pub box_threshold: f32,
    /// A uniform draw above this picks the accent color.
    pub accent_threshold: f32,
    /// A uniform draw above this picks the emerald color.
    pub emerald_threshold: f32,
    /// Base scale range `[min, max)`.
    pub scale_range: [f32; 2],
    /// Motion weight range `[min, max)`.
    pub weight_range: [f32; 2],
}

impl Default for EntityTuning {
    fn default() -> Self {
        Self {
            scatter_scale: 1.2,
            height_margin: 2.0,
            radius_scale: 0.9,
            spiral_step: 0.5,
            box_threshold: 0.6,
            accent_threshold: 0.7,
            emerald_threshold: 0.9,
            scale_range: [0.15, 0.45],
            weight_range: [0.5, 1.0],
        }
    }
}

/// Palette entries as sRGB hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorSettings {
    /// Deep base tone of the point population.
    pub deep: String,
    /// Pale tip tone of the point population.
    pub light: String,
    /// Most common entity color.
    pub gold: String,
    /// Accent entity color.
    pub accent: String,
    /// Rare entity color.
    pub emerald: String,
    /// Clear color of the reference viewer.
    pub background: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            deep: "#011f10".into(),
            light: "#FFF8DC".into(),
            gold: "#FFD700".into(),
            accent: "#8a0303".into(),
            emerald: "#008f51".into(),
            background: "#00110a".into(),
        }
    }
}

/// Palette decoded to linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub deep: Vec3,
    pub light: Vec3,
    pub gold: Vec3,
    pub accent: Vec3,
    pub emerald: Vec3,
    pub background: Vec3,
}

impl ColorSettings {
    /// Decode every entry, failing on the first malformed one.
    pub fn resolve(&self) -> Result<Palette, ConfigError> {
        let parse = |name: &'static str, value: &str| {
            color::from_hex(value).ok_or_else(|| ConfigError::InvalidColor {
                name,
                value: value.to_string(),
            })
        };
        Ok(Palette {
            deep: parse("colors.deep", &self.deep)?,
            light: parse("colors.light", &self.light)?,
            gold: parse("colors.gold", &self.gold)?,
            accent: parse("colors.accent", &self.accent)?,
            emerald: parse("colors.emerald", &self.emerald)?,
            background: parse("colors.background", &self.background)?,
        })
    }
}

impl Settings {
    /// Parse settings from a JSON string and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            points = settings.point_count,
            entities = settings.entity_count,
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Check every parameter. Called before any population is generated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.point_scatter()?;
        self.point_cone()?;
        self.entity_scatter()?;
        self.entity_cone()?;
        validate_time_constant(self.time_constant)?;

        let t = &self.entities;
        finite("entities.spiral_step", t.spiral_step)?;
        probability("entities.box_threshold", t.box_threshold)?;
        probability("entities.accent_threshold", t.accent_threshold)?;
        probability("entities.emerald_threshold", t.emerald_threshold)?;
        positive_range("entities.scale_range", t.scale_range)?;
        positive_range("entities.weight_range", t.weight_range)?;
        self.colors.resolve()?;
        Ok(())
    }

    /// Scatter sphere of the point population.
    pub fn point_scatter(&self) -> Result<SphereShape, ConfigError> {
        SphereShape::new(self.scatter_radius)
    }

    /// Cone of the point population.
    pub fn point_cone(&self) -> Result<ConeShape, ConfigError> {
        ConeShape::new(self.cone_height, self.cone_radius)
    }

    /// Scatter sphere of the entity population.
    pub fn entity_scatter(&self) -> Result<SphereShape, ConfigError> {
        extent("entities.scatter_scale", self.entities.scatter_scale)?;
        SphereShape::new(self.scatter_radius * self.entities.scatter_scale)
    }

    /// Cone of the entity population: narrower, and trimmed top and bottom.
    pub fn entity_cone(&self) -> Result<ConeShape, ConfigError> {
        let t = &self.entities;
        extent("entities.radius_scale", t.radius_scale)?;
        ConeShape::new(self.cone_height, self.cone_radius * t.radius_scale)?
            .with_margin(t.height_margin)
    }

    /// Decoded palette.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        self.colors.resolve()
    }
}

pub(crate) fn validate_time_constant(value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTimeConstant(value))
    }
}

pub(crate) fn extent(name: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidExtent { name, value })
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}

fn probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

fn positive_range(name: &'static str, [min, max]: [f32; 2]) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min > 0.0 && min < max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { name, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.point_count, 15_000);
        assert_eq!(settings.entity_count, 400);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json_str(
            r#"{ "entity_count": 10, "entities": { "spiral_step": 0.25 } }"#,
        )
        .unwrap();
        assert_eq!(settings.entity_count, 10);
        assert_eq!(settings.entities.spiral_step, 0.25);
        assert_eq!(settings.entities.box_threshold, 0.6);
        assert_eq!(settings.point_count, 15_000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Settings::from_json_str(r#"{ "scatter_radus": 3.0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let err = Settings::from_json_str(r#"{ "scatter_radius": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid(ConfigError::InvalidExtent { .. })
        ));
    }

    #[test]
    fn test_zero_time_constant_rejected() {
        let settings = Settings {
            time_constant: 0.0,
            ..Settings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidTimeConstant(0.0))
        );
    }

    #[test]
    fn test_non_finite_extent_rejected() {
        let settings = Settings {
            cone_height: f32::NAN,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidExtent { name: "cone_height", .. })
        ));
    }

    #[test]
    fn test_margin_must_fit_in_cone() {
        let mut settings = Settings::default();
        settings.entities.height_margin = 14.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_bad_probability_rejected() {
        let mut settings = Settings::default();
        settings.entities.box_threshold = 1.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut settings = Settings::default();
        settings.entities.weight_range = [1.0, 0.5];
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_bad_color_rejected() {
        let mut settings = Settings::default();
        settings.colors.gold = "gold".into();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidColor { name: "colors.gold", .. })
        ));
    }

    #[test]
    fn test_entity_shapes() {
        let settings = Settings::default();
        let scatter = settings.entity_scatter().unwrap();
        assert!((scatter.radius() - 30.0).abs() < 1e-4);

        let cone = settings.entity_cone().unwrap();
        assert_eq!(cone.height(), 14.0);
        assert!((cone.base_radius() - 4.95).abs() < 1e-4);
        assert_eq!(cone.span(), 12.0);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(Settings::from_json_str(&json).unwrap(), settings);
    }
}

//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::CoreResult;

/// Tunables for the interactive engine.
///
/// Every field has a default, so a partial JSON document only overrides what
/// it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Zoom applied on start-up and by the reset affordance.
    pub default_zoom: f64,
    /// Lower zoom clamp.
    pub min_zoom: f64,
    /// Upper zoom clamp.
    pub max_zoom: f64,
    /// Wheel delta to log-zoom factor.
    pub wheel_sensitivity: f64,
    /// Screen-pixel radius within which a vanishing point is hit.
    pub point_hit_radius: f64,
    /// Screen-pixel perpendicular tolerance for ray and grid-line hits.
    pub line_hit_tolerance: f64,
    /// How far behind a ray's apex (screen pixels) a ray hit is still accepted.
    pub ray_backtrack: f64,
    /// Ray length as a multiple of the larger viewport side.
    pub ray_reach_factor: f64,
    /// Snapshots kept for undo.
    pub history_depth: usize,
    /// Layer alpha tables and image opacity.
    pub alpha: AlphaConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_zoom: 0.6,
            min_zoom: 0.05,
            max_zoom: 8.0,
            wheel_sensitivity: 0.001,
            point_hit_radius: 15.0,
            line_hit_tolerance: 6.0,
            ray_backtrack: 20.0,
            ray_reach_factor: 10.0,
            history_depth: 50,
            alpha: AlphaConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field has the wrong type.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Repair the zoom settings so every zoom stays positive and finite.
    ///
    /// Non-positive or non-finite bounds fall back to their defaults, an
    /// inverted range is swapped and the default zoom is clamped into range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let fallback = Self::default();
        for (name, value, default) in [
            ("min_zoom", &mut self.min_zoom, fallback.min_zoom),
            ("max_zoom", &mut self.max_zoom, fallback.max_zoom),
            ("default_zoom", &mut self.default_zoom, fallback.default_zoom),
        ] {
            if !value.is_finite() || *value <= 0.0 {
                tracing::warn!("{name} {value} is not a positive zoom, using {default}");
                *value = default;
            }
        }
        if self.min_zoom > self.max_zoom {
            tracing::warn!(
                "min_zoom {} exceeds max_zoom {}, swapping",
                self.min_zoom,
                self.max_zoom
            );
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self.default_zoom = self.default_zoom.clamp(self.min_zoom, self.max_zoom);
        self
    }
}

/// Opacity rules for the interactive frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaConfig {
    /// Alpha of the active layer.
    pub active: f64,
    /// Alpha of the hovered layer.
    pub hovered: f64,
    /// Alpha of every other layer.
    pub idle: f64,
    /// Multiplier on all layer alpha while guide mode is on.
    pub guide_dampening: f64,
    /// Reference image opacity.
    pub image: f64,
    /// Reference image opacity while guide mode is on.
    pub guide_image: f64,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self {
            active: 1.0,
            hovered: 0.6,
            idle: 0.3,
            guide_dampening: 0.2,
            image: 0.4,
            guide_image: 0.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"point_hit_radius": 20, "alpha": {"idle": 0.5}}"#)
            .expect("config");
        assert!((config.point_hit_radius - 20.0).abs() < f64::EPSILON);
        assert!((config.alpha.idle - 0.5).abs() < f64::EPSILON);
        assert!((config.alpha.hovered - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.history_depth, 50);
    }

    #[test]
    fn test_inverted_zoom_range_is_swapped() {
        let config =
            EngineConfig::from_json(r#"{"min_zoom": 4.0, "max_zoom": 0.5}"#).expect("config");
        assert!(config.min_zoom < config.max_zoom);
        assert!((config.default_zoom - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_positive_zoom_falls_back() {
        let json = r#"{"min_zoom": 0.0, "max_zoom": -3, "default_zoom": 0}"#;
        let config = EngineConfig::from_json(json).expect("config");
        let defaults = EngineConfig::default();
        assert!((config.min_zoom - defaults.min_zoom).abs() < f64::EPSILON);
        assert!((config.max_zoom - defaults.max_zoom).abs() < f64::EPSILON);
        assert!((config.default_zoom - defaults.default_zoom).abs() < f64::EPSILON);

        let raw = EngineConfig {
            min_zoom: f64::NEG_INFINITY,
            max_zoom: f64::NAN,
            ..EngineConfig::default()
        };
        let fixed = raw.sanitized();
        assert!(fixed.min_zoom > 0.0 && fixed.max_zoom.is_finite());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(EngineConfig::from_json("{ nope").is_err());
        assert!(EngineConfig::from_json(r#"{"history_depth": "lots"}"#).is_err());
    }
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for layout, hit-testing, gestures and the decorative layers.
///
/// Every field has a default, so a config file only needs to name the values
/// it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstellationConfig {
    pub grid_cell_size: f32,
    pub hit_radius: f32,
    pub edge_max_distance: f32,
    pub edge_neighbors: usize,
    pub pan_speed: f32,
    pub max_scale: f32,
    pub min_scale_free: f32,
    pub min_scale_premium: f32,
    pub tap_slop: f32,
    pub double_tap_window_secs: f64,
    pub double_tap_distance: f32,
    pub wheel_sensitivity: f32,
    pub recenter_duration_secs: f64,
    pub reset_duration_secs: f64,
    pub tilt_strength: f32,
    pub tilt_parallax_boost: f32,
    pub sensor_interval_secs: f64,
    pub shooting_interval_secs: (f64, f64),
    pub shooting_duration_secs: (f64, f64),
    pub fallback_viewport: (f32, f32),
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: 80.0,
            hit_radius: 24.0,
            edge_max_distance: 180.0,
            edge_neighbors: 3,
            pan_speed: 0.0256,
            max_scale: 2.5,
            min_scale_free: 0.9,
            min_scale_premium: 0.6,
            tap_slop: 6.0,
            double_tap_window_secs: 0.3,
            double_tap_distance: 24.0,
            wheel_sensitivity: 0.0015,
            recenter_duration_secs: 0.4,
            reset_duration_secs: 0.3,
            tilt_strength: 24.0,
            tilt_parallax_boost: 1.3,
            sensor_interval_secs: 0.033,
            shooting_interval_secs: (4.5, 9.0),
            shooting_duration_secs: (1.4, 2.6),
            fallback_viewport: (390.0, 844.0),
        }
    }
}

impl ConstellationConfig {
    pub fn min_scale(&self, is_premium: bool) -> f32 {
        if is_premium {
            self.min_scale_premium
        } else {
            self.min_scale_free
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid constellation config JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = ConstellationConfig::from_json(r#"{ "hitRadius": 30.0, "edgeNeighbors": 5 }"#)
            .expect("valid config");

        assert_eq!(config.hit_radius, 30.0);
        assert_eq!(config.edge_neighbors, 5);
        assert_eq!(config.grid_cell_size, 80.0);
        assert_eq!(config.max_scale, 2.5);
    }

    #[test]
    fn min_scale_depends_on_tier() {
        let config = ConstellationConfig::default();
        assert_eq!(config.min_scale(false), 0.9);
        assert_eq!(config.min_scale(true), 0.6);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ConstellationConfig::from_json("{ hitRadius: ").is_err());
    }
}

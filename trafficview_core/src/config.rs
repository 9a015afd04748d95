//! Application configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trafficview_env::{GeoPoint, SpeedStats};

use crate::error::NavError;
use crate::heatmap::{DEFAULT_POINT_COUNT, DEFAULT_SPREAD_DEG};

/// Configuration for a [`NavigationApp`](crate::NavigationApp).
///
/// All durations are in milliseconds so the struct round-trips through
/// JSON config files unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial map center; also the reference point for ad-hoc incidents
    pub map_center: GeoPoint,

    /// Initial zoom level (default: 13)
    pub zoom: u8,

    /// Route start used when the user location is unknown
    pub default_start: GeoPoint,

    /// Destination around which searched routes end
    pub default_destination: GeoPoint,

    /// Points per heatmap sample (default: 200)
    pub heatmap_points: usize,

    /// Full width in degrees of the heatmap sampling box (default: 0.05)
    pub heatmap_spread_deg: f64,

    /// Live traffic update interval (default: 10s)
    pub live_update_interval_ms: u64,

    /// Simulated search latency (default: 1.5s)
    pub search_latency_ms: u64,

    /// Simulated recalculation latency (default: 1s)
    pub recalculate_latency_ms: u64,

    /// Extra uniform random latency added to search and recalculation
    pub latency_jitter_ms: u64,

    /// Probability that a search fails (default: 0.0)
    pub search_failure_rate: f64,

    /// A tick reporting incidents raises an alert when `U > threshold` (default: 0.7)
    pub incident_alert_threshold: f64,

    /// How long insight messages stay visible (default: 3s)
    pub insight_duration_ms: u64,

    /// How long incident alerts stay visible (default: 5s)
    pub alert_duration_ms: u64,

    /// Traffic updates kept in the generator's history (default: 100)
    pub update_history_limit: usize,

    /// Incidents kept in app state; the oldest go first (default: 100)
    pub incident_history_limit: usize,

    /// Speed figures shown before the first live update
    pub initial_speed: SpeedStats,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            map_center: GeoPoint::new(40.7128, -74.0060),
            zoom: 13,
            default_start: GeoPoint::new(40.705, -74.015),
            default_destination: GeoPoint::new(40.725, -73.995),
            heatmap_points: DEFAULT_POINT_COUNT,
            heatmap_spread_deg: DEFAULT_SPREAD_DEG,
            live_update_interval_ms: 10_000,
            search_latency_ms: 1_500,
            recalculate_latency_ms: 1_000,
            latency_jitter_ms: 0,
            search_failure_rate: 0.0,
            incident_alert_threshold: 0.7,
            insight_duration_ms: 3_000,
            alert_duration_ms: 5_000,
            update_history_limit: 100,
            incident_history_limit: 100,
            initial_speed: SpeedStats {
                current_mph: 42,
                average_mph: 28,
                capacity_pct: 68,
            },
        }
    }
}

impl AppConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NavError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NavError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.heatmap_points == 0 {
            return Err(NavError::InvalidConfig("heatmap_points must be > 0".into()));
        }
        if self.heatmap_spread_deg.is_nan() || self.heatmap_spread_deg <= 0.0 {
            return Err(NavError::InvalidConfig("heatmap_spread_deg must be > 0".into()));
        }
        if self.incident_history_limit == 0 {
            return Err(NavError::InvalidConfig("incident_history_limit must be > 0".into()));
        }
        if self.live_update_interval_ms == 0 {
            return Err(NavError::InvalidConfig("live_update_interval_ms must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.search_failure_rate) {
            return Err(NavError::InvalidConfig("search_failure_rate must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.incident_alert_threshold) {
            return Err(NavError::InvalidConfig(
                "incident_alert_threshold must be in [0, 1]".into(),
            ));
        }
        Ok(())
    }

    pub fn live_update_interval(&self) -> Duration {
        Duration::from_millis(self.live_update_interval_ms)
    }

    pub fn search_latency(&self) -> Duration {
        Duration::from_millis(self.search_latency_ms)
    }

    pub fn recalculate_latency(&self) -> Duration {
        Duration::from_millis(self.recalculate_latency_ms)
    }

    pub fn latency_jitter(&self) -> Duration {
        Duration::from_millis(self.latency_jitter_ms)
    }

    pub fn insight_duration(&self) -> Duration {
        Duration::from_millis(self.insight_duration_ms)
    }

    pub fn alert_duration(&self) -> Duration {
        Duration::from_millis(self.alert_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.heatmap_points, 200);
        assert_eq!(config.live_update_interval(), Duration::from_secs(10));
        assert_eq!(config.search_latency(), Duration::from_millis(1500));
        assert_eq!(config.insight_duration(), Duration::from_secs(3));
        assert_eq!(config.alert_duration(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AppConfig::from_json_str(r#"{ "heatmap_points": 50, "zoom": 15 }"#).unwrap();
        assert_eq!(config.heatmap_points, 50);
        assert_eq!(config.zoom, 15);
        assert_eq!(config.search_latency_ms, 1_500);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            AppConfig::from_json_str(r#"{ "heatmap_points": 0 }"#),
            Err(NavError::InvalidConfig(_))
        ));
        assert!(matches!(
            AppConfig::from_json_str(r#"{ "search_failure_rate": 1.5 }"#),
            Err(NavError::InvalidConfig(_))
        ));
        assert!(matches!(
            AppConfig::from_json_str(r#"{ "incident_history_limit": 0 }"#),
            Err(NavError::InvalidConfig(_))
        ));
        assert!(matches!(
            AppConfig::from_json_str("not json"),
            Err(NavError::InvalidConfig(_))
        ));
    }
}

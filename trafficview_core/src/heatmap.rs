//! Traffic density heatmap.

use serde::{Deserialize, Serialize};
use trafficview_env::{GeoPoint, HeatmapPoint, HeatmapStyle, LegendEntry, RandomSource};

use crate::incident::Incident;

/// Default number of points in a random sample.
pub const DEFAULT_POINT_COUNT: usize = 200;

/// Default full width (degrees) of the sampling box around the center.
pub const DEFAULT_SPREAD_DEG: f64 = 0.05;

/// A heatmap point set together with its render style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub points: Vec<HeatmapPoint>,
    pub style: HeatmapStyle,
}

impl Heatmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, latitude: f64, longitude: f64, intensity: f64) {
        self.points.push(HeatmapPoint::new(latitude, longitude, intensity));
    }

    /// Replaces the points with one per incident.
    pub fn fill_from_incidents(&mut self, incidents: &[Incident]) -> &[HeatmapPoint] {
        self.points = incidents.iter().map(Incident::to_heatmap_point).collect();
        &self.points
    }

    /// Replaces the points with a fresh random sample.
    ///
    /// Each coordinate is `center + (U - 0.5) * spread`, so points land
    /// within `±spread / 2` of the center. Intensity is `U * 0.8 + 0.2`.
    pub fn randomize(
        &mut self,
        rng: &dyn RandomSource,
        center: GeoPoint,
        count: usize,
        spread: f64,
    ) -> &[HeatmapPoint] {
        self.points = sample_points(rng, center, count, spread);
        &self.points
    }

    /// Sets the intensity of one point. Out-of-range indices are ignored.
    pub fn update_point(&mut self, index: usize, intensity: f64) {
        if let Some(point) = self.points.get_mut(index) {
            point.intensity = intensity;
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Draws `count` independent points around `center`.
pub fn sample_points(
    rng: &dyn RandomSource,
    center: GeoPoint,
    count: usize,
    spread: f64,
) -> Vec<HeatmapPoint> {
    (0..count)
        .map(|_| {
            let lat = center.latitude + (rng.next_f64() - 0.5) * spread;
            let lon = center.longitude + (rng.next_f64() - 0.5) * spread;
            let intensity = rng.next_f64() * 0.8 + 0.2;
            HeatmapPoint::new(lat, lon, intensity)
        })
        .collect()
}

/// Legend rows matching the default gradient.
pub fn traffic_legend() -> Vec<LegendEntry> {
    let entry = |rgba: &str, label: &str, range: &str| LegendEntry {
        rgba: rgba.to_string(),
        label: label.to_string(),
        range: range.to_string(),
    };
    vec![
        entry("rgba(0, 243, 255, 0.2)", "Light Traffic", "0-20%"),
        entry("rgba(0, 243, 255, 0.5)", "Moderate", "20-50%"),
        entry("rgba(255, 179, 77, 0.6)", "Heavy", "50-80%"),
        entry("rgba(255, 55, 95, 0.8)", "Gridlock", "80-100%"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::{IncidentId, IncidentType, Severity};
    use trafficview_env::{SequenceRandom, ThreadRandom};

    #[test]
    fn test_sample_points_bounds() {
        let rng = ThreadRandom;
        let points = sample_points(&rng, GeoPoint::new(0.0, 0.0), 50, DEFAULT_SPREAD_DEG);

        assert_eq!(points.len(), 50);
        for p in &points {
            assert!(p.latitude.abs() <= 0.025);
            assert!(p.longitude.abs() <= 0.025);
            assert!((0.2..=1.0).contains(&p.intensity));
        }
    }

    #[test]
    fn test_sample_points_extremes() {
        let low = SequenceRandom::constant(0.0);
        let p = sample_points(&low, GeoPoint::new(10.0, 20.0), 1, DEFAULT_SPREAD_DEG)[0];
        assert!((p.latitude - 9.975).abs() < 1e-12);
        assert!((p.longitude - 19.975).abs() < 1e-12);
        assert!((p.intensity - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_fill_from_incidents() {
        let incidents = vec![
            Incident::new(
                IncidentId::from_seed(0),
                GeoPoint::new(1.0, 2.0),
                IncidentType::Hazard,
                Severity::Low,
                "Debris on road",
                0,
                15,
            ),
            Incident::new(
                IncidentId::from_seed(1),
                GeoPoint::new(3.0, 4.0),
                IncidentType::Accident,
                Severity::High,
                "Multi-vehicle collision",
                0,
                30,
            ),
        ];

        let mut heatmap = Heatmap::new();
        let points = heatmap.fill_from_incidents(&incidents);
        assert_eq!(points[0].intensity, 0.3);
        assert_eq!(points[1].intensity, 0.9);
    }

    #[test]
    fn test_update_point_out_of_range_is_noop() {
        let mut heatmap = Heatmap::new();
        heatmap.add_point(0.0, 0.0, 0.5);
        heatmap.update_point(0, 0.8);
        heatmap.update_point(5, 0.1);

        assert_eq!(heatmap.len(), 1);
        assert_eq!(heatmap.points[0].intensity, 0.8);
    }

    #[test]
    fn test_randomize_replaces_points() {
        let mut heatmap = Heatmap::new();
        heatmap.add_point(0.0, 0.0, 0.5);
        heatmap.randomize(&ThreadRandom, GeoPoint::new(0.0, 0.0), 10, DEFAULT_SPREAD_DEG);
        assert_eq!(heatmap.len(), 10);
    }

    #[test]
    fn test_default_style_and_legend() {
        let heatmap = Heatmap::new();
        assert_eq!(heatmap.style.radius, 25);
        assert_eq!(heatmap.style.gradient.len(), 4);
        assert_eq!(traffic_legend().len(), 4);
    }
}

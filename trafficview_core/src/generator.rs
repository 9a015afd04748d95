//! Synthetic traffic data.
//!
//! Every random draw goes through the generator's [`RandomSource`], so a
//! seeded or scripted source reproduces routes, incidents and heatmaps
//! exactly.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;
use trafficview_env::{GeoPoint, HeatmapPoint, RandomSource, TrafficContext};

use crate::config::AppConfig;
use crate::heatmap::{sample_points, DEFAULT_SPREAD_DEG};
use crate::incident::{Incident, IncidentId, IncidentType, Severity};
use crate::live::LiveUpdates;
use crate::prediction::{Prediction, PredictionType};
use crate::route::Route;

/// Default center of generated data.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(40.7128, -74.0060);

/// Default number of traffic updates kept in history.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Half-width (degrees) of the jitter applied to searched destinations.
const DESTINATION_JITTER_DEG: f64 = 0.005;

/// Half-width (degrees) of the box around the reference for ad-hoc incidents.
const INCIDENT_JITTER_DEG: f64 = 0.01;

const SYNTHETIC_TYPES: [IncidentType; 3] =
    [IncidentType::Accident, IncidentType::Congestion, IncidentType::Hazard];

const SYNTHETIC_SEVERITIES: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

const SYNTHETIC_DESCRIPTIONS: [&str; 3] =
    ["New incident reported", "Traffic building up", "Road hazard detected"];

/// One live traffic sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficUpdate {
    /// Current speed, 25 - 44 mph
    pub speed_mph: u32,

    /// Road capacity in use, 50 - 89 %
    pub capacity_pct: u32,

    /// Incidents reported in this sample, 0 - 4
    pub incident_count: u32,

    pub timestamp_ms: u64,
}

/// Produces mock incidents, routes, heatmaps, predictions and live updates.
pub struct TrafficDataGenerator {
    rng: Arc<dyn RandomSource>,
    center: GeoPoint,
    spread_deg: f64,
    history_limit: usize,
    history: Mutex<VecDeque<TrafficUpdate>>,

    /// Sequence for deterministic incident ids
    next_incident: AtomicU64,

    live: LiveUpdates,
}

impl TrafficDataGenerator {
    /// Creates a generator around the default center.
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            rng,
            center: DEFAULT_CENTER,
            spread_deg: DEFAULT_SPREAD_DEG,
            history_limit: DEFAULT_HISTORY_LIMIT,
            history: Mutex::new(VecDeque::new()),
            next_incident: AtomicU64::new(0),
            live: LiveUpdates::new(),
        }
    }

    /// Creates a generator using the center, spread and history limit of `config`.
    pub fn from_config(rng: Arc<dyn RandomSource>, config: &AppConfig) -> Self {
        Self::new(rng)
            .with_center(config.map_center)
            .with_spread(config.heatmap_spread_deg)
            .with_history_limit(config.update_history_limit)
    }

    pub fn with_center(mut self, center: GeoPoint) -> Self {
        self.center = center;
        self
    }

    pub fn with_spread(mut self, spread_deg: f64) -> Self {
        self.spread_deg = spread_deg;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    /// The random source shared with callers that draw alongside the generator.
    pub fn rng(&self) -> &dyn RandomSource {
        self.rng.as_ref()
    }

    fn incident_id(&self) -> IncidentId {
        IncidentId::from_seed(self.next_incident.fetch_add(1, Ordering::Relaxed))
    }

    /// The fixed catalog of four incidents around lower Manhattan.
    pub fn generate_incidents(&self, now_ms: u64) -> Vec<Incident> {
        let catalog = [
            (
                GeoPoint::new(40.7128, -74.0060),
                IncidentType::Accident,
                Severity::High,
                "Multi-vehicle collision",
                30,
            ),
            (
                GeoPoint::new(40.7214, -74.01),
                IncidentType::Construction,
                Severity::Medium,
                "Road work",
                45,
            ),
            (
                GeoPoint::new(40.705, -74.015),
                IncidentType::Congestion,
                Severity::High,
                "Heavy traffic",
                20,
            ),
            (
                GeoPoint::new(40.715, -74.02),
                IncidentType::Hazard,
                Severity::Low,
                "Debris on road",
                15,
            ),
        ];

        catalog
            .into_iter()
            .map(|(position, kind, severity, description, clearance)| {
                Incident::new(
                    self.incident_id(),
                    position,
                    kind,
                    severity,
                    description,
                    now_ms,
                    clearance,
                )
            })
            .collect()
    }

    /// The fixed route shown on first load.
    pub fn mock_route(&self, now_ms: u64) -> Route {
        Route {
            id: "route-1".to_string(),
            name: "Main Route".to_string(),
            start: GeoPoint::new(40.705, -74.015),
            end: GeoPoint::new(40.725, -73.995),
            waypoints: vec![
                GeoPoint::new(40.71, -74.01),
                GeoPoint::new(40.715, -74.005),
                GeoPoint::new(40.72, -74.00),
            ],
            distance_miles: 8.2,
            estimated_time_min: 22.0,
            traffic_impact_min: 12.0,
            efficiency: 94.0,
            congestion_levels: Vec::new(),
            alternatives: Vec::new(),
            created_at_ms: now_ms,
        }
    }

    /// A random route from `start` to a point near `destination`.
    ///
    /// Draw order: end latitude, end longitude, distance, estimated time,
    /// traffic impact, efficiency.
    pub fn generate_route(
        &self,
        start: GeoPoint,
        destination: GeoPoint,
        name: impl Into<String>,
        now_ms: u64,
    ) -> Route {
        let rng = self.rng();
        let end = destination.offset(
            rng.jitter(DESTINATION_JITTER_DEG),
            rng.jitter(DESTINATION_JITTER_DEG),
        );
        let distance_miles = (rng.uniform(5.0, 10.0) * 10.0).round() / 10.0;
        let estimated_time_min = rng.int_range(15, 35) as f64;
        let traffic_impact_min = rng.int_range(5, 15) as f64;
        let efficiency = rng.int_range(80, 100) as f64;

        Route {
            id: format!("route-{}", now_ms),
            name: name.into(),
            start,
            end,
            waypoints: interpolate(start, end, 3),
            distance_miles,
            estimated_time_min,
            traffic_impact_min,
            efficiency,
            congestion_levels: Vec::new(),
            alternatives: Vec::new(),
            created_at_ms: now_ms,
        }
    }

    /// A copy of `route` with figures nudged to reflect current traffic.
    ///
    /// Estimated time moves by up to ±2 min (floor 15), traffic impact by
    /// up to ±1.5 min (floor 5), efficiency by up to ±5 (clamped to 70 - 99).
    /// The copy keeps the route's id and geometry but is stamped `now_ms`.
    pub fn perturb_route(&self, route: &Route, now_ms: u64) -> Route {
        let rng = self.rng();
        let estimated_time_min = (route.estimated_time_min + rng.next_f64() * 4.0 - 2.0).max(15.0);
        let traffic_impact_min = (route.traffic_impact_min + rng.next_f64() * 3.0 - 1.5).max(5.0);
        let efficiency = (route.efficiency + rng.next_f64() * 10.0 - 5.0).clamp(70.0, 99.0);

        Route {
            estimated_time_min,
            traffic_impact_min,
            efficiency,
            created_at_ms: now_ms,
            ..route.clone()
        }
    }

    /// A fresh random heatmap sample around `center`.
    pub fn generate_heatmap(&self, center: GeoPoint, count: usize) -> Vec<HeatmapPoint> {
        sample_points(self.rng(), center, count, self.spread_deg)
    }

    /// The fixed catalog of three predictions.
    pub fn generate_predictions(&self) -> Vec<Prediction> {
        vec![
            Prediction::new(
                "pred-1",
                PredictionType::PeakTraffic,
                "Peak Traffic Starts",
                "In 45 minutes",
                "17:30",
                "",
            ),
            Prediction::new(
                "pred-2",
                PredictionType::AccidentClearance,
                "Accident Clearance",
                "Estimated time",
                "22",
                "min",
            ),
            Prediction::new(
                "pred-3",
                PredictionType::EcoScore,
                "Eco Score",
                "Better than 85%",
                "A+",
                "",
            ),
        ]
    }

    /// Draws one live sample and appends it to the history.
    pub fn tick(&self, now_ms: u64) -> TrafficUpdate {
        let rng = self.rng();
        let update = TrafficUpdate {
            speed_mph: rng.int_range(25, 45),
            capacity_pct: rng.int_range(50, 90),
            incident_count: rng.int_range(0, 5),
            timestamp_ms: now_ms,
        };

        let mut history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        history.push_back(update);
        while history.len() > self.history_limit {
            history.pop_front();
        }

        update
    }

    /// Most recent traffic updates, oldest first.
    pub fn recent_updates(&self) -> Vec<TrafficUpdate> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .copied()
            .collect()
    }

    /// An ad-hoc incident within ±0.01° of `reference`.
    pub fn synthesize_incident(&self, reference: GeoPoint, now_ms: u64) -> Incident {
        let rng = self.rng();
        let position = reference.offset(
            rng.jitter(INCIDENT_JITTER_DEG),
            rng.jitter(INCIDENT_JITTER_DEG),
        );
        let kind = SYNTHETIC_TYPES[rng.index(SYNTHETIC_TYPES.len())];
        let severity = SYNTHETIC_SEVERITIES[rng.index(SYNTHETIC_SEVERITIES.len())];
        let description = SYNTHETIC_DESCRIPTIONS[rng.index(SYNTHETIC_DESCRIPTIONS.len())];
        let clearance = rng.int_range(10, 40);

        debug!(kind = kind.name(), severity = severity.name(), "Synthesized incident");
        Incident::new(
            self.incident_id(),
            position,
            kind,
            severity,
            description,
            now_ms,
            clearance,
        )
    }

    /// Starts the live-update timer; `on_update` receives each sample.
    ///
    /// Returns false if the timer is already running.
    pub fn start_live_updates<Ctx, F>(
        self: &Arc<Self>,
        ctx: Arc<Ctx>,
        interval: Duration,
        mut on_update: F,
    ) -> bool
    where
        Ctx: TrafficContext,
        F: FnMut(TrafficUpdate) -> ControlFlow<()> + Send + 'static,
    {
        let generator = Arc::clone(self);
        self.live.start(ctx, interval, move |ctx: &Ctx| {
            let update = generator.tick(ctx.now_ms());
            on_update(update)
        })
    }

    pub fn stop_live_updates(&self) {
        self.live.stop();
    }

    pub fn live_updates(&self) -> &LiveUpdates {
        &self.live
    }
}

/// `count` points evenly spaced strictly between `start` and `end`.
fn interpolate(start: GeoPoint, end: GeoPoint, count: usize) -> Vec<GeoPoint> {
    let steps = (count + 1) as f64;
    (1..=count)
        .map(|i| {
            let t = i as f64 / steps;
            GeoPoint::new(
                start.latitude + (end.latitude - start.latitude) * t,
                start.longitude + (end.longitude - start.longitude) * t,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use trafficview_env::{SequenceRandom, ThreadRandom, TokioContext};

    fn generator(values: Vec<f64>) -> TrafficDataGenerator {
        TrafficDataGenerator::new(Arc::new(SequenceRandom::new(values)))
    }

    #[test]
    fn test_fixed_catalogs() {
        let gen = TrafficDataGenerator::new(Arc::new(ThreadRandom));
        let incidents = gen.generate_incidents(0);
        assert_eq!(incidents.len(), 4);
        assert_eq!(incidents[0].description, "Multi-vehicle collision");
        assert_eq!(incidents[3].severity, Severity::Low);
        assert_ne!(incidents[0].id, incidents[1].id);

        let route = gen.mock_route(0);
        assert_eq!(route.waypoints.len(), 3);
        assert_eq!(route.total_time(), 34.0);

        let predictions = gen.generate_predictions();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[2].value, "A+");
    }

    #[test]
    fn test_generate_heatmap_bounds() {
        let gen = TrafficDataGenerator::new(Arc::new(ThreadRandom));
        let points = gen.generate_heatmap(GeoPoint::new(0.0, 0.0), 50);
        assert_eq!(points.len(), 50);
        for p in points {
            assert!(p.latitude.abs() <= 0.025);
            assert!(p.longitude.abs() <= 0.025);
            assert!((0.2..=1.0).contains(&p.intensity));
        }
    }

    #[test]
    fn test_generate_route_draws() {
        // lat jitter, lon jitter, distance, time, impact, efficiency
        let gen = generator(vec![0.5, 0.5, 0.5, 0.0, 0.0, 0.0]);
        let start = GeoPoint::new(40.705, -74.015);
        let route = gen.generate_route(start, GeoPoint::new(40.725, -73.995), "To Brooklyn", 7);

        assert_eq!(route.name, "To Brooklyn");
        assert_eq!(route.id, "route-7");
        assert_relative_eq!(route.end.latitude, 40.725);
        assert_relative_eq!(route.distance_miles, 7.5);
        assert_eq!(route.estimated_time_min, 15.0);
        assert_eq!(route.traffic_impact_min, 5.0);
        assert_eq!(route.efficiency, 80.0);
        assert_eq!(route.waypoints.len(), 3);
        assert_relative_eq!(route.waypoints[1].latitude, 40.715, epsilon = 1e-9);
    }

    #[test]
    fn test_generate_route_ranges() {
        let gen = TrafficDataGenerator::new(Arc::new(ThreadRandom));
        for _ in 0..200 {
            let r = gen.generate_route(DEFAULT_CENTER, DEFAULT_CENTER, "x", 0);
            assert!((5.0..=10.0).contains(&r.distance_miles));
            assert!((15.0..35.0).contains(&r.estimated_time_min));
            assert!((5.0..15.0).contains(&r.traffic_impact_min));
            assert!((80.0..100.0).contains(&r.efficiency));
            assert!((r.end.latitude - DEFAULT_CENTER.latitude).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn test_perturb_route_clamps() {
        let low = generator(vec![0.0]);
        let mut route = low.mock_route(0);
        route.estimated_time_min = 15.5;
        route.traffic_impact_min = 5.2;
        route.efficiency = 72.0;

        let nudged = low.perturb_route(&route, 5_000);
        assert_eq!(nudged.estimated_time_min, 15.0);
        assert_eq!(nudged.traffic_impact_min, 5.0);
        assert_eq!(nudged.efficiency, 70.0);
        assert_eq!(nudged.id, route.id);
        assert_eq!(nudged.waypoints, route.waypoints);
        assert_eq!(route.created_at_ms, 0);
        assert_eq!(nudged.created_at_ms, 5_000);

        let high = generator(vec![0.999_999]);
        route.efficiency = 98.0;
        assert_relative_eq!(high.perturb_route(&route, 5_000).efficiency, 99.0);
    }

    #[test]
    fn test_tick_ranges_and_history_limit() {
        let gen = TrafficDataGenerator::new(Arc::new(ThreadRandom)).with_history_limit(5);
        for i in 0..20 {
            let update = gen.tick(i);
            assert!((25..45).contains(&update.speed_mph));
            assert!((50..90).contains(&update.capacity_pct));
            assert!(update.incident_count < 5);
        }

        let history = gen.recent_updates();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].timestamp_ms, 15);
        assert_eq!(history[4].timestamp_ms, 19);
    }

    #[test]
    fn test_synthesize_incident() {
        // lat, lon, type, severity, description, clearance
        let gen = generator(vec![0.0, 0.999_999, 0.5, 0.999_999, 0.0, 0.0]);
        let incident = gen.synthesize_incident(DEFAULT_CENTER, 0);

        assert_relative_eq!(incident.latitude, 40.7028, epsilon = 1e-9);
        assert_relative_eq!(incident.longitude, -73.9960, epsilon = 1e-5);
        assert_eq!(incident.kind, IncidentType::Congestion);
        assert_eq!(incident.severity, Severity::High);
        assert_eq!(incident.description, "New incident reported");
        assert_eq!(incident.expected_clearance_min, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_updates_feed_history() {
        let ctx = TokioContext::shared();
        let gen = Arc::new(TrafficDataGenerator::new(Arc::new(ThreadRandom)));
        let seen = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seen);

        assert!(gen.start_live_updates(ctx, Duration::from_secs(10), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        }));
        tokio::time::sleep(Duration::from_secs(25)).await;
        gen.stop_live_updates();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(gen.recent_updates().len(), 2);
    }
}

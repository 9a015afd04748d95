//! Application orchestration.
//!
//! [`NavigationApp`] is the only stateful part of the core. It turns
//! generator output into render instructions and user intents into state
//! transitions. State sits behind a mutex that is never held across an
//! await, so asynchronous operations (search, recalculation, location
//! requests) can overlap freely.
//!
//! Search and recalculation share one route-generation counter: a
//! completion is applied only if no newer route request was issued while
//! it was pending.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use trafficview_env::{
    Color, ControlId, Dashboard, GeoPoint, LayerId, MapView, MarkerDescriptor, MarkerShape,
    RandomSource, SpeedStats, TrafficContext,
};

use crate::config::AppConfig;
use crate::error::NavError;
use crate::generator::{TrafficDataGenerator, TrafficUpdate};
use crate::heatmap::traffic_legend;
use crate::prediction::Prediction;
use crate::preferences::{PreferenceKey, RouteType, UserPreferences};
use crate::route::Route;
use crate::state::{AppState, NavigationState};

const SUPERSEDED_INSIGHT: &str = "Earlier route request superseded.";

/// Header features that are not implemented yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    SavedRoutes,
    Settings,
    UserProfile,
}

impl Feature {
    pub fn placeholder_message(&self) -> &'static str {
        match self {
            Feature::SavedRoutes => "Saved routes feature coming soon!",
            Feature::Settings => "Settings panel coming soon!",
            Feature::UserProfile => "User profile coming soon!",
        }
    }
}

/// The navigation front-end core.
pub struct NavigationApp<Ctx, V, U> {
    ctx: Arc<Ctx>,
    map: Arc<V>,
    ui: Arc<U>,
    config: AppConfig,
    generator: Arc<TrafficDataGenerator>,
    state: Mutex<AppState>,
}

impl<Ctx, V, U> NavigationApp<Ctx, V, U>
where
    Ctx: TrafficContext,
    V: MapView,
    U: Dashboard,
{
    /// Creates an app. Nothing is rendered until [`start`](Self::start) or
    /// [`load_initial`](Self::load_initial).
    pub fn new(
        ctx: Arc<Ctx>,
        map: Arc<V>,
        ui: Arc<U>,
        rng: Arc<dyn RandomSource>,
        config: AppConfig,
    ) -> Self {
        let generator = Arc::new(TrafficDataGenerator::from_config(rng, &config));
        Self {
            ctx,
            map,
            ui,
            config,
            generator,
            state: Mutex::new(AppState::default()),
        }
    }

    /// Creates an Arc-wrapped app, as needed by [`start`](Self::start).
    pub fn shared(
        ctx: Arc<Ctx>,
        map: Arc<V>,
        ui: Arc<U>,
        rng: Arc<dyn RandomSource>,
        config: AppConfig,
    ) -> Arc<Self> {
        Arc::new(Self::new(ctx, map, ui, rng, config))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn generator(&self) -> &Arc<TrafficDataGenerator> {
        &self.generator
    }

    /// Copy of the full state.
    pub fn snapshot(&self) -> AppState {
        self.state().clone()
    }

    pub fn current_route(&self) -> Option<Route> {
        self.state().current_route.clone()
    }

    pub fn user_location(&self) -> Option<GeoPoint> {
        self.state().user_location
    }

    pub fn navigation(&self) -> NavigationState {
        self.state().navigation
    }

    pub fn heatmap_visible(&self) -> bool {
        self.state().heatmap_visible
    }

    pub fn incidents_visible(&self) -> bool {
        self.state().incidents_visible
    }

    pub fn preferences(&self) -> UserPreferences {
        self.state().preferences.clone()
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        self.state().predictions.clone()
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insight(&self, message: &str) {
        self.ui.display_insight(message, self.config.insight_duration());
    }

    fn rng(&self) -> &dyn RandomSource {
        self.generator.rng()
    }

    /// `base` plus a uniform share of the configured latency jitter.
    fn latency(&self, base: Duration) -> Duration {
        let jitter = self.config.latency_jitter();
        if jitter.is_zero() {
            base
        } else {
            base + jitter.mul_f64(self.rng().next_f64())
        }
    }

    // ───────────────────────────── Lifecycle ─────────────────────────────

    /// Initializes the map, loads initial data, shows the legend and starts
    /// live updates.
    ///
    /// Returns false, doing nothing, if the app is already running.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.generator.live_updates().is_running() {
            debug!("Navigation app already started");
            return false;
        }
        info!(seed = self.ctx.seed(), "Starting navigation app");

        self.map.initialize_map(self.config.map_center, self.config.zoom);
        self.load_initial();
        self.ui.display_legend(&traffic_legend());

        let app = Arc::downgrade(self);
        self.generator.start_live_updates(
            Arc::clone(&self.ctx),
            self.config.live_update_interval(),
            move |update| match app.upgrade() {
                Some(app) => {
                    app.on_traffic_tick(update);
                    ControlFlow::Continue(())
                }
                None => ControlFlow::Break(()),
            },
        )
    }

    /// Stops live updates. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.generator.stop_live_updates();
        info!("Navigation app shut down");
    }

    /// Loads incidents, the initial route, predictions, the heatmap and the
    /// initial speed figures. Calling it again is a full reload.
    pub fn load_initial(&self) {
        let now_ms = self.ctx.now_ms();

        let incidents = self.generator.generate_incidents(now_ms);
        let route = self.generator.mock_route(now_ms);
        let predictions = self.generator.generate_predictions();
        let points = self
            .generator
            .generate_heatmap(self.generator.center(), self.config.heatmap_points);

        let style = {
            let mut state = self.state();
            state.incidents = incidents.clone();
            state.current_route = Some(route.clone());
            state.predictions = predictions.clone();
            state.heatmap.points = points.clone();
            state.heatmap_rendered = true;
            // Pending searches must not overwrite the reloaded route
            state.next_route_generation();
            state.heatmap.style.clone()
        };

        self.map.clear_incident_markers();
        for incident in &incidents {
            self.map.render_incident_marker(&incident.marker(now_ms));
        }

        self.map.render_route(&route.descriptor());
        self.ui.display_route_stats(&route.stats());

        let cards: Vec<_> = predictions.iter().map(Prediction::card).collect();
        self.ui.display_predictions(&cards);

        self.map.render_heatmap(&points, &style);
        self.ui.display_speed_stats(&self.config.initial_speed);

        info!(
            incidents = incidents.len(),
            heatmap_points = points.len(),
            route = %route.name,
            "Initial data loaded"
        );
    }

    // ──────────────────────────── Route requests ─────────────────────────

    /// Searches for a route to `query`.
    ///
    /// The prior route is kept on any error. Superseded results return
    /// [`NavError::StaleAsyncResult`] and leave state and the map untouched.
    pub async fn search(&self, query: &str) -> Result<Route, NavError> {
        let query = query.trim();
        if query.is_empty() {
            self.insight("Please enter a destination to search.");
            return Err(NavError::EmptyQuery);
        }

        self.insight(&format!("Searching for optimal route to \"{}\"...", query));
        let generation = self.state().next_route_generation();
        debug!(generation, query, "Search issued");

        let latency = self.latency(self.config.search_latency());
        self.ctx.sleep(latency).await;

        let outcome = {
            let mut state = self.state();
            if !state.is_current_generation(generation) {
                Err(NavError::stale(generation, state.route_generation))
            } else if self.config.search_failure_rate > 0.0
                && self.rng().next_f64() < self.config.search_failure_rate
            {
                Err(NavError::SearchFailed(query.to_string()))
            } else {
                let start = state.user_location.unwrap_or(self.config.default_start);
                let route = self.generator.generate_route(
                    start,
                    self.config.default_destination,
                    format!("To {}", query),
                    self.ctx.now_ms(),
                );
                state.current_route = Some(route.clone());
                Ok(route)
            }
        };

        match outcome {
            Ok(route) => {
                self.map.render_route(&route.descriptor());
                self.ui.display_route_stats(&route.stats());
                let saved = self.rng().int_range(5, 15);
                self.insight(&format!(
                    "Found route that saves {} minutes vs standard route",
                    saved
                ));
                info!(generation, route = %route.name, "Search result applied");
                Ok(route)
            }
            Err(e) if e.is_stale() => {
                debug!(generation, query, "Search result discarded: {}", e);
                self.insight(SUPERSEDED_INSIGHT);
                Err(e)
            }
            Err(e) => {
                warn!(generation, query, "Search failed: {}", e);
                self.insight(&format!(
                    "Unable to find a route to \"{}\". Keeping current route.",
                    query
                ));
                Err(e)
            }
        }
    }

    /// Recalculates the current route against simulated live traffic.
    pub async fn recalculate(&self) -> Result<Route, NavError> {
        let generation = {
            let mut state = self.state();
            if state.current_route.is_none() {
                None
            } else {
                Some(state.next_route_generation())
            }
        };

        let Some(generation) = generation else {
            warn!("Recalculation requested without an active route");
            self.insight("No active route to recalculate.");
            return Err(NavError::NoActiveRoute);
        };

        self.insight("Recalculating route based on current traffic...");
        debug!(generation, "Recalculation issued");

        let latency = self.latency(self.config.recalculate_latency());
        self.ctx.sleep(latency).await;

        let outcome = {
            let mut state = self.state();
            if !state.is_current_generation(generation) {
                Err(NavError::stale(generation, state.route_generation))
            } else {
                match &state.current_route {
                    Some(current) => {
                        let route = self.generator.perturb_route(current, self.ctx.now_ms());
                        state.current_route = Some(route.clone());
                        Ok(route)
                    }
                    None => Err(NavError::NoActiveRoute),
                }
            }
        };

        match outcome {
            Ok(route) => {
                self.ui.display_route_stats(&route.stats());
                let saved = self.rng().int_range(1, 6);
                self.insight(&format!("Route updated! Saved {} minutes.", saved));
                info!(
                    generation,
                    estimated_time_min = route.estimated_time_min,
                    efficiency = route.efficiency,
                    "Route recalculated"
                );
                Ok(route)
            }
            Err(e) if e.is_stale() => {
                debug!(generation, "Recalculation discarded: {}", e);
                self.insight(SUPERSEDED_INSIGHT);
                Err(e)
            }
            Err(e) => {
                warn!(generation, "Recalculation failed: {}", e);
                self.insight("No active route to recalculate.");
                Err(e)
            }
        }
    }

    // ─────────────────────────────── Toggles ─────────────────────────────

    /// Flips heatmap visibility and returns the new flag.
    pub fn toggle_heatmap_visibility(&self) -> bool {
        let visible = {
            let mut state = self.state();
            state.heatmap_visible = !state.heatmap_visible;
            let flag = state.heatmap_visible;
            state.preferences.set(PreferenceKey::ShowHeatmap, flag);
            state.heatmap_visible
        };
        self.map.set_layer_visible(LayerId::Heatmap, visible);
        self.ui.set_control_active(ControlId::HeatmapToggle, visible);
        info!(visible, "Heatmap visibility toggled");
        visible
    }

    /// Flips incident visibility and returns the new flag.
    pub fn toggle_incidents_visibility(&self) -> bool {
        let visible = {
            let mut state = self.state();
            state.incidents_visible = !state.incidents_visible;
            let flag = state.incidents_visible;
            state.preferences.set(PreferenceKey::ShowIncidents, flag);
            state.incidents_visible
        };
        self.map.set_layer_visible(LayerId::Incidents, visible);
        self.ui.set_control_active(ControlId::TrafficToggle, visible);
        info!(visible, "Incident visibility toggled");
        visible
    }

    /// Starts or stops navigation.
    pub fn toggle_navigation(&self) -> NavigationState {
        let navigation = {
            let mut state = self.state();
            state.navigation = state.navigation.toggled();
            state.navigation
        };

        self.ui
            .set_control_active(ControlId::StartNavigation, navigation.is_navigating());
        match navigation {
            NavigationState::Navigating => {
                self.insight("Navigation started! Turn-by-turn guidance activated.")
            }
            NavigationState::Idle => self.insight("Navigation stopped."),
        }
        info!(?navigation, "Navigation toggled");
        navigation
    }

    // ──────────────────────────── Geolocation ────────────────────────────

    /// Asks the view for the user's position.
    ///
    /// On failure the previous location is kept.
    pub async fn locate(&self) -> Result<GeoPoint, NavError> {
        match self.map.request_user_location().await {
            Ok(position) => {
                self.state().user_location = Some(position);
                self.map.render_user_location(&user_marker(position));
                self.insight("Location found! Updating route from your position...");
                info!(%position, "User located");
                Ok(position)
            }
            Err(e) => {
                warn!("Geolocation error: {}", e);
                self.insight("Unable to get location. Please check permissions.");
                Err(NavError::Geolocation(e))
            }
        }
    }

    // ─────────────────────────── Live traffic ────────────────────────────

    /// Applies one live traffic sample.
    ///
    /// Speed figures and the heatmap refresh on every tick. When the sample
    /// reports incidents, one in roughly three ticks also surfaces an ad-hoc
    /// incident near the map center.
    pub fn on_traffic_tick(&self, update: TrafficUpdate) {
        let now_ms = self.ctx.now_ms();
        let rng = self.rng();

        let average = update.speed_mph.saturating_sub(rng.int_range(0, 10));
        self.ui.display_speed_stats(&SpeedStats {
            current_mph: update.speed_mph,
            average_mph: average,
            capacity_pct: update.capacity_pct,
        });

        if update.incident_count > 0 && rng.next_f64() > self.config.incident_alert_threshold {
            let incident = self.generator.synthesize_incident(self.generator.center(), now_ms);
            let alerts_enabled = {
                let mut state = self.state();
                state.record_incident(incident.clone(), self.config.incident_history_limit);
                state.preferences.get(PreferenceKey::IncidentAlerts)
            };
            if alerts_enabled {
                self.ui
                    .display_incident_alert(&incident.alert(), self.config.alert_duration());
            }
            self.map.render_incident_marker(&incident.marker(now_ms));
            info!(
                id = %incident.id,
                kind = incident.kind.name(),
                severity = incident.severity.name(),
                "Incident reported"
            );
        }

        let points = self
            .generator
            .generate_heatmap(self.generator.center(), self.config.heatmap_points);
        let (first_render, style) = {
            let mut state = self.state();
            state.heatmap.points = points.clone();
            let first = !state.heatmap_rendered;
            state.heatmap_rendered = true;
            (first, state.heatmap.style.clone())
        };
        if first_render {
            self.map.render_heatmap(&points, &style);
        } else {
            self.map.update_heatmap(&points);
        }

        debug!(
            speed = update.speed_mph,
            capacity = update.capacity_pct,
            incidents = update.incident_count,
            "Traffic tick applied"
        );
    }

    // ─────────────────────────── Preferences ─────────────────────────────

    pub fn show_feature_placeholder(&self, feature: Feature) {
        self.insight(feature.placeholder_message());
    }

    pub fn set_preferred_route_type(&self, route_type: RouteType) {
        self.state().preferences.preferred_route_type = route_type;
        info!(?route_type, "Preferred route type set");
    }

    /// Flips a boolean preference by name and returns its new value.
    ///
    /// Visibility preferences go through the layer toggles so the map stays
    /// in sync.
    pub fn toggle_preference(&self, key: &str) -> Result<bool, NavError> {
        let key: PreferenceKey = key.parse().map_err(NavError::UnknownPreference)?;
        let value = match key {
            PreferenceKey::ShowHeatmap => self.toggle_heatmap_visibility(),
            PreferenceKey::ShowIncidents => self.toggle_incidents_visibility(),
            other => self.state().preferences.toggle(other),
        };
        debug!(?key, value, "Preference toggled");
        Ok(value)
    }
}

fn user_marker(position: GeoPoint) -> MarkerDescriptor {
    MarkerDescriptor {
        position,
        shape: MarkerShape::Pulse,
        color: Color::Primary,
        icon: None,
        label: "Your location".to_string(),
        detail: Vec::new(),
        size_px: 20,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use trafficview_env::{
        DashboardCommand, EnvError, HeadlessDashboard, HeadlessMap, MapCommand, SequenceRandom,
        ThreadRandom, TokioContext,
    };

    type TestApp = NavigationApp<TokioContext, HeadlessMap, HeadlessDashboard>;

    struct Harness {
        app: Arc<TestApp>,
        map: Arc<HeadlessMap>,
        ui: Arc<HeadlessDashboard>,
    }

    fn harness_with(rng: Arc<dyn RandomSource>, config: AppConfig, map: HeadlessMap) -> Harness {
        let map = Arc::new(map);
        let ui = Arc::new(HeadlessDashboard::new());
        let app = TestApp::shared(
            TokioContext::shared(),
            Arc::clone(&map),
            Arc::clone(&ui),
            rng,
            config,
        );
        Harness { app, map, ui }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(ThreadRandom), AppConfig::default(), HeadlessMap::new())
    }

    fn speed_stats_count(ui: &HeadlessDashboard) -> usize {
        ui.commands()
            .iter()
            .filter(|c| matches!(c, DashboardCommand::SpeedStats { .. }))
            .count()
    }

    fn update(incident_count: u32) -> TrafficUpdate {
        TrafficUpdate {
            speed_mph: 40,
            capacity_pct: 70,
            incident_count,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_load_initial_end_to_end() {
        let h = harness();
        h.app.load_initial();

        let route = h.app.current_route().expect("route loaded");
        assert_eq!(route.name, "Main Route");
        assert_eq!(h.map.incident_marker_count(), 4);
        assert_eq!(h.map.last_heatmap_len(), Some(200));
        assert_eq!(h.map.last_route_name().as_deref(), Some("Main Route"));
        assert_eq!(h.app.predictions().len(), 3);

        let speed = h.ui.last_speed_stats().unwrap();
        assert_eq!((speed.current_mph, speed.average_mph, speed.capacity_pct), (42, 28, 68));
        assert_eq!(h.ui.last_route_stats().unwrap().grade, "A+");
    }

    #[test]
    fn test_reload_clears_prior_markers() {
        let h = harness();
        h.app.load_initial();
        h.app.load_initial();

        assert_eq!(h.map.incident_marker_count(), 4);
        assert_eq!(h.app.snapshot().incidents.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recalculate_without_route() {
        let h = harness();
        let before = h.app.snapshot();

        assert_eq!(h.app.recalculate().await, Err(NavError::NoActiveRoute));

        let after = h.app.snapshot();
        assert!(after.current_route.is_none());
        assert_eq!(after.route_generation, before.route_generation);
        assert_eq!(h.ui.last_insight().as_deref(), Some("No active route to recalculate."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recalculate_perturbs_route() {
        let h = harness_with(
            Arc::new(SequenceRandom::constant(0.0)),
            AppConfig::default(),
            HeadlessMap::new(),
        );
        h.app.load_initial();

        let route = h.app.recalculate().await.unwrap();
        assert_relative_eq!(route.estimated_time_min, 20.0);
        assert_relative_eq!(route.traffic_impact_min, 10.5);
        assert_relative_eq!(route.efficiency, 89.0);
        assert_eq!(route.id, "route-1");
        assert_eq!(h.app.current_route(), Some(route));
        assert_eq!(h.ui.last_insight().as_deref(), Some("Route updated! Saved 1 minutes."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_replaces_route() {
        let h = harness();
        h.app.load_initial();

        let route = h.app.search("  Brooklyn ").await.unwrap();
        assert_eq!(route.name, "To Brooklyn");
        assert_eq!(route.start, h.app.config().default_start);
        assert_eq!(h.app.current_route().unwrap().name, "To Brooklyn");
        assert_eq!(h.map.last_route_name().as_deref(), Some("To Brooklyn"));

        let insights = h.ui.insights();
        assert_eq!(insights[0], "Searching for optimal route to \"Brooklyn\"...");
        assert!(insights[1].starts_with("Found route that saves"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_race_latest_wins() {
        let h = harness();
        h.app.load_initial();

        let (a, b) = tokio::join!(h.app.search("A"), h.app.search("B"));

        assert!(a.unwrap_err().is_stale());
        assert_eq!(b.unwrap().name, "To B");
        assert_eq!(h.app.current_route().unwrap().name, "To B");
        assert_eq!(h.map.route_render_count(), 2);

        let superseded = h.ui.insights().iter().filter(|m| *m == SUPERSEDED_INSIGHT).count();
        assert_eq!(superseded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_race_stale_completes_last() {
        // A sleeps 1.5s + 0.9s, B sleeps 1.5s + 0.1s: B resolves first
        let config = AppConfig {
            latency_jitter_ms: 1_000,
            ..AppConfig::default()
        };
        let h = harness_with(
            Arc::new(SequenceRandom::new(vec![0.9, 0.1, 0.5])),
            config,
            HeadlessMap::new(),
        );
        h.app.load_initial();

        let (a, b) = tokio::join!(h.app.search("A"), h.app.search("B"));

        assert!(matches!(a, Err(NavError::StaleAsyncResult { .. })));
        assert!(b.is_ok());
        assert_eq!(h.app.current_route().unwrap().name, "To B");
        assert_eq!(h.map.last_route_name().as_deref(), Some("To B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recalculate_superseded_by_search() {
        let h = harness();
        h.app.load_initial();

        let (recalc, search) = tokio::join!(h.app.recalculate(), h.app.search("Queens"));

        assert!(recalc.unwrap_err().is_stale());
        assert_eq!(search.unwrap().name, "To Queens");
        assert!(h.ui.insights().iter().any(|m| m == SUPERSEDED_INSIGHT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_supersedes_pending_search() {
        let h = harness();
        h.app.load_initial();

        let reload = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            h.app.load_initial();
        };
        let (search, ()) = tokio::join!(h.app.search("X"), reload);

        assert!(matches!(search, Err(NavError::StaleAsyncResult { .. })));
        assert_eq!(h.app.current_route().unwrap().name, "Main Route");
        assert_eq!(h.map.last_route_name().as_deref(), Some("Main Route"));
        assert_eq!(h.ui.last_insight().as_deref(), Some(SUPERSEDED_INSIGHT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_empty_query() {
        let h = harness();
        h.app.load_initial();

        assert_eq!(h.app.search("   ").await, Err(NavError::EmptyQuery));
        assert_eq!(h.app.current_route().unwrap().name, "Main Route");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_keeps_route() {
        let config = AppConfig {
            search_failure_rate: 1.0,
            ..AppConfig::default()
        };
        let h = harness_with(Arc::new(ThreadRandom), config, HeadlessMap::new());
        h.app.load_initial();

        let result = h.app.search("Hoboken").await;
        assert_eq!(result, Err(NavError::SearchFailed("Hoboken".to_string())));
        assert_eq!(h.app.current_route().unwrap().name, "Main Route");
        assert_eq!(
            h.ui.last_insight().as_deref(),
            Some("Unable to find a route to \"Hoboken\". Keeping current route.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_starts_from_user_location() {
        let here = GeoPoint::new(40.73, -73.99);
        let h = harness_with(
            Arc::new(ThreadRandom),
            AppConfig::default(),
            HeadlessMap::new().with_location(Ok(here)),
        );
        h.app.load_initial();

        assert_eq!(h.app.locate().await, Ok(here));
        let route = h.app.search("Harlem").await.unwrap();
        assert_eq!(route.start, here);
    }

    #[test]
    fn test_heatmap_toggle_twice() {
        let h = harness();
        let original = h.app.heatmap_visible();

        assert!(!h.app.toggle_heatmap_visibility());
        assert_eq!(h.ui.control_state(ControlId::HeatmapToggle), Some(false));
        assert!(h.app.toggle_heatmap_visibility());

        assert_eq!(h.app.heatmap_visible(), original);
        assert_eq!(h.map.layer_toggle_count(LayerId::Heatmap), 2);
        assert_eq!(h.ui.control_state(ControlId::HeatmapToggle), Some(true));
    }

    #[test]
    fn test_incident_toggle_syncs_preference() {
        let h = harness();
        assert!(!h.app.toggle_incidents_visibility());

        assert!(!h.app.preferences().show_incidents);
        assert_eq!(h.map.layer_toggle_count(LayerId::Incidents), 1);
        assert_eq!(h.ui.control_state(ControlId::TrafficToggle), Some(false));
    }

    #[test]
    fn test_navigation_alternates() {
        let h = harness();

        assert_eq!(h.app.toggle_navigation(), NavigationState::Navigating);
        assert_eq!(
            h.ui.last_insight().as_deref(),
            Some("Navigation started! Turn-by-turn guidance activated.")
        );
        assert_eq!(h.ui.control_state(ControlId::StartNavigation), Some(true));

        assert_eq!(h.app.toggle_navigation(), NavigationState::Idle);
        assert_eq!(h.ui.last_insight().as_deref(), Some("Navigation stopped."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_success() {
        let here = GeoPoint::new(40.7, -74.0);
        let h = harness_with(
            Arc::new(ThreadRandom),
            AppConfig::default(),
            HeadlessMap::new()
                .with_location(Ok(here))
                .with_location_delay(Duration::from_millis(800)),
        );

        assert_eq!(h.app.locate().await, Ok(here));
        assert_eq!(h.app.user_location(), Some(here));
        assert!(h
            .map
            .commands()
            .iter()
            .any(|c| matches!(c, MapCommand::RenderUserLocation { .. })));
        assert_eq!(
            h.ui.last_insight().as_deref(),
            Some("Location found! Updating route from your position...")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_failure_keeps_location() {
        let here = GeoPoint::new(40.7, -74.0);
        let h = harness_with(
            Arc::new(ThreadRandom),
            AppConfig::default(),
            HeadlessMap::new().with_location(Ok(here)),
        );
        h.app.locate().await.unwrap();

        for error in [
            EnvError::GeolocationDenied,
            EnvError::GeolocationUnsupported,
            EnvError::Timeout(5_000),
        ] {
            h.map.set_location(Err(error.clone()));
            assert_eq!(h.app.locate().await, Err(NavError::Geolocation(error)));
            assert_eq!(h.app.user_location(), Some(here));
            assert_eq!(
                h.ui.last_insight().as_deref(),
                Some("Unable to get location. Please check permissions.")
            );
        }
    }

    #[test]
    fn test_tick_without_incidents() {
        let h = harness_with(
            Arc::new(SequenceRandom::constant(0.95)),
            AppConfig::default(),
            HeadlessMap::new(),
        );
        h.app.load_initial();
        h.app.on_traffic_tick(update(0));

        let speed = h.ui.last_speed_stats().unwrap();
        assert_eq!(speed.current_mph, 40);
        assert_eq!(speed.average_mph, 31);
        assert_eq!(speed.capacity_pct, 70);
        assert!(h.ui.alerts().is_empty());
        assert_eq!(h.map.incident_marker_count(), 4);
        assert!(matches!(
            h.map.commands().last(),
            Some(MapCommand::UpdateHeatmap { points: 200 })
        ));
    }

    #[test]
    fn test_tick_gate_below_threshold() {
        let h = harness_with(
            Arc::new(SequenceRandom::constant(0.5)),
            AppConfig::default(),
            HeadlessMap::new(),
        );
        h.app.load_initial();
        h.app.on_traffic_tick(update(3));

        assert!(h.ui.alerts().is_empty());
        assert_eq!(h.map.incident_marker_count(), 4);
    }

    #[test]
    fn test_tick_with_incident_alert() {
        let h = harness_with(
            Arc::new(SequenceRandom::constant(0.8)),
            AppConfig::default(),
            HeadlessMap::new(),
        );
        h.app.load_initial();
        h.app.on_traffic_tick(update(2));

        let alerts = h.ui.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].headline, "Road hazard detected");
        assert_eq!(h.map.incident_marker_count(), 5);
        assert_eq!(h.app.snapshot().incidents.len(), 5);
    }

    #[test]
    fn test_tick_incidents_bounded_by_history_limit() {
        let config = AppConfig {
            incident_history_limit: 6,
            ..AppConfig::default()
        };
        let h = harness_with(Arc::new(SequenceRandom::constant(0.8)), config, HeadlessMap::new());
        h.app.load_initial();
        let first = h.app.snapshot().incidents[0].id;

        for _ in 0..5 {
            h.app.on_traffic_tick(update(2));
        }

        let incidents = h.app.snapshot().incidents;
        assert_eq!(incidents.len(), 6);
        assert!(incidents.iter().all(|i| i.id != first));
        assert_eq!(h.map.incident_marker_count(), 9);
    }

    #[test]
    fn test_tick_respects_alert_preference() {
        let h = harness_with(
            Arc::new(SequenceRandom::constant(0.8)),
            AppConfig::default(),
            HeadlessMap::new(),
        );
        h.app.load_initial();
        assert_eq!(h.app.toggle_preference("incidentAlerts"), Ok(false));
        h.app.on_traffic_tick(update(2));

        assert!(h.ui.alerts().is_empty());
        assert_eq!(h.map.incident_marker_count(), 5);
    }

    #[test]
    fn test_first_tick_creates_heatmap() {
        let h = harness();
        h.app.on_traffic_tick(update(0));

        assert!(matches!(
            h.map.commands().last(),
            Some(MapCommand::RenderHeatmap { points: 200, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_live_updates() {
        let h = harness();

        assert!(h.app.start());
        assert!(!h.app.start());
        assert!(matches!(h.map.commands()[0], MapCommand::InitializeMap { zoom: 13, .. }));
        assert!(h
            .ui
            .commands()
            .iter()
            .any(|c| matches!(c, DashboardCommand::Legend { entries } if entries.len() == 4)));

        tokio::time::sleep(Duration::from_secs(25)).await;
        // Initial figures plus two ticks
        assert_eq!(speed_stats_count(&h.ui), 3);
        assert_eq!(h.app.generator().recent_updates().len(), 2);

        h.app.shutdown();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(speed_stats_count(&h.ui), 3);
    }

    #[test]
    fn test_feature_placeholders() {
        let h = harness();
        h.app.show_feature_placeholder(Feature::SavedRoutes);
        h.app.show_feature_placeholder(Feature::Settings);
        h.app.show_feature_placeholder(Feature::UserProfile);

        assert_eq!(
            h.ui.insights(),
            vec![
                "Saved routes feature coming soon!",
                "Settings panel coming soon!",
                "User profile coming soon!",
            ]
        );
    }

    #[test]
    fn test_preferences() {
        let h = harness();

        h.app.set_preferred_route_type(RouteType::Eco);
        assert_eq!(h.app.preferences().preferred_route_type, RouteType::Eco);

        assert_eq!(h.app.toggle_preference("avoid_tolls"), Ok(true));
        assert_eq!(
            h.app.toggle_preference("teleport"),
            Err(NavError::UnknownPreference("teleport".to_string()))
        );

        assert_eq!(h.app.toggle_preference("showHeatmap"), Ok(false));
        assert!(!h.app.heatmap_visible());
        assert_eq!(h.map.layer_toggle_count(LayerId::Heatmap), 1);
    }
}

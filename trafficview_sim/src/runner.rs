//! Scenario runner - drives the app through scripted sessions.

use crate::error::SimError;
use crate::exporter::SessionExport;
use crate::scenarios::ScenarioId;
use crate::world::{SimApp, SimConfig, SimWorld};

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use trafficview_core::{AppConfig, NavError, NavigationState};
use trafficview_env::{
    ControlId, DashboardCommand, EnvError, GeoPoint, HeadlessMap, LayerId, MapCommand,
};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Live traffic samples applied
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Counts taken from the recorded view instructions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    pub map_commands: usize,
    pub dashboard_commands: usize,
    pub routes_rendered: usize,
    pub layer_toggles: usize,
    pub incident_markers: usize,
    pub alerts: usize,
    pub insights: usize,
}

impl ScenarioMetrics {
    fn collect(world: &SimWorld) -> Self {
        let map = world.map_commands();
        let ui = world.dashboard_commands();
        let count_map = |f: fn(&MapCommand) -> bool| map.iter().filter(|c| f(c)).count();
        let count_ui = |f: fn(&DashboardCommand) -> bool| ui.iter().filter(|c| f(c)).count();

        Self {
            map_commands: map.len(),
            dashboard_commands: ui.len(),
            routes_rendered: count_map(|c| matches!(c, MapCommand::RenderRoute { .. })),
            layer_toggles: count_map(|c| matches!(c, MapCommand::SetLayerVisible { .. })),
            incident_markers: world.map.incident_marker_count(),
            alerts: count_ui(|c| matches!(c, DashboardCommand::IncidentAlert { .. })),
            insights: count_ui(|c| matches!(c, DashboardCommand::Insight { .. })),
        }
    }
}

type Check = Result<(), String>;

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Check {
    if condition {
        Ok(())
    } else {
        Err(reason())
    }
}

/// Runs scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Live-traffic duration in seconds
    duration_secs: f64,

    /// Base application configuration
    app_config: AppConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            duration_secs: 60.0,
            app_config: AppConfig::default(),
        }
    }

    /// Sets the live-traffic duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Sets the application configuration.
    pub fn with_app_config(mut self, config: AppConfig) -> Self {
        self.app_config = config;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_recorded(scenario).0
    }

    /// Runs a scenario and records the session.
    ///
    /// The export is `None` only if the runtime could not be built.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, Option<SessionExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                let reason = SimError::Runtime(e).to_string();
                return (self.failed(scenario, reason), None);
            }
        };

        runtime.block_on(async {
            let world = self.world_for(scenario);

            let outcome = match scenario {
                ScenarioId::Startup => run_startup(&world).await,
                ScenarioId::LiveTraffic => run_live_traffic(&world).await,
                ScenarioId::SearchRace => run_search_race(&world).await,
                ScenarioId::Recalculate => run_recalculate(&world).await,
                ScenarioId::Navigation => run_navigation(&world).await,
                ScenarioId::LayerToggle => run_layer_toggle(&world).await,
                ScenarioId::Geolocation => run_geolocation(&world).await,
            };
            world.app.shutdown();

            let failure_reason = outcome.err();
            let passed = failure_reason.is_none();
            if let Some(reason) = &failure_reason {
                warn!("{} failed: {}", scenario.name(), reason);
            }

            let mut export = SessionExport::capture(scenario.name(), &world);
            export.finalize(passed, failure_reason.clone());

            let result = ScenarioResult {
                scenario,
                seed: self.seed,
                passed,
                total_ticks: world.tick_count() as u64,
                final_time_secs: world.time(),
                failure_reason,
                metrics: ScenarioMetrics::collect(&world),
            };
            (result, Some(export))
        })
    }

    fn world_for(&self, scenario: ScenarioId) -> SimWorld {
        let mut app = self.app_config.clone();
        let map = match scenario {
            ScenarioId::SearchRace => {
                // Jittered latency lets the first search resolve last
                app.latency_jitter_ms = app.latency_jitter_ms.max(1_000);
                HeadlessMap::new()
            }
            ScenarioId::Geolocation => {
                HeadlessMap::new().with_location_delay(Duration::from_millis(250))
            }
            _ => HeadlessMap::new(),
        };

        let config = SimConfig {
            seed: self.seed,
            duration_secs: self.duration_secs,
            app,
        };
        SimWorld::with_map(config, map)
    }

    fn failed(&self, scenario: ScenarioId, reason: String) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }
}

/// Startup: one route, four incident markers, a full heatmap, the legend.
async fn run_startup(world: &SimWorld) -> Check {
    ensure(world.app.start(), || "first start() reported already running".into())?;

    let route = world.app.current_route();
    ensure(route.is_some(), || "no current route after start".into())?;

    let markers = world.map.incident_marker_count();
    ensure(markers == 4, || format!("expected 4 incident markers, got {}", markers))?;

    let expected = world.config.app.heatmap_points;
    let heatmap = world.map.last_heatmap_len();
    ensure(heatmap == Some(expected), || {
        format!("expected heatmap of {}, got {:?}", expected, heatmap)
    })?;

    let legend = world
        .dashboard_commands()
        .iter()
        .any(|c| matches!(c, DashboardCommand::Legend { .. }));
    ensure(legend, || "traffic legend not displayed".into())?;

    ensure(!world.app.start(), || "second start() was not a no-op".into())?;

    info!("✓ Startup complete: {} markers, {} heatmap points", markers, expected);
    Ok(())
}

/// Live traffic: every interval refreshes speed and heatmap, nothing more.
async fn run_live_traffic(world: &SimWorld) -> Check {
    world.app.start();
    // A second start must not add a second timer
    world.app.start();

    let interval = world.config.app.live_update_interval();
    // Stop half an interval past the last expected tick
    let expected_ticks = (world.config.duration_secs / interval.as_secs_f64()).floor() as usize;
    let run_for = interval.mul_f64(expected_ticks as f64) + interval / 2;
    world.advance(run_for).await;

    let ticks = world.tick_count();
    ensure(ticks == expected_ticks.min(world.config.app.update_history_limit), || {
        format!("expected {} ticks, got {}", expected_ticks, ticks)
    })?;

    let commands = world.dashboard_commands();
    let speed_updates = commands
        .iter()
        .filter(|c| matches!(c, DashboardCommand::SpeedStats { .. }))
        .count();
    ensure(speed_updates == expected_ticks + 1, || {
        format!("expected {} speed updates, got {}", expected_ticks + 1, speed_updates)
    })?;

    for update in world.app.generator().recent_updates() {
        ensure((25..45).contains(&update.speed_mph), || {
            format!("speed {} out of range", update.speed_mph)
        })?;
        ensure((50..90).contains(&update.capacity_pct), || {
            format!("capacity {} out of range", update.capacity_pct)
        })?;
    }

    let heatmap_updates = world
        .map_commands()
        .iter()
        .filter(|c| matches!(c, MapCommand::UpdateHeatmap { .. }))
        .count();
    ensure(heatmap_updates == expected_ticks, || {
        format!("expected {} heatmap updates, got {}", expected_ticks, heatmap_updates)
    })?;

    let alerts = world.ui.alerts().len();
    let markers = world.map.incident_marker_count();
    ensure(alerts <= expected_ticks && markers == 4 + alerts, || {
        format!("{} alerts but {} markers", alerts, markers)
    })?;

    world.app.shutdown();
    world.advance(interval * 3).await;
    ensure(world.tick_count() == ticks, || "ticks continued after shutdown".into())?;

    info!("✓ LiveTraffic complete: {} ticks, {} incident alerts", ticks, alerts);
    Ok(())
}

/// Search race: only the latest search may be applied.
async fn run_search_race(world: &SimWorld) -> Check {
    world.app.load_initial();
    let renders_before = world.map.route_render_count();

    let (a, b) = tokio::join!(world.app.search("A"), world.app.search("B"));
    debug!(
        "search A: {:?}, search B: {:?}",
        a.as_ref().map(|r| &r.name),
        b.as_ref().map(|r| &r.name)
    );

    ensure(matches!(a, Err(NavError::StaleAsyncResult { .. })), || {
        format!("search A should be stale, got {:?}", a.map(|r| r.name))
    })?;
    ensure(b.is_ok(), || format!("search B failed: {:?}", b.err()))?;

    let current = world.app.current_route().map(|r| r.name);
    ensure(current.as_deref() == Some("To B"), || {
        format!("current route is {:?}", current)
    })?;

    let rendered = world.map.route_render_count() - renders_before;
    ensure(rendered == 1, || format!("expected 1 route render, got {}", rendered))?;
    ensure(world.map.last_route_name().as_deref() == Some("To B"), || {
        "stale route rendered last".into()
    })?;

    // A recalculation issued before a search is superseded by it
    let (recalc, search) = tokio::join!(world.app.recalculate(), world.app.search("C"));
    ensure(recalc.map_err(|e| e.is_stale()) == Err(true), || {
        "recalculation was not superseded".into()
    })?;
    ensure(search.is_ok(), || format!("search C failed: {:?}", search.err()))?;

    let current = world.app.current_route().map(|r| r.name);
    ensure(current.as_deref() == Some("To C"), || {
        format!("expected To C, got {:?}", current)
    })?;

    info!("✓ SearchRace complete: latest search applied");
    Ok(())
}

/// Recalculate: rejected without a route, clamped with one.
async fn run_recalculate(world: &SimWorld) -> Check {
    let before = world.app.snapshot();
    let result = world.app.recalculate().await;
    ensure(result == Err(NavError::NoActiveRoute), || {
        format!("expected NoActiveRoute, got {:?}", result.map(|r| r.name))
    })?;
    let after = world.app.snapshot();
    ensure(
        after.current_route.is_none() && after.route_generation == before.route_generation,
        || "state changed by rejected recalculation".into(),
    )?;

    world.app.load_initial();
    for round in 0..10 {
        let route = world
            .app
            .recalculate()
            .await
            .map_err(|e| format!("round {}: {}", round, e))?;
        ensure(route.estimated_time_min >= 15.0, || {
            format!("estimated time {} below 15", route.estimated_time_min)
        })?;
        ensure(route.traffic_impact_min >= 5.0, || {
            format!("traffic impact {} below 5", route.traffic_impact_min)
        })?;
        ensure((70.0..=99.0).contains(&route.efficiency), || {
            format!("efficiency {} outside [70, 99]", route.efficiency)
        })?;
        ensure(route.id == "route-1", || "recalculation replaced the route id".into())?;
    }

    info!("✓ Recalculate complete: 10 rounds within bounds");
    Ok(())
}

/// Navigation: Idle and Navigating strictly alternate.
async fn run_navigation(world: &SimWorld) -> Check {
    world.app.load_initial();

    let mut expected = NavigationState::Idle;
    for _ in 0..6 {
        expected = expected.toggled();
        let state = world.app.toggle_navigation();
        ensure(state == expected, || format!("expected {:?}, got {:?}", expected, state))?;

        let control = world.ui.control_state(ControlId::StartNavigation);
        ensure(control == Some(expected.is_navigating()), || {
            format!("navigation control shows {:?}", control)
        })?;
    }
    ensure(world.app.navigation() == NavigationState::Idle, || {
        "even number of toggles did not return to Idle".into()
    })?;

    info!("✓ Navigation complete");
    Ok(())
}

/// Layer toggles: one instruction per flip, flags restored after two.
async fn run_layer_toggle(world: &SimWorld) -> Check {
    world.app.load_initial();

    type Toggle = fn(&SimApp) -> bool;
    let layers: [(LayerId, Toggle, Toggle); 2] = [
        (
            LayerId::Heatmap,
            SimApp::toggle_heatmap_visibility,
            SimApp::heatmap_visible,
        ),
        (
            LayerId::Incidents,
            SimApp::toggle_incidents_visibility,
            SimApp::incidents_visible,
        ),
    ];

    for (layer, flip, visible) in layers {
        let original = visible(&world.app);

        let first = flip(&world.app);
        ensure(first != original, || format!("{:?} did not flip", layer))?;
        let second = flip(&world.app);
        ensure(second == original, || format!("{:?} not restored", layer))?;

        let count = world.map.layer_toggle_count(layer);
        ensure(count == 2, || {
            format!("{:?}: expected 2 layer instructions, got {}", layer, count)
        })?;
    }

    info!("✓ LayerToggle complete");
    Ok(())
}

/// Geolocation: failures never clobber a known position.
async fn run_geolocation(world: &SimWorld) -> Check {
    world.app.load_initial();

    let denied = world.app.locate().await;
    ensure(denied.is_err() && world.app.user_location().is_none(), || {
        "unsupported geolocation set a location".into()
    })?;

    let here = GeoPoint::new(40.7306, -73.9866);
    world.map.set_location(Ok(here));
    let found = world.app.locate().await;
    ensure(found == Ok(here), || format!("expected {}, got {:?}", here, found))?;

    for error in [
        EnvError::GeolocationDenied,
        EnvError::GeolocationUnsupported,
        EnvError::Timeout(10_000),
    ] {
        world.map.set_location(Err(error.clone()));
        let result = world.app.locate().await;
        ensure(result == Err(NavError::Geolocation(error.clone())), || {
            format!("expected {:?}, got {:?}", error, result)
        })?;
        ensure(world.app.user_location() == Some(here), || {
            format!("{} replaced the known location", error)
        })?;
    }

    let route = world
        .app
        .search("Union Square")
        .await
        .map_err(|e| format!("search after locate failed: {}", e))?;
    ensure(route.start == here, || "search did not start from the user location".into())?;

    info!("✓ Geolocation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_pass() {
        let runner = ScenarioRunner::new(42);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario,
                result.failure_reason
            );
        }
    }

    #[test]
    fn test_live_traffic_counts_ticks() {
        let result = ScenarioRunner::new(7).with_duration(30.0).run(ScenarioId::LiveTraffic);
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.total_ticks, 3);
    }

    #[test]
    fn test_recorded_export() {
        let (result, export) = ScenarioRunner::new(1).run_recorded(ScenarioId::Startup);
        let export = export.expect("export recorded");

        assert!(result.passed);
        assert!(export.passed);
        assert_eq!(export.scenario, "startup");
        assert!(matches!(export.map_commands[0], MapCommand::InitializeMap { .. }));
        assert!(export.to_json().unwrap().contains("\"op\": \"render_heatmap\""));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let runner = ScenarioRunner::new(99).with_duration(40.0);
        let (_, first) = runner.run_recorded(ScenarioId::LiveTraffic);
        let (_, second) = runner.run_recorded(ScenarioId::LiveTraffic);

        assert_eq!(
            first.unwrap().to_json().unwrap(),
            second.unwrap().to_json().unwrap()
        );
    }
}

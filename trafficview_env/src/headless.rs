//! Headless view layer that records every instruction it receives.
//!
//! Used by the simulation harness and by tests to assert on exactly which
//! render instructions the core issued, in order.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::EnvError;
use crate::types::{
    AlertDescriptor, ControlId, GeoPoint, HeatmapPoint, HeatmapStyle, LayerId, LegendEntry,
    MarkerDescriptor, PredictionCard, RouteDescriptor, RouteStats, SpeedStats,
};
use crate::view::{Dashboard, MapView};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A recorded map instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapCommand {
    InitializeMap { center: GeoPoint, zoom: u8 },
    RenderHeatmap { points: usize, style: HeatmapStyle },
    UpdateHeatmap { points: usize },
    RenderIncidentMarker { marker: MarkerDescriptor },
    ClearIncidentMarkers,
    RenderRoute { route: RouteDescriptor },
    RenderUserLocation { marker: MarkerDescriptor },
    SetLayerVisible { layer: LayerId, visible: bool },
    RequestUserLocation,
}

/// In-memory [`MapView`].
pub struct HeadlessMap {
    commands: Mutex<Vec<MapCommand>>,

    /// Outcome handed back by `request_user_location`
    location: Mutex<Result<GeoPoint, EnvError>>,

    /// Simulated delay before the location request resolves
    location_delay: Duration,
}

impl HeadlessMap {
    /// Creates a map whose location requests report `Unsupported`.
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            location: Mutex::new(Err(EnvError::GeolocationUnsupported)),
            location_delay: Duration::ZERO,
        }
    }

    /// Sets the outcome of future location requests.
    pub fn with_location(self, outcome: Result<GeoPoint, EnvError>) -> Self {
        *lock(&self.location) = outcome;
        self
    }

    /// Sets how long location requests take to resolve.
    pub fn with_location_delay(mut self, delay: Duration) -> Self {
        self.location_delay = delay;
        self
    }

    /// Changes the outcome of future location requests.
    pub fn set_location(&self, outcome: Result<GeoPoint, EnvError>) {
        *lock(&self.location) = outcome;
    }

    /// Returns a copy of every recorded instruction.
    pub fn commands(&self) -> Vec<MapCommand> {
        lock(&self.commands).clone()
    }

    /// Number of incident markers currently on the map.
    pub fn incident_marker_count(&self) -> usize {
        let commands = lock(&self.commands);
        let since_clear = commands
            .iter()
            .rposition(|c| matches!(c, MapCommand::ClearIncidentMarkers))
            .map(|i| i + 1)
            .unwrap_or(0);
        commands[since_clear..]
            .iter()
            .filter(|c| matches!(c, MapCommand::RenderIncidentMarker { .. }))
            .count()
    }

    /// Number of `set_layer_visible` instructions issued for a layer.
    pub fn layer_toggle_count(&self, layer: LayerId) -> usize {
        lock(&self.commands)
            .iter()
            .filter(|c| matches!(c, MapCommand::SetLayerVisible { layer: l, .. } if *l == layer))
            .count()
    }

    /// Point count of the most recent heatmap render or update.
    pub fn last_heatmap_len(&self) -> Option<usize> {
        lock(&self.commands).iter().rev().find_map(|c| match c {
            MapCommand::RenderHeatmap { points, .. } | MapCommand::UpdateHeatmap { points } => {
                Some(*points)
            }
            _ => None,
        })
    }

    /// Name of the most recently rendered route.
    pub fn last_route_name(&self) -> Option<String> {
        lock(&self.commands).iter().rev().find_map(|c| match c {
            MapCommand::RenderRoute { route } => Some(route.name.clone()),
            _ => None,
        })
    }

    /// Number of route renders so far.
    pub fn route_render_count(&self) -> usize {
        lock(&self.commands)
            .iter()
            .filter(|c| matches!(c, MapCommand::RenderRoute { .. }))
            .count()
    }

    fn record(&self, command: MapCommand) {
        lock(&self.commands).push(command);
    }
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MapView for HeadlessMap {
    fn initialize_map(&self, center: GeoPoint, zoom: u8) {
        self.record(MapCommand::InitializeMap { center, zoom });
    }

    fn render_heatmap(&self, points: &[HeatmapPoint], style: &HeatmapStyle) {
        self.record(MapCommand::RenderHeatmap {
            points: points.len(),
            style: style.clone(),
        });
    }

    fn update_heatmap(&self, points: &[HeatmapPoint]) {
        self.record(MapCommand::UpdateHeatmap { points: points.len() });
    }

    fn render_incident_marker(&self, marker: &MarkerDescriptor) {
        self.record(MapCommand::RenderIncidentMarker { marker: marker.clone() });
    }

    fn clear_incident_markers(&self) {
        self.record(MapCommand::ClearIncidentMarkers);
    }

    fn render_route(&self, route: &RouteDescriptor) {
        self.record(MapCommand::RenderRoute { route: route.clone() });
    }

    fn render_user_location(&self, marker: &MarkerDescriptor) {
        self.record(MapCommand::RenderUserLocation { marker: marker.clone() });
    }

    fn set_layer_visible(&self, layer: LayerId, visible: bool) {
        self.record(MapCommand::SetLayerVisible { layer, visible });
    }

    async fn request_user_location(&self) -> Result<GeoPoint, EnvError> {
        self.record(MapCommand::RequestUserLocation);
        if !self.location_delay.is_zero() {
            tokio::time::sleep(self.location_delay).await;
        }
        lock(&self.location).clone()
    }
}

/// A recorded dashboard instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DashboardCommand {
    RouteStats { stats: RouteStats },
    SpeedStats { stats: SpeedStats },
    Predictions { cards: Vec<PredictionCard> },
    IncidentAlert { alert: AlertDescriptor, dismiss_after_ms: u64 },
    Insight { message: String, dismiss_after_ms: u64 },
    Legend { entries: Vec<LegendEntry> },
    ControlActive { control: ControlId, active: bool },
}

/// In-memory [`Dashboard`].
#[derive(Default)]
pub struct HeadlessDashboard {
    commands: Mutex<Vec<DashboardCommand>>,
}

impl HeadlessDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded instruction.
    pub fn commands(&self) -> Vec<DashboardCommand> {
        lock(&self.commands).clone()
    }

    /// All insight messages in display order.
    pub fn insights(&self) -> Vec<String> {
        lock(&self.commands)
            .iter()
            .filter_map(|c| match c {
                DashboardCommand::Insight { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent insight message.
    pub fn last_insight(&self) -> Option<String> {
        self.insights().pop()
    }

    /// All incident alerts in display order.
    pub fn alerts(&self) -> Vec<AlertDescriptor> {
        lock(&self.commands)
            .iter()
            .filter_map(|c| match c {
                DashboardCommand::IncidentAlert { alert, .. } => Some(alert.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent speed figures.
    pub fn last_speed_stats(&self) -> Option<SpeedStats> {
        lock(&self.commands).iter().rev().find_map(|c| match c {
            DashboardCommand::SpeedStats { stats } => Some(*stats),
            _ => None,
        })
    }

    /// Most recent route figures.
    pub fn last_route_stats(&self) -> Option<RouteStats> {
        lock(&self.commands).iter().rev().find_map(|c| match c {
            DashboardCommand::RouteStats { stats } => Some(stats.clone()),
            _ => None,
        })
    }

    /// Last active state reported for a control.
    pub fn control_state(&self, control: ControlId) -> Option<bool> {
        lock(&self.commands).iter().rev().find_map(|cmd| match cmd {
            DashboardCommand::ControlActive { control: c, active } if *c == control => Some(*active),
            _ => None,
        })
    }

    fn record(&self, command: DashboardCommand) {
        lock(&self.commands).push(command);
    }
}

impl Dashboard for HeadlessDashboard {
    fn display_route_stats(&self, stats: &RouteStats) {
        self.record(DashboardCommand::RouteStats { stats: stats.clone() });
    }

    fn display_speed_stats(&self, stats: &SpeedStats) {
        self.record(DashboardCommand::SpeedStats { stats: *stats });
    }

    fn display_predictions(&self, cards: &[PredictionCard]) {
        self.record(DashboardCommand::Predictions { cards: cards.to_vec() });
    }

    fn display_incident_alert(&self, alert: &AlertDescriptor, dismiss_after: Duration) {
        self.record(DashboardCommand::IncidentAlert {
            alert: alert.clone(),
            dismiss_after_ms: dismiss_after.as_millis() as u64,
        });
    }

    fn display_insight(&self, message: &str, dismiss_after: Duration) {
        self.record(DashboardCommand::Insight {
            message: message.to_string(),
            dismiss_after_ms: dismiss_after.as_millis() as u64,
        });
    }

    fn display_legend(&self, entries: &[LegendEntry]) {
        self.record(DashboardCommand::Legend { entries: entries.to_vec() });
    }

    fn set_control_active(&self, control: ControlId, active: bool) {
        self.record(DashboardCommand::ControlActive { control, active });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, MarkerShape};

    fn marker() -> MarkerDescriptor {
        MarkerDescriptor {
            position: GeoPoint::new(40.7, -74.0),
            shape: MarkerShape::Circle,
            color: Color::Danger,
            icon: None,
            label: "test".to_string(),
            detail: Vec::new(),
            size_px: 24,
        }
    }

    #[test]
    fn test_incident_marker_count_resets_on_clear() {
        let map = HeadlessMap::new();
        map.render_incident_marker(&marker());
        map.render_incident_marker(&marker());
        assert_eq!(map.incident_marker_count(), 2);

        map.clear_incident_markers();
        assert_eq!(map.incident_marker_count(), 0);

        map.render_incident_marker(&marker());
        assert_eq!(map.incident_marker_count(), 1);
    }

    #[test]
    fn test_layer_toggle_count() {
        let map = HeadlessMap::new();
        map.set_layer_visible(LayerId::Heatmap, false);
        map.set_layer_visible(LayerId::Heatmap, true);
        map.set_layer_visible(LayerId::Incidents, false);
        assert_eq!(map.layer_toggle_count(LayerId::Heatmap), 2);
        assert_eq!(map.layer_toggle_count(LayerId::Incidents), 1);
    }

    #[tokio::test]
    async fn test_location_outcome() {
        let map = HeadlessMap::new();
        assert_eq!(
            map.request_user_location().await,
            Err(EnvError::GeolocationUnsupported)
        );

        map.set_location(Ok(GeoPoint::new(1.0, 2.0)));
        assert_eq!(map.request_user_location().await, Ok(GeoPoint::new(1.0, 2.0)));
        assert_eq!(map.commands().len(), 2);
    }

    #[test]
    fn test_dashboard_records_insights() {
        let ui = HeadlessDashboard::new();
        ui.display_insight("one", Duration::from_secs(3));
        ui.set_control_active(ControlId::HeatmapToggle, false);
        ui.display_insight("two", Duration::from_secs(3));

        assert_eq!(ui.insights(), vec!["one".to_string(), "two".to_string()]);
        assert_eq!(ui.last_insight().as_deref(), Some("two"));
        assert_eq!(ui.control_state(ControlId::HeatmapToggle), Some(false));
        assert_eq!(ui.control_state(ControlId::StartNavigation), None);
    }
}

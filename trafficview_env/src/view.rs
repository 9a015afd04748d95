//! View-layer abstraction for the TrafficView core.
//!
//! The core never draws anything itself. It hands structured descriptors
//! to a [`MapView`] (the map widget) and a [`Dashboard`] (sidebar and
//! overlays), which are implemented by the rendering front end.
//!
//! ```text
//!   Core                         MapView / Dashboard
//!    |                                  |
//!    |-- render_route(descriptor) ----->|  (replaces prior route)
//!    |-- set_layer_visible(id, b) ----->|
//!    |-- request_user_location() ------>|
//!    |<------------ GeoPoint | EnvError -|
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::EnvError;
use crate::types::{
    AlertDescriptor, ControlId, GeoPoint, HeatmapPoint, HeatmapStyle, LayerId, LegendEntry,
    MarkerDescriptor, PredictionCard, RouteDescriptor, RouteStats, SpeedStats,
};

/// The map widget.
#[async_trait]
pub trait MapView: Send + Sync + 'static {
    /// Creates the map centred on `center` at the given zoom level.
    fn initialize_map(&self, center: GeoPoint, zoom: u8);
    
    /// Creates the heatmap layer with an initial point set.
    fn render_heatmap(&self, points: &[HeatmapPoint], style: &HeatmapStyle);
    
    /// Replaces the heatmap layer's points wholesale.
    fn update_heatmap(&self, points: &[HeatmapPoint]);
    
    /// Adds one incident marker to the incidents layer.
    fn render_incident_marker(&self, marker: &MarkerDescriptor);
    
    /// Removes every incident marker.
    fn clear_incident_markers(&self);
    
    /// Draws a route, replacing any prior route rendering.
    fn render_route(&self, route: &RouteDescriptor);
    
    /// Places (or moves) the user location marker and centres on it.
    fn render_user_location(&self, marker: &MarkerDescriptor);
    
    /// Shows or hides a layer.
    fn set_layer_visible(&self, layer: LayerId, visible: bool);
    
    /// Asks the platform for the user's position.
    ///
    /// # Returns
    /// * `Ok(point)` - A position fix
    /// * `Err(EnvError::GeolocationDenied | GeolocationUnsupported | Timeout)`
    async fn request_user_location(&self) -> Result<GeoPoint, EnvError>;
}

/// Sidebar, overlays and transient messages.
pub trait Dashboard: Send + Sync + 'static {
    fn display_route_stats(&self, stats: &RouteStats);
    
    fn display_speed_stats(&self, stats: &SpeedStats);
    
    /// Replaces the predictions list.
    fn display_predictions(&self, cards: &[PredictionCard]);
    
    /// Shows an incident banner that hides itself after `dismiss_after`.
    fn display_incident_alert(&self, alert: &AlertDescriptor, dismiss_after: Duration);
    
    /// Shows a short advisory message that hides itself after `dismiss_after`.
    fn display_insight(&self, message: &str, dismiss_after: Duration);
    
    fn display_legend(&self, entries: &[LegendEntry]);
    
    fn set_control_active(&self, control: ControlId, active: bool);
}

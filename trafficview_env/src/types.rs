//! Common types crossing the boundary between the TrafficView core and
//! the view layer.
//!
//! Everything here is a plain value. The core describes *what* to draw
//! (shape, colour, icon id, label); the view layer decides *how*.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns this point shifted by the given deltas (degrees).
    pub fn offset(self, d_lat: f64, d_lon: f64) -> Self {
        Self::new(self.latitude + d_lat, self.longitude + d_lon)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// A single sample contributing to the density overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Normalized intensity (0.0 - 1.0)
    pub intensity: f64,
}

impl HeatmapPoint {
    pub const fn new(latitude: f64, longitude: f64, intensity: f64) -> Self {
        Self { latitude, longitude, intensity }
    }

    /// Returns the point as a `[lat, lon, intensity]` triple.
    pub fn to_triple(self) -> [f64; 3] {
        [self.latitude, self.longitude, self.intensity]
    }
}

/// Theme colours understood by the view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Primary,
    Secondary,
    Warning,
    Danger,
}

impl Color {
    /// Returns the CSS custom property for this colour.
    pub fn css_var(&self) -> &'static str {
        match self {
            Color::Primary => "var(--primary)",
            Color::Secondary => "var(--secondary)",
            Color::Warning => "var(--warning)",
            Color::Danger => "var(--danger)",
        }
    }
}

/// Identifier of an icon in the view layer's icon set (e.g. `fa-cone`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconId(pub Cow<'static, str>);

impl IconId {
    /// Creates an icon id from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for IconId {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marker glyph shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    /// Filled circle with an icon inside
    Circle,
    /// Circle with a single-letter label (route start/end)
    Badge,
    /// Pulsing location arrow
    Pulse,
}

/// Structured description of a map marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescriptor {
    pub position: GeoPoint,
    pub shape: MarkerShape,
    pub color: Color,
    pub icon: Option<IconId>,
    /// Short label shown on or next to the marker
    pub label: String,
    /// Popup body lines, if the marker has a popup
    pub detail: Vec<String>,
    /// Marker size in pixels
    pub size_px: u16,
}

/// Structured description of a route polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    pub name: String,
    /// Ordered polyline: start, waypoints, end
    pub polyline: Vec<GeoPoint>,
    pub color: Color,
    pub start_marker: MarkerDescriptor,
    pub end_marker: MarkerDescriptor,
}

/// A colour stop in the heatmap gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient (0.0 - 1.0)
    pub stop: f64,
    /// RGBA colour string
    pub rgba: String,
}

/// Rendering options for the heatmap layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapStyle {
    pub radius: u32,
    pub blur: u32,
    pub max_zoom: u8,
    pub min_opacity: f64,
    pub gradient: Vec<GradientStop>,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        let stop = |stop: f64, rgba: &str| GradientStop { stop, rgba: rgba.to_string() };
        Self {
            radius: 25,
            blur: 15,
            max_zoom: 17,
            min_opacity: 0.3,
            gradient: vec![
                stop(0.2, "rgba(0, 243, 255, 0.2)"),
                stop(0.5, "rgba(0, 243, 255, 0.5)"),
                stop(0.7, "rgba(255, 179, 77, 0.6)"),
                stop(1.0, "rgba(255, 55, 95, 0.8)"),
            ],
        }
    }
}

/// Map layers that can be shown or hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    Heatmap,
    Incidents,
}

/// UI controls whose active state the core drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    HeatmapToggle,
    TrafficToggle,
    StartNavigation,
}

impl ControlId {
    /// Element id of the control in the page.
    pub fn element_id(&self) -> &'static str {
        match self {
            ControlId::HeatmapToggle => "heatmap-toggle",
            ControlId::TrafficToggle => "traffic-toggle",
            ControlId::StartNavigation => "start-navigation-btn",
        }
    }
}

/// Route summary figures shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStats {
    pub estimated_time_min: u32,
    pub distance_miles: f64,
    pub traffic_impact_min: u32,
    pub efficiency_pct: u32,
    pub grade: String,
}

/// Live speed figures shown in the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedStats {
    pub current_mph: u32,
    pub average_mph: u32,
    pub capacity_pct: u32,
}

/// A prediction entry in the predictions list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCard {
    pub icon: IconId,
    pub title: String,
    pub description: String,
    /// Value with its unit already appended
    pub value: String,
}

/// Incident alert banner contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDescriptor {
    pub icon: IconId,
    pub headline: String,
    pub detail: String,
}

/// One row in the traffic legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub rgba: String,
    pub label: String,
    pub range: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_lookup_names() {
        assert_eq!(Color::Danger.css_var(), "var(--danger)");
        assert_eq!(ControlId::StartNavigation.element_id(), "start-navigation-btn");
        assert_eq!(GeoPoint::new(1.0, 2.0).offset(0.5, -0.5), GeoPoint::new(1.5, 1.5));
    }
}

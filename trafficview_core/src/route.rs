//! Routes and their derived figures.

use geo::{HaversineLength, LineString};
use serde::{Deserialize, Serialize};
use trafficview_env::{Color, GeoPoint, MarkerDescriptor, MarkerShape, RouteDescriptor, RouteStats};

const METERS_PER_MILE: f64 = 1609.344;

/// Letter grade for route efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grades an efficiency percentage. Thresholds are inclusive.
pub fn efficiency_grade(efficiency: f64) -> Grade {
    if efficiency >= 90.0 {
        Grade::APlus
    } else if efficiency >= 80.0 {
        Grade::A
    } else if efficiency >= 70.0 {
        Grade::B
    } else if efficiency >= 60.0 {
        Grade::C
    } else {
        Grade::D
    }
}

/// A navigable route. Replaced wholesale, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub start: GeoPoint,
    pub end: GeoPoint,

    /// Intermediate points between start and end, in travel order
    pub waypoints: Vec<GeoPoint>,

    pub distance_miles: f64,

    /// Free-flow travel time in minutes
    pub estimated_time_min: f64,

    /// Extra minutes caused by current traffic
    pub traffic_impact_min: f64,

    /// Efficiency percentage (0 - 100)
    pub efficiency: f64,

    /// Per-segment congestion (0.0 - 1.0), if known
    pub congestion_levels: Vec<f64>,

    /// Ids of alternative routes
    pub alternatives: Vec<String>,

    /// Creation time (Unix milliseconds)
    pub created_at_ms: u64,
}

impl Route {
    /// Estimated time plus traffic impact, in minutes.
    pub fn total_time(&self) -> f64 {
        self.estimated_time_min + self.traffic_impact_min
    }

    pub fn grade(&self) -> Grade {
        efficiency_grade(self.efficiency)
    }

    /// `[start, ...waypoints, end]`
    pub fn polyline(&self) -> Vec<GeoPoint> {
        std::iter::once(self.start)
            .chain(self.waypoints.iter().copied())
            .chain(std::iter::once(self.end))
            .collect()
    }

    /// Great-circle length of the polyline in miles.
    pub fn polyline_length_miles(&self) -> f64 {
        let line: LineString<f64> = self
            .polyline()
            .into_iter()
            .map(|p| (p.longitude, p.latitude))
            .collect::<Vec<_>>()
            .into();
        line.haversine_length() / METERS_PER_MILE
    }

    /// Sidebar figures.
    pub fn stats(&self) -> RouteStats {
        RouteStats {
            estimated_time_min: self.estimated_time_min.round().max(0.0) as u32,
            distance_miles: self.distance_miles,
            traffic_impact_min: self.traffic_impact_min.round().max(0.0) as u32,
            efficiency_pct: self.efficiency.round().clamp(0.0, 100.0) as u32,
            grade: self.grade().to_string(),
        }
    }

    pub fn descriptor(&self) -> RouteDescriptor {
        RouteDescriptor {
            name: self.name.clone(),
            polyline: self.polyline(),
            color: Color::Primary,
            start_marker: endpoint_marker(self.start, "Start", "S", Color::Primary),
            end_marker: endpoint_marker(self.end, "Destination", "E", Color::Secondary),
        }
    }
}

fn endpoint_marker(position: GeoPoint, popup: &str, badge: &str, color: Color) -> MarkerDescriptor {
    MarkerDescriptor {
        position,
        shape: MarkerShape::Badge,
        color,
        icon: None,
        label: badge.to_string(),
        detail: vec![popup.to_string()],
        size_px: 20,
    }
}

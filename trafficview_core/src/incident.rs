//! Traffic incidents: point-located synthetic events with a severity and
//! a clearance estimate.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use trafficview_env::{
    AlertDescriptor, Color, GeoPoint, HeatmapPoint, IconId, MarkerDescriptor, MarkerShape,
};
use uuid::Uuid;

/// Unique identifier for an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(pub Uuid);

impl IncidentId {
    /// Creates a deterministic IncidentId from a sequence number.
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
}

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Kind of incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Accident,
    Construction,
    Congestion,
    Hazard,
}

impl IncidentType {
    pub fn name(&self) -> &'static str {
        match self {
            IncidentType::Accident => "accident",
            IncidentType::Construction => "construction",
            IncidentType::Congestion => "congestion",
            IncidentType::Hazard => "hazard",
        }
    }

    /// Icon shown inside the marker and the alert banner.
    pub fn icon(&self) -> IconId {
        match self {
            IncidentType::Accident => IconId::from_static("fa-car-crash"),
            IncidentType::Construction => IconId::from_static("fa-cone"),
            IncidentType::Hazard => IconId::from_static("fa-exclamation-triangle"),
            IncidentType::Congestion => IconId::from_static("fa-traffic-light"),
        }
    }
}

impl std::str::FromStr for IncidentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accident" => Ok(IncidentType::Accident),
            "construction" => Ok(IncidentType::Construction),
            "congestion" => Ok(IncidentType::Congestion),
            "hazard" => Ok(IncidentType::Hazard),
            _ => Err(format!("Unknown incident type: {}", s)),
        }
    }
}

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Severity::High => Color::Danger,
            Severity::Medium => Color::Warning,
            Severity::Low => Color::Primary,
        }
    }

    /// Contribution of an incident of this severity to the heatmap.
    pub fn heatmap_intensity(&self) -> f64 {
        match self {
            Severity::High => 0.9,
            Severity::Medium => 0.6,
            Severity::Low => 0.3,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// Fallback heatmap intensity for unrecognized severities.
pub const DEFAULT_INTENSITY: f64 = 0.5;

/// Fallback icon for unrecognized incident types.
pub const DEFAULT_INCIDENT_ICON: &str = "fa-info-circle";

/// Colour for a severity given by name. Unknown names map to `Primary`.
pub fn severity_color(severity: &str) -> Color {
    severity
        .parse::<Severity>()
        .map(|s| s.color())
        .unwrap_or(Color::Primary)
}

/// Heatmap intensity for a severity given by name. Unknown names map to 0.5.
pub fn heatmap_intensity(severity: &str) -> f64 {
    severity
        .parse::<Severity>()
        .map(|s| s.heatmap_intensity())
        .unwrap_or(DEFAULT_INTENSITY)
}

/// Icon for an incident type given by name. Unknown names map to the info icon.
pub fn icon_for(kind: &str) -> IconId {
    kind.parse::<IncidentType>()
        .map(|k| k.icon())
        .unwrap_or(IconId::from_static(DEFAULT_INCIDENT_ICON))
}

/// A synthetic traffic incident. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub latitude: f64,
    pub longitude: f64,

    #[serde(rename = "type")]
    pub kind: IncidentType,

    pub severity: Severity,
    pub description: String,

    /// Report time (Unix milliseconds)
    pub reported_at_ms: u64,

    /// Expected time until the incident clears, in minutes
    pub expected_clearance_min: u32,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
}

impl Incident {
    /// Creates an incident with full confidence.
    pub fn new(
        id: IncidentId,
        position: GeoPoint,
        kind: IncidentType,
        severity: Severity,
        description: impl Into<String>,
        reported_at_ms: u64,
        expected_clearance_min: u32,
    ) -> Self {
        Self {
            id,
            latitude: position.latitude,
            longitude: position.longitude,
            kind,
            severity,
            description: description.into(),
            reported_at_ms,
            expected_clearance_min,
            confidence: 1.0,
        }
    }

    /// Sets the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    pub fn color(&self) -> Color {
        self.severity.color()
    }

    pub fn icon(&self) -> IconId {
        self.kind.icon()
    }

    pub fn to_heatmap_point(&self) -> HeatmapPoint {
        HeatmapPoint::new(self.latitude, self.longitude, self.severity.heatmap_intensity())
    }

    /// Marker descriptor, with popup lines relative to `now_ms`.
    pub fn marker(&self, now_ms: u64) -> MarkerDescriptor {
        let age = Duration::from_millis(now_ms.saturating_sub(self.reported_at_ms));
        MarkerDescriptor {
            position: self.position(),
            shape: MarkerShape::Circle,
            color: self.color(),
            icon: Some(self.icon()),
            label: self.description.clone(),
            detail: vec![
                format!("Severity: {}", self.severity.name()),
                format!(
                    "Reported {} • Expected clearance: {} min",
                    format_time_ago(age),
                    self.expected_clearance_min
                ),
            ],
            size_px: 24,
        }
    }

    /// Alert banner contents.
    pub fn alert(&self) -> AlertDescriptor {
        AlertDescriptor {
            icon: self.icon(),
            headline: self.description.clone(),
            detail: format!("Clearing in ~{} min", self.expected_clearance_min),
        }
    }
}

/// Human-readable "time ago" string.
///
/// Picks the largest unit of which strictly more than one has elapsed.
pub fn format_time_ago(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();

    const UNITS: [(f64, &str); 5] = [
        (31_536_000.0, "years"),
        (2_592_000.0, "months"),
        (86_400.0, "days"),
        (3_600.0, "hours"),
        (60.0, "minutes"),
    ];

    for (unit_secs, name) in UNITS {
        let interval = seconds / unit_secs;
        if interval > 1.0 {
            return format!("{} {} ago", interval.floor() as u64, name);
        }
    }

    format!("{} seconds ago", seconds.floor() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(severity: Severity) -> Incident {
        Incident::new(
            IncidentId::from_seed(1),
            GeoPoint::new(40.7128, -74.0060),
            IncidentType::Accident,
            severity,
            "Multi-vehicle collision",
            1_000,
            30,
        )
    }

    #[test]
    fn test_heatmap_intensity_by_severity() {
        assert_eq!(heatmap_intensity("high"), 0.9);
        assert_eq!(heatmap_intensity("medium"), 0.6);
        assert_eq!(heatmap_intensity("low"), 0.3);
        assert_eq!(heatmap_intensity("catastrophic"), 0.5);
        assert_eq!(heatmap_intensity(""), 0.5);
    }

    #[test]
    fn test_severity_color_fallback() {
        assert_eq!(severity_color("high"), Color::Danger);
        assert_eq!(severity_color("medium"), Color::Warning);
        assert_eq!(severity_color("low"), Color::Primary);
        assert_eq!(severity_color("unknown"), Color::Primary);
    }

    #[test]
    fn test_icon_fallback() {
        assert_eq!(icon_for("construction").as_str(), "fa-cone");
        assert_eq!(icon_for("congestion").as_str(), "fa-traffic-light");
        assert_eq!(icon_for("meteor").as_str(), "fa-info-circle");
    }

    #[test]
    fn test_incident_heatmap_point() {
        let point = sample(Severity::Medium).to_heatmap_point();
        assert_eq!(point.to_triple(), [40.7128, -74.0060, 0.6]);
    }

    #[test]
    fn test_incident_marker_descriptor() {
        let incident = sample(Severity::High);
        let marker = incident.marker(1_000 + 5 * 60_000);

        assert_eq!(marker.color, Color::Danger);
        assert_eq!(marker.icon.as_ref().map(|i| i.as_str()), Some("fa-car-crash"));
        assert_eq!(marker.detail[0], "Severity: high");
        assert_eq!(marker.detail[1], "Reported 5 minutes ago • Expected clearance: 30 min");
    }

    #[test]
    fn test_incident_alert() {
        let alert = sample(Severity::Low).alert();
        assert_eq!(alert.headline, "Multi-vehicle collision");
        assert_eq!(alert.detail, "Clearing in ~30 min");
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(sample(Severity::Low).confidence, 1.0);
        assert_eq!(sample(Severity::Low).with_confidence(1.7).confidence, 1.0);
        assert_eq!(sample(Severity::Low).with_confidence(0.4).confidence, 0.4);
    }

    #[test]
    fn test_format_time_ago() {
        assert_eq!(format_time_ago(Duration::from_secs(42)), "42 seconds ago");
        // Exactly one minute is not "more than one" minute
        assert_eq!(format_time_ago(Duration::from_secs(60)), "60 seconds ago");
        assert_eq!(format_time_ago(Duration::from_secs(150)), "2 minutes ago");
        assert_eq!(format_time_ago(Duration::from_secs(2 * 3600 + 5)), "2 hours ago");
        assert_eq!(format_time_ago(Duration::from_secs(3 * 86_400 + 1)), "3 days ago");
    }

    #[test]
    fn test_incident_id_from_seed_is_stable() {
        assert_eq!(IncidentId::from_seed(7), IncidentId::from_seed(7));
        assert_ne!(IncidentId::from_seed(7), IncidentId::from_seed(8));
    }
}

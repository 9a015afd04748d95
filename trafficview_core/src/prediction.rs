//! Canned traffic predictions shown in the sidebar.

use serde::{Deserialize, Serialize};
use trafficview_env::{IconId, PredictionCard};

/// Kind of prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    PeakTraffic,
    AccidentClearance,
    EcoScore,
    RouteSuggestion,
}

impl PredictionType {
    pub fn default_icon(&self) -> IconId {
        match self {
            PredictionType::PeakTraffic => IconId::from_static("fa-clock"),
            PredictionType::AccidentClearance => IconId::from_static("fa-car-crash"),
            PredictionType::EcoScore => IconId::from_static("fa-leaf"),
            PredictionType::RouteSuggestion => IconId::from_static("fa-route"),
        }
    }
}

impl std::str::FromStr for PredictionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "peak_traffic" => Ok(PredictionType::PeakTraffic),
            "accident_clearance" => Ok(PredictionType::AccidentClearance),
            "eco_score" => Ok(PredictionType::EcoScore),
            "route_suggestion" => Ok(PredictionType::RouteSuggestion),
            _ => Err(format!("Unknown prediction type: {}", s)),
        }
    }
}

/// Icon for a prediction type given by name, with a generic fallback.
pub fn prediction_icon_for(kind: &str) -> IconId {
    kind.parse::<PredictionType>()
        .map(|k| k.default_icon())
        .unwrap_or(IconId::from_static("fa-brain"))
}

/// Default confidence of a canned prediction.
pub const DEFAULT_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: PredictionType,

    pub title: String,
    pub description: String,
    pub value: String,
    pub unit: String,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// Expiry time (Unix milliseconds), if any
    pub expires_at_ms: Option<u64>,

    pub icon: IconId,
}

impl Prediction {
    pub fn new(
        id: impl Into<String>,
        kind: PredictionType,
        title: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: description.into(),
            value: value.into(),
            unit: unit.into(),
            confidence: DEFAULT_CONFIDENCE,
            expires_at_ms: None,
            icon: kind.default_icon(),
        }
    }

    pub fn with_expiry(mut self, expires_at_ms: u64) -> Self {
        self.expires_at_ms = Some(expires_at_ms);
        self
    }

    pub fn with_icon(mut self, icon: IconId) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// True once `now_ms` is strictly past the expiry. Never expires if unset.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.expires_at_ms {
            Some(expires_at) => now_ms > expires_at,
            None => false,
        }
    }

    pub fn card(&self) -> PredictionCard {
        PredictionCard {
            icon: self.icon.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            value: format!("{}{}", self.value, self.unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clearance() -> Prediction {
        Prediction::new(
            "pred-2",
            PredictionType::AccidentClearance,
            "Accident Clearance",
            "Estimated time",
            "22",
            "min",
        )
    }

    #[test]
    fn test_defaults() {
        let p = clearance();
        assert_eq!(p.confidence, 0.85);
        assert_eq!(p.icon.as_str(), "fa-car-crash");
        assert_eq!(p.expires_at_ms, None);
    }

    #[test]
    fn test_is_expired_strict() {
        let p = clearance().with_expiry(1_000);
        assert!(!p.is_expired(999));
        assert!(!p.is_expired(1_000));
        assert!(p.is_expired(1_001));
    }

    #[test]
    fn test_never_expires_without_expiry() {
        assert!(!clearance().is_expired(u64::MAX));
    }

    #[test]
    fn test_card_appends_unit() {
        assert_eq!(clearance().card().value, "22min");
    }

    #[test]
    fn test_icon_override_and_fallback() {
        let p = clearance().with_icon(IconId::from_static("fa-star"));
        assert_eq!(p.icon.as_str(), "fa-star");
        assert_eq!(prediction_icon_for("eco_score").as_str(), "fa-leaf");
        assert_eq!(prediction_icon_for("weather").as_str(), "fa-brain");
    }
}

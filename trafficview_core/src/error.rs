//! Error type for TrafficView operations.

use thiserror::Error;
use trafficview_env::EnvError;

/// Errors reported by orchestration operations.
///
/// None of these are fatal. Errors from user-facing operations (search,
/// recalculation, location) have already been surfaced as an insight by
/// the time the caller sees them, stale results included.
/// `UnknownPreference` and `InvalidConfig` come from programmatic calls and
/// are only returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    /// Location request failed (denied, unsupported or timed out)
    #[error("Geolocation failed: {0}")]
    Geolocation(#[from] EnvError),

    /// Recalculation requested with nothing loaded
    #[error("No active route")]
    NoActiveRoute,

    /// A newer route request superseded this one
    #[error("Stale result: request {issued} superseded by {latest}")]
    StaleAsyncResult { issued: u64, latest: u64 },

    /// Search submitted with a blank query
    #[error("Search query is empty")]
    EmptyQuery,

    /// Simulated search backend failure
    #[error("Route search failed for \"{0}\"")]
    SearchFailed(String),

    #[error("Unknown preference: {0}")]
    UnknownPreference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NavError {
    /// Creates a stale-result error.
    pub fn stale(issued: u64, latest: u64) -> Self {
        Self::StaleAsyncResult { issued, latest }
    }

    /// Returns true if the error only means a newer request won.
    pub fn is_stale(&self) -> bool {
        matches!(self, NavError::StaleAsyncResult { .. })
    }
}

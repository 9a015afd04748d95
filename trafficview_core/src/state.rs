//! Application state owned by the orchestrator.

use serde::Serialize;
use trafficview_env::GeoPoint;

use crate::heatmap::Heatmap;
use crate::incident::Incident;
use crate::prediction::Prediction;
use crate::preferences::UserPreferences;
use crate::route::Route;

/// Navigation state machine: `Idle --start--> Navigating --stop--> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationState {
    #[default]
    Idle,
    Navigating,
}

impl NavigationState {
    /// The state a single start/stop action leads to.
    pub fn toggled(self) -> Self {
        match self {
            NavigationState::Idle => NavigationState::Navigating,
            NavigationState::Navigating => NavigationState::Idle,
        }
    }

    pub fn is_navigating(self) -> bool {
        self == NavigationState::Navigating
    }
}

/// Everything the orchestrator tracks between operations.
#[derive(Debug, Clone, Serialize)]
pub struct AppState {
    /// Absent only before the first load
    pub current_route: Option<Route>,

    pub user_location: Option<GeoPoint>,

    pub preferences: UserPreferences,

    pub navigation: NavigationState,

    pub heatmap_visible: bool,

    pub incidents_visible: bool,

    /// Known incidents, oldest first. Live ticks append; a reload resets the
    /// list to the fixed catalog.
    pub incidents: Vec<Incident>,

    pub predictions: Vec<Prediction>,

    /// Most recent heatmap sample
    pub heatmap: Heatmap,

    /// Whether the heatmap layer has been created in the view
    pub heatmap_rendered: bool,

    /// Generation of the latest issued route request
    pub route_generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_route: None,
            user_location: None,
            preferences: UserPreferences::default(),
            navigation: NavigationState::Idle,
            heatmap_visible: true,
            incidents_visible: true,
            incidents: Vec::new(),
            predictions: Vec::new(),
            heatmap: Heatmap::default(),
            heatmap_rendered: false,
            route_generation: 0,
        }
    }
}

impl AppState {
    pub fn is_navigating(&self) -> bool {
        self.navigation.is_navigating()
    }

    /// Issues a new route request generation and returns it.
    pub fn next_route_generation(&mut self) -> u64 {
        self.route_generation += 1;
        self.route_generation
    }

    /// True if `generation` is still the latest issued.
    pub fn is_current_generation(&self, generation: u64) -> bool {
        self.route_generation == generation
    }

    /// Appends an incident, dropping the oldest beyond `limit`.
    pub fn record_incident(&mut self, incident: Incident, limit: usize) {
        self.incidents.push(incident);
        let excess = self.incidents.len().saturating_sub(limit);
        self.incidents.drain(..excess);
    }
}

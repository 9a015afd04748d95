//! Scenarios exercised by the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Start the app and verify the initial render
    Startup,

    /// Let the live-update timer run and verify every tick's effects
    LiveTraffic,

    /// Two overlapping searches; only the latest may win
    SearchRace,

    /// Recalculation with and without an active route
    Recalculate,

    /// Navigation start/stop alternation
    Navigation,

    /// Heatmap and incident layer toggles
    LayerToggle,

    /// Location success and every failure mode
    Geolocation,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Startup,
            ScenarioId::LiveTraffic,
            ScenarioId::SearchRace,
            ScenarioId::Recalculate,
            ScenarioId::Navigation,
            ScenarioId::LayerToggle,
            ScenarioId::Geolocation,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Startup => "startup",
            ScenarioId::LiveTraffic => "live_traffic",
            ScenarioId::SearchRace => "search_race",
            ScenarioId::Recalculate => "recalculate",
            ScenarioId::Navigation => "navigation",
            ScenarioId::LayerToggle => "layer_toggle",
            ScenarioId::Geolocation => "geolocation",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Startup => "Initial load: route, 4 incidents, 200-point heatmap, legend",
            ScenarioId::LiveTraffic => "Live ticks refresh speed and heatmap; one timer only",
            ScenarioId::SearchRace => "search(A) then search(B) with jittered latency; B wins",
            ScenarioId::Recalculate => "NoActiveRoute before load, clamped figures after",
            ScenarioId::Navigation => "Idle and Navigating strictly alternate",
            ScenarioId::LayerToggle => "Each flip issues exactly one layer instruction",
            ScenarioId::Geolocation => "Failures keep the previous location",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "startup" => Ok(ScenarioId::Startup),
            "live_traffic" | "livetraffic" | "live" => Ok(ScenarioId::LiveTraffic),
            "search_race" | "searchrace" => Ok(ScenarioId::SearchRace),
            "recalculate" | "recalc" => Ok(ScenarioId::Recalculate),
            "navigation" | "nav" => Ok(ScenarioId::Navigation),
            "layer_toggle" | "layertoggle" | "layers" => Ok(ScenarioId::LayerToggle),
            "geolocation" | "locate" => Ok(ScenarioId::Geolocation),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

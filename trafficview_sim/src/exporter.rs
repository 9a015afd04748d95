//! JSON exporter for session recordings.
//!
//! Captures every view and dashboard instruction a scenario issued, plus
//! the final application state, so a run can be replayed or inspected.

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use trafficview_core::AppState;
use trafficview_env::{DashboardCommand, MapCommand};

use crate::error::SimError;
use crate::world::SimWorld;

/// Complete session recording.
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Virtual duration in seconds
    pub duration_sec: f64,

    /// Final result
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Map instructions in issue order
    pub map_commands: Vec<MapCommand>,

    /// Dashboard instructions in issue order
    pub dashboard_commands: Vec<DashboardCommand>,

    /// Application state at the end of the run
    pub final_state: AppState,
}

impl SessionExport {
    /// Records everything the world has seen so far.
    pub fn capture(scenario: &str, world: &SimWorld) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed: world.config.seed,
            duration_sec: world.time(),
            passed: false,
            failure_reason: None,
            map_commands: world.map_commands(),
            dashboard_commands: world.dashboard_commands(),
            final_state: world.app.snapshot(),
        }
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

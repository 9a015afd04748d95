//! TrafficView Core - Mock Traffic Visualization & Route Navigation
//!
//! This library is the state and logic layer behind a traffic map front end:
//! 1. **Entity model**: incidents, routes, heatmaps, predictions and user
//!    preferences, with derived render descriptors (never markup)
//! 2. **Traffic data generator**: synthetic incidents, routes, heatmap
//!    samples and a single repeating live-update timer
//! 3. **Orchestration**: [`NavigationApp`] owns application state and turns
//!    user intents into state transitions and view instructions
//!
//! Rendering, geolocation, time and randomness all come from
//! `trafficview_env`, so the same core runs against a real front end or a
//! headless simulation.

pub mod app;
pub mod config;
pub mod error;
pub mod generator;
pub mod heatmap;
pub mod incident;
pub mod live;
pub mod prediction;
pub mod preferences;
pub mod route;
pub mod state;

// Re-export key types for convenience
pub use app::{Feature, NavigationApp};
pub use config::AppConfig;
pub use error::NavError;
pub use generator::{TrafficDataGenerator, TrafficUpdate, DEFAULT_CENTER};
pub use heatmap::{traffic_legend, Heatmap};
pub use incident::{
    format_time_ago, heatmap_intensity, icon_for, severity_color, Incident, IncidentId,
    IncidentType, Severity,
};
pub use live::{LiveUpdates, TimerStatus};
pub use prediction::{Prediction, PredictionType};
pub use preferences::{PreferenceKey, RouteType, UserPreferences};
pub use route::{efficiency_grade, Grade, Route};
pub use state::{AppState, NavigationState};

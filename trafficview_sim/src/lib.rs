//! TrafficView Deterministic Simulation Harness
//!
//! Runs the navigation core against recording view doubles under a paused
//! tokio clock, so every session is reproducible from a single seed.
//!
//! # Core Principle
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: the tokio clock is paused and auto-advances only when every
//!   task is parked on a timer
//! - **Randomness**: all generated traffic data comes from a ChaCha8 stream
//!   derived from the seed
//! - **View**: map and dashboard instructions are recorded, never drawn
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                       SimWorld                        │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │ current_thread runtime (paused clock)           │  │
//! │  └─────────────────────────────────────────────────┘  │
//! │        │                                              │
//! │  ┌─────▼──────────┐   instructions  ┌──────────────┐  │
//! │  │ NavigationApp  │────────────────►│ HeadlessMap  │  │
//! │  │  + generator   │────────────────►│ HeadlessDash │  │
//! │  └────────────────┘                 └──────────────┘  │
//! │        ▲                                              │
//! │  ┌─────┴──────────┐                                   │
//! │  │ SeededRandom   │                                   │
//! │  └────────────────┘                                   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use trafficview_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::SearchRace);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod runner;
mod world;
pub mod scenarios;

pub use context::{SeededRandom, SimContext};
pub use error::SimError;
pub use exporter::SessionExport;
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use world::{SimApp, SimConfig, SimWorld};

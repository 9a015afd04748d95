//! TrafficView Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the TrafficView
//! core to run against a real front end or a headless simulation.
//!
//! # Core Concept
//!
//! Everything the core cannot do purely is intercepted here:
//! - Time (`now()`, `sleep()`, `spawn()`)
//! - Randomness (`RandomSource::next_f64()`)
//! - Rendering (`MapView`, `Dashboard`)
//! - Geolocation (`MapView::request_user_location()`)
//!
//! Swapping `ThreadRandom` for a seeded or scripted source makes every
//! generated route, incident and heatmap reproducible.
//!
//! # Example
//!
//! ```ignore
//! use trafficview_env::{TrafficContext, RandomSource};
//!
//! async fn live_loop<Ctx: TrafficContext>(ctx: &Ctx, rng: &dyn RandomSource) {
//!     loop {
//!         ctx.sleep(Duration::from_secs(10)).await;
//!         let speed = rng.int_range(25, 45);
//!         publish(speed);
//!     }
//! }
//! ```

mod context;
mod error;
mod headless;
mod random;
mod tokio_impl;
mod types;
mod view;

pub use context::TrafficContext;
pub use error::EnvError;
pub use headless::{DashboardCommand, HeadlessDashboard, HeadlessMap, MapCommand};
pub use random::{RandomSource, SequenceRandom, ThreadRandom};
pub use tokio_impl::TokioContext;
pub use types::{
    AlertDescriptor, Color, ControlId, GeoPoint, GradientStop, HeatmapPoint, HeatmapStyle, IconId,
    LayerId, LegendEntry, MarkerDescriptor, MarkerShape, PredictionCard, RouteDescriptor,
    RouteStats, SpeedStats,
};
pub use view::{Dashboard, MapView};

//! SimWorld - The simulation harness container.

use crate::context::{SeededRandom, SimContext};

use std::sync::Arc;
use std::time::Duration;
use trafficview_core::{AppConfig, NavigationApp};
use trafficview_env::{
    DashboardCommand, HeadlessDashboard, HeadlessMap, MapCommand, TrafficContext,
};

/// The app type every scenario drives.
pub type SimApp = NavigationApp<SimContext, HeadlessMap, HeadlessDashboard>;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Virtual time the live-traffic scenario runs for, in seconds
    pub duration_secs: f64,

    /// Application configuration
    pub app: AppConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_secs: 60.0,
            app: AppConfig::default(),
        }
    }
}

/// The SimWorld - one app wired to a recording view layer.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared simulation context (virtual clock)
    pub context: Arc<SimContext>,

    /// Seeded randomness behind every generated value
    pub rng: Arc<SeededRandom>,

    pub map: Arc<HeadlessMap>,

    pub ui: Arc<HeadlessDashboard>,

    pub app: Arc<SimApp>,
}

impl SimWorld {
    /// Creates a world whose location requests report `Unsupported`.
    ///
    /// Must be called from within the simulation runtime.
    pub fn new(config: SimConfig) -> Self {
        Self::with_map(config, HeadlessMap::new())
    }

    /// Creates a world around a preconfigured map.
    pub fn with_map(config: SimConfig, map: HeadlessMap) -> Self {
        let context = SimContext::shared(config.seed);
        let rng = context.random_source();
        let map = Arc::new(map);
        let ui = Arc::new(HeadlessDashboard::new());

        let app = SimApp::shared(
            Arc::clone(&context),
            Arc::clone(&map),
            Arc::clone(&ui),
            rng.clone(),
            config.app.clone(),
        );

        Self {
            config,
            context,
            rng,
            map,
            ui,
            app,
        }
    }

    /// Lets virtual time pass; spawned tasks run meanwhile.
    pub async fn advance(&self, duration: Duration) {
        self.context.sleep(duration).await;
    }

    /// Returns the current simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.context.now().as_secs_f64()
    }

    /// Number of live traffic samples applied so far.
    pub fn tick_count(&self) -> usize {
        self.app.generator().recent_updates().len()
    }

    pub fn map_commands(&self) -> Vec<MapCommand> {
        self.map.commands()
    }

    pub fn dashboard_commands(&self) -> Vec<DashboardCommand> {
        self.ui.commands()
    }
}

//! Simulation context implementing TrafficContext for deterministic runs.

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::trace;
use trafficview_env::{RandomSource, TrafficContext};

/// Simulation context backed by the tokio clock and a fixed epoch.
///
/// Meant to run inside a current-thread runtime with a paused clock:
/// - `sleep` parks the task until tokio auto-advances virtual time
/// - `system_time` is the fixed epoch plus elapsed virtual time, so
///   timestamps in a run depend only on the seed
/// - spawned tasks share the runtime's single thread
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Virtual time zero
    start: Instant,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    ///
    /// Must be called from within the runtime whose clock it reads.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start: Instant::now(),
            epoch: UNIX_EPOCH + Duration::from_secs(1704067200), // 2024-01-01 00:00:00 UTC
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Seeded random source for the generator, derived from the master seed.
    pub fn random_source(&self) -> Arc<SeededRandom> {
        Arc::new(SeededRandom::new(self.seed.wrapping_mul(0x9e3779b97f4a7c15)))
    }
}

#[async_trait]
impl TrafficContext for SimContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        trace!(task = name, seed = self.seed, "spawning sim task");
        tokio::spawn(future);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// ChaCha8-backed [`RandomSource`]. Same seed, same sequence.
pub struct SeededRandom {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen::<f64>()
    }
}

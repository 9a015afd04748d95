//! Repeating live-update timer.
//!
//! At most one timer loop is active per [`LiveUpdates`]. Every start bumps
//! an epoch; a loop whose epoch is no longer current exits at its next
//! wake-up without ticking.

use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use trafficview_env::TrafficContext;

/// Timer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct TimerState {
    status: TimerStatus,
    epoch: u64,
}

impl TimerState {
    fn is_current(&self, epoch: u64) -> bool {
        self.status == TimerStatus::Running && self.epoch == epoch
    }
}

/// Handle to the single live-update timer.
#[derive(Debug, Clone, Default)]
pub struct LiveUpdates {
    state: Arc<Mutex<TimerState>>,
}

impl LiveUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        self.lock().status
    }

    pub fn is_running(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    /// Starts the timer. `on_tick` runs once per `interval` until the timer
    /// is stopped or the callback breaks.
    ///
    /// Returns false (and spawns nothing) if the timer is already running.
    pub fn start<Ctx, F>(&self, ctx: Arc<Ctx>, interval: Duration, mut on_tick: F) -> bool
    where
        Ctx: TrafficContext,
        F: FnMut(&Ctx) -> ControlFlow<()> + Send + 'static,
    {
        let epoch = {
            let mut state = self.lock();
            if state.status == TimerStatus::Running {
                debug!("Live updates already running");
                return false;
            }
            state.status = TimerStatus::Running;
            state.epoch += 1;
            state.epoch
        };

        info!(epoch, interval_ms = interval.as_millis() as u64, "Live updates started");

        let timer = self.clone();
        let task_ctx = Arc::clone(&ctx);
        ctx.spawn("live-updates", async move {
            loop {
                task_ctx.sleep(interval).await;
                if !timer.lock().is_current(epoch) {
                    debug!(epoch, "Stale live-update loop exiting");
                    break;
                }
                if on_tick(task_ctx.as_ref()).is_break() {
                    timer.finish(epoch);
                    break;
                }
            }
        });

        true
    }

    /// Stops the timer. Safe to call when idle.
    pub fn stop(&self) {
        let mut state = self.lock();
        if state.status == TimerStatus::Running {
            state.status = TimerStatus::Idle;
            info!(epoch = state.epoch, "Live updates stopped");
        }
    }

    fn finish(&self, epoch: u64) {
        let mut state = self.lock();
        if state.epoch == epoch {
            state.status = TimerStatus::Idle;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Polling monitor for internally detected FRUs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::InventoryEngine;

/// Default poll period (5 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Not polling. Stays here when the platform has nothing to sample.
    Idle,
    Running,
    /// Shut down by the cancellation token.
    Stopped,
}

/// Periodically calls `check_internal_hotplug_frus` on the engine.
pub struct HotplugMonitor {
    engine: Arc<InventoryEngine>,
    interval: Duration,
    state: Arc<watch::Sender<MonitorState>>,
}

impl HotplugMonitor {
    pub fn new(engine: Arc<InventoryEngine>, interval: Duration) -> Self {
        let (state, _) = watch::channel(MonitorState::Idle);
        Self {
            engine,
            interval,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    /// Start polling if the platform has any internally detected FRU.
    ///
    /// Returns the polling task, or `None` when the monitor stays idle (nothing
    /// to sample, or already started).
    pub async fn start(&self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        if self.state() != MonitorState::Idle {
            debug!("Hot-plug monitor already started");
            return None;
        }

        let count = self.engine.count_internally_detectable_frus().await;
        if count == 0 {
            info!("No internally detectable FRUs; hot-plug monitor idle");
            return None;
        }

        info!(
            "Hot-plug monitor polling {} FRU(s) every {:?}",
            count, self.interval
        );
        self.state.send_replace(MonitorState::Running);

        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        let period = self.interval;
        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let transitions = engine.check_internal_hotplug_frus().await;
                        if transitions > 0 {
                            debug!("Hot-plug scan: {} transition(s)", transitions);
                        }
                    }
                }
            }

            state.send_replace(MonitorState::Stopped);
            info!("Hot-plug monitor stopped");
        }))
    }
}

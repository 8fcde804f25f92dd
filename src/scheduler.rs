//! Tick scheduler: drives a simulation at a fixed cadence until the series
//! ends or shutdown is requested.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::models::StepRecord;
use crate::simulation::Simulation;

/// How a scheduled run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The series was exhausted.
    Finished { ticks: usize },
    /// Shutdown was requested before the end.
    Stopped { ticks: usize },
}

impl RunOutcome {
    pub fn ticks(&self) -> usize {
        match self {
            RunOutcome::Finished { ticks } | RunOutcome::Stopped { ticks } => *ticks,
        }
    }
}

pub struct TickScheduler {
    cadence: Duration,
    shutdown: Arc<AtomicBool>,
}

impl TickScheduler {
    pub fn new(cadence: Duration) -> Self {
        // tokio's interval panics on a zero period
        let cadence = if cadence.is_zero() {
            Duration::from_millis(1)
        } else {
            cadence
        };

        Self {
            cadence,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Handle for stopping the scheduler from elsewhere.
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Set the shutdown flag on Ctrl+C.
    pub fn stop_on_ctrl_c(&self) {
        let shutdown = self.shutdown_signal();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    /// Advance `sim` once per tick, handing each new record to `on_step`.
    pub async fn run<F>(&self, sim: &mut Simulation, mut on_step: F) -> RunOutcome
    where
        F: FnMut(&StepRecord),
    {
        info!(
            strategy = %sim.strategy(),
            cadence_ms = self.cadence.as_millis() as u64,
            ticks = sim.series().last_index(),
            "Starting tick loop"
        );

        let mut ticker = interval(self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0;

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                info!(ticks, "Tick loop stopped");
                return RunOutcome::Stopped { ticks };
            }

            ticker.tick().await;

            match sim.step() {
                Some(record) => {
                    ticks += 1;
                    debug!(tick = ticks, index = record.index, "Tick");
                    on_step(record);
                }
                None => {
                    info!(ticks, "Series exhausted");
                    return RunOutcome::Finished { ticks };
                }
            }
        }
    }
}

// src/pipeline/scheduler.rs

//! Periodic driver for the pipeline runner.
//!
//! Cycles are awaited inline in the tick loop, so at most one runs at a
//! time. Ticks missed during a long cycle are skipped, not replayed.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::models::ScheduleConfig;
use crate::pipeline::runner::PipelineRunner;

/// Runs cycles on an interval until stopped.
pub struct Scheduler {
    runner: PipelineRunner,
    config: ScheduleConfig,
}

/// Handle to a started scheduler.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit.
    ///
    /// A cycle in flight is dropped at its next await point.
    pub async fn stop(self) {
        // The receiver is gone only if the loop already exited
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            log::error!("Scheduler task ended abnormally: {}", e);
        }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Scheduler {
    pub fn new(runner: PipelineRunner, config: ScheduleConfig) -> Self {
        Self { runner, config }
    }

    /// Spawn the loop onto the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        SchedulerHandle { shutdown, task }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Scheduler started with interval of {} seconds",
            self.config.interval_secs
        );

        if self.config.run_on_start && self.cycle(&mut shutdown).await {
            return;
        }

        if !self.config.initial_delay().is_zero() {
            log::debug!(
                "Waiting {}s before the first scheduled cycle",
                self.config.initial_delay_secs
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.initial_delay()) => {}
                _ = shutdown.changed() => {
                    log::info!("Scheduler stopped");
                    return;
                }
            }
        }

        // After a start-up cycle the next one is a full interval away
        let first_tick = if self.config.run_on_start {
            Instant::now() + self.config.interval()
        } else {
            Instant::now()
        };
        let mut ticker = interval_at(first_tick, self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if self.cycle(&mut shutdown).await {
                return;
            }
        }
        log::info!("Scheduler stopped");
    }

    /// Run one cycle unless shutdown arrives first. Returns `true` on shutdown.
    async fn cycle(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            result = self.runner.run_cycle() => {
                if let Err(e) = result {
                    if e.is_cycle_fatal() {
                        log::warn!("Cycle aborted, next attempt on the next tick: {}", e);
                    } else {
                        log::error!("Unexpected cycle error: {}", e);
                    }
                }
                false
            }
            _ = shutdown.changed() => {
                log::warn!("Scheduler stopped during a cycle; unfinished listing left unrecorded");
                true
            }
        }
    }
}

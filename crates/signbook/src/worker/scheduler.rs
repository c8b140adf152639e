//! Fixed-interval scheduler for a `ScheduledTask`.
//!
//! The loop runs on its own thread with a current-thread tokio runtime. The
//! first cycle starts immediately; a cycle that overruns the interval delays
//! the next tick instead of bursting. A manual trigger arrives over a
//! broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::error::WorkerError;

use super::task::{CycleReport, ScheduledTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// Another cycle of the same task was still running.
    Skipped,
}

pub struct IntervalScheduler<T: ScheduledTask> {
    task: Arc<T>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl<T: ScheduledTask> IntervalScheduler<T> {
    pub fn new(task: Arc<T>, interval: Duration) -> Self {
        Self {
            task,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one cycle on the calling thread unless one is already running.
    pub fn run_now(&self) -> CycleOutcome {
        run_guarded(self.task.as_ref(), &self.running)
    }

    pub fn is_cycle_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start the loop in a background thread.
    /// Accepts a trigger receiver for manual runs.
    pub fn start(
        &self,
        mut trigger_rx: broadcast::Receiver<()>,
    ) -> Result<JoinHandle<()>, WorkerError> {
        let task = Arc::clone(&self.task);
        let shutdown = Arc::clone(&self.shutdown);
        let running = Arc::clone(&self.running);
        let interval = self.interval;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        std::thread::Builder::new()
            .name(format!("{}-scheduler", task.name()))
            .spawn(move || {
                rt.block_on(async {
                    let mut interval_timer = tokio::time::interval(interval);
                    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

                    log::info!(
                        "Scheduler '{}' started, interval {:?}",
                        task.name(),
                        interval
                    );

                    loop {
                        if shutdown.load(Ordering::Acquire) {
                            break;
                        }

                        tokio::select! {
                            _ = interval_timer.tick() => {},
                            Ok(()) = trigger_rx.recv() => {
                                log::info!("Manual run of '{}' triggered", task.name());
                            },
                        }

                        if shutdown.load(Ordering::Acquire) {
                            break;
                        }

                        if let CycleOutcome::Skipped = run_guarded(task.as_ref(), &running) {
                            log::debug!("Cycle of '{}' still running, tick skipped", task.name());
                        }
                    }

                    log::info!("Scheduler '{}' stopped", task.name());
                });
            })
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))
    }

    /// Signals the scheduler to stop. A running cycle finishes first.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// Clears the running flag even if the cycle panics.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn run_guarded<T: ScheduledTask>(task: &T, running: &AtomicBool) -> CycleOutcome {
    if running
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return CycleOutcome::Skipped;
    }
    let _guard = RunningGuard(running);
    CycleOutcome::Completed(task.run_cycle())
}

//! Scheduled pipeline task — an owned handle, not ambient process state.
//!
//! One background thread drives `run_once` on a fixed cadence. The handle
//! owns the thread: `stop()` (or drop) shuts it down responsively via a
//! condvar rather than a sleep. A run-lock excludes re-entry — a manual
//! `run_now` while the scheduled run is mid-flight reports `RunInProgress`
//! instead of overlapping, and the scheduled loop itself cannot tick again
//! until the prior invocation returns.

use crate::config::PipelineConfig;
use crate::pipeline::{run_once, RunError, RunReport};
use crate::store::ForecastStore;
use fincast_core::data::PriceProvider;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use tracing::{error, info, warn};

struct Shared {
    config: PipelineConfig,
    provider: Arc<dyn PriceProvider>,
    store: Arc<dyn ForecastStore>,
    stop: Mutex<bool>,
    wake: Condvar,
    run_lock: Mutex<()>,
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    /// Execute one invocation under the run-lock.
    fn run_guarded(&self) -> Result<RunReport, RunError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| RunError::RunInProgress)?;
        let as_of = chrono::Local::now().date_naive();
        run_once(
            &self.config,
            self.provider.as_ref(),
            self.store.as_ref(),
            as_of,
        )
    }
}

/// Owned scheduled-task handle with a start/stop lifecycle.
pub struct ScheduledPipeline {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledPipeline {
    /// Spawn the background task. The first invocation fires one full
    /// cadence interval after start, matching an every-N-hours schedule.
    pub fn start(
        config: PipelineConfig,
        provider: Arc<dyn PriceProvider>,
        store: Arc<dyn ForecastStore>,
    ) -> Self {
        let cadence = config.cadence();
        let shared = Arc::new(Shared {
            config,
            provider,
            store,
            stop: Mutex::new(false),
            wake: Condvar::new(),
            run_lock: Mutex::new(()),
        });

        let worker = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            info!(cadence_secs = cadence.as_secs(), "scheduler started");
            loop {
                let guard = lock_ignoring_poison(&worker.stop);
                let (guard, _) = worker
                    .wake
                    .wait_timeout_while(guard, cadence, |stopped| !*stopped)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if *guard {
                    break;
                }
                drop(guard);

                match worker.run_guarded() {
                    Ok(report) => info!(
                        succeeded = report.runs.len(),
                        failed = report.failures.len(),
                        "scheduled run finished"
                    ),
                    Err(RunError::RunInProgress) => {
                        warn!("previous invocation still running; tick skipped")
                    }
                    Err(e) => error!(error = %e, "scheduled run aborted"),
                }
            }
            info!("scheduler stopped");
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Trigger an invocation immediately, subject to the same run-lock as
    /// the scheduled ticks.
    pub fn run_now(&self) -> Result<RunReport, RunError> {
        self.shared.run_guarded()
    }

    /// Signal the background thread and join it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            *lock_ignoring_poison(&self.shared.stop) = true;
            self.shared.wake.notify_all();
            let _ = handle.join();
        }
    }
}

impl Drop for ScheduledPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

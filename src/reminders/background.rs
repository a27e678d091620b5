//! Background reminder loop on a dedicated thread.
//!
//! Ticks on a fixed interval and sleeps in short increments so a stop
//! request is seen promptly. A sweep in progress always runs to the end.
//! A panicking tick is caught and logged; the loop keeps going.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::db::Database;
use crate::notify::MessageTransport;
use crate::registry::Registry;

use super::clock::Clock;
use super::sweep::{run_tick, SweepError, TickOutcome};
use super::window::ReminderWindow;

/// Default tick interval: every 5 minutes.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 5 * 60;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(250);

/// Everything one tick needs. Each tick opens its own connection.
pub struct ReminderScheduler {
    pub db: Database,
    pub registry: Arc<Registry>,
    pub transport: Arc<dyn MessageTransport>,
    pub clock: Arc<dyn Clock>,
    pub window: ReminderWindow,
    pub interval: Duration,
}

impl ReminderScheduler {
    pub fn tick(&self) -> Result<TickOutcome, SweepError> {
        let conn = self.db.open()?;
        run_tick(
            &conn,
            &self.registry,
            self.transport.as_ref(),
            &self.window,
            self.clock.now(),
        )
    }
}

/// Handle for the reminder thread. Dropping it stops the loop and waits
/// for the thread to exit.
pub struct ReminderSchedulerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReminderSchedulerHandle {
    /// Request shutdown. A sweep already running finishes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for ReminderSchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

pub fn start_reminder_scheduler(scheduler: ReminderScheduler) -> ReminderSchedulerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            interval_secs = scheduler.interval.as_secs(),
            at = %scheduler.window.at,
            "Reminder scheduler started"
        );
        scheduler_loop(&scheduler, &flag);
    });

    ReminderSchedulerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn scheduler_loop(scheduler: &ReminderScheduler, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        match catch_unwind(AssertUnwindSafe(|| scheduler.tick())) {
            Ok(Ok(TickOutcome::Swept(summary))) => {
                tracing::debug!(sweep_id = %summary.sweep_id, "Reminder tick swept");
            }
            Ok(Ok(outcome)) => tracing::trace!(?outcome, "Reminder tick"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Reminder tick failed"),
            Err(payload) => tracing::error!(
                panic = panic_message(payload.as_ref()),
                "Reminder tick panicked"
            ),
        }

        let started = Instant::now();
        while started.elapsed() < scheduler.interval {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(SLEEP_GRANULARITY.min(scheduler.interval));
        }
    }
    tracing::info!("Reminder scheduler shutting down");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

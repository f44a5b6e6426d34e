//! Recurring timers for background work.
//!
//! Both the poller and the metrics aggregator run on a [`ScheduledTask`].
//! The tick action is synchronous and is expected to hand any network work
//! off to its own task, so a slow request never holds back the next tick.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Action run on every tick.
pub type TickAction = Arc<dyn Fn() + Send + Sync>;

/// A periodic timer that can be started and stopped.
pub trait ScheduledTask: Send + Sync {
    /// Run `action` on `runtime` every `interval`, first one `interval` from now.
    ///
    /// Starting an already running task is a no-op.
    fn start(&self, runtime: &Handle, interval: Duration, action: TickAction);

    /// Cancel the schedule. Idempotent, and safe before `start`.
    fn stop(&self);

    fn is_running(&self) -> bool;
}

struct Running {
    shutdown_tx: oneshot::Sender<()>,
    active: Arc<AtomicBool>,
}

/// [`ScheduledTask`] backed by a tokio interval.
pub struct IntervalTask {
    name: &'static str,
    running: Mutex<Option<Running>>,
}

impl IntervalTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Mutex::new(None),
        }
    }
}

impl ScheduledTask for IntervalTask {
    fn start(&self, runtime: &Handle, period: Duration, action: TickAction) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        // Per-run flag: a stopped loop stays stopped across restarts.
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let active = Arc::new(AtomicBool::new(true));
        *running = Some(Running {
            shutdown_tx,
            active: Arc::clone(&active),
        });

        let name = self.name;
        let first_tick = Instant::now() + period;

        runtime.spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => {
                        tracing::debug!("{} timer shutting down", name);
                        break;
                    }
                    _ = ticker.tick() => {
                        if !active.load(Ordering::SeqCst) {
                            break;
                        }
                        action();
                    }
                }
            }
        });

        tracing::debug!("{} timer started with interval {:?}", self.name, period);
    }

    fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        running.active.store(false, Ordering::SeqCst);
        let _ = running.shutdown_tx.send(());

        tracing::debug!("{} timer stopped", self.name);
    }

    fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}

impl Drop for IntervalTask {
    fn drop(&mut self) {
        self.stop();
    }
}

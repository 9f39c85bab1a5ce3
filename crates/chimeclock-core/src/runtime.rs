//! Repeating tasks that drive a [`ClockController`].
//!
//! Three timers feed the controller: the sub-second poll, the clock face
//! refresh, and the warble alternation. The first two live as long as the
//! runtime. The warble timer exists only while the controller is ringing;
//! it is started and stopped whenever an operation changes the ringing
//! state, and it also ends itself if it finds nothing left to alternate.
//!
//! The controller sits behind a `std::sync::Mutex` that is never held across
//! an `.await`, so every controller operation runs to completion before any
//! other task can observe or change its state.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::clock::Clock;
use crate::controller::ClockController;
use crate::events::Event;
use crate::storage::TimingConfig;

pub type SharedController = Arc<Mutex<ClockController>>;

fn lock(controller: &SharedController) -> MutexGuard<'_, ClockController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A closure run every `period` on the tokio runtime until it breaks or the
/// task is stopped. Dropping the task stops it.
#[derive(Debug)]
pub struct RepeatingTask {
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    /// The first run happens one `period` after spawning.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if f().is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type WarbleSlot = Arc<Mutex<Option<RepeatingTask>>>;

/// Start or stop the warble timer to match the controller's ringing state.
fn sync_warble(controller: &SharedController, slot: &WarbleSlot) {
    let period = lock(controller).warble_period();
    let mut slot_guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    match period {
        Some(period) => {
            if slot_guard.as_ref().map_or(true, RepeatingTask::is_finished) {
                let controller = Arc::clone(controller);
                *slot_guard = Some(RepeatingTask::spawn(period, move || {
                    match lock(&controller).alternate_warble() {
                        Some(_) => ControlFlow::Continue(()),
                        None => ControlFlow::Break(()),
                    }
                }));
            }
        }
        None => {
            if let Some(task) = slot_guard.take() {
                task.stop();
            }
        }
    }
}

fn forward(tx: &mpsc::UnboundedSender<Event>, events: Vec<Event>) {
    for event in events {
        // A dropped receiver just means nobody is listening.
        let _ = tx.send(event);
    }
}

/// Owns the controller and the timers that drive it.
pub struct ClockRuntime {
    controller: SharedController,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<Event>,
    poll: RepeatingTask,
    display: RepeatingTask,
    warble: WarbleSlot,
}

impl ClockRuntime {
    /// Start driving `controller`. Events from timers and from
    /// [`apply`](Self::apply) arrive on the returned receiver.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        controller: ClockController,
        clock: Arc<dyn Clock>,
        timing: &TimingConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Arc::new(Mutex::new(controller));
        let warble: WarbleSlot = Arc::new(Mutex::new(None));

        lock(&controller).refresh_display(clock.now());

        let poll = {
            let controller = Arc::clone(&controller);
            let clock = Arc::clone(&clock);
            let warble = Arc::clone(&warble);
            let tx = tx.clone();
            RepeatingTask::spawn(timing.poll_interval(), move || {
                let events = lock(&controller).poll(clock.now());
                if !events.is_empty() {
                    sync_warble(&controller, &warble);
                    forward(&tx, events);
                }
                ControlFlow::Continue(())
            })
        };

        let display = {
            let controller = Arc::clone(&controller);
            let clock = Arc::clone(&clock);
            RepeatingTask::spawn(timing.display_interval(), move || {
                lock(&controller).refresh_display(clock.now());
                ControlFlow::Continue(())
            })
        };

        tracing::debug!(
            poll_ms = timing.poll_interval_ms,
            display_ms = timing.display_interval_ms,
            "clock runtime started"
        );

        let runtime = Self {
            controller,
            clock,
            events: tx,
            poll,
            display,
            warble,
        };
        (runtime, rx)
    }

    pub fn controller(&self) -> SharedController {
        Arc::clone(&self.controller)
    }

    pub fn now(&self) -> chrono::NaiveDateTime {
        self.clock.now()
    }

    /// Run a user operation on the controller, publish its events and
    /// bring the warble timer in line with the result.
    pub fn apply<F>(&self, op: F)
    where
        F: FnOnce(&mut ClockController) -> Vec<Event>,
    {
        let events = op(&mut lock(&self.controller));
        sync_warble(&self.controller, &self.warble);
        forward(&self.events, events);
    }

    pub fn is_warble_timer_running(&self) -> bool {
        self.warble
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop every timer and silence the warble.
    pub fn shutdown(self) {
        self.poll.stop();
        self.display.stop();
        if let Some(task) = self
            .warble
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.stop();
        }
        let stopped = lock(&self.controller).stop_warble();
        forward(&self.events, stopped.into_iter().collect());
        tracing::debug!("clock runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::AlarmTime;
    use crate::clock::ManualClock;
    use crate::storage::Config;
    use crate::tone::{OfflineBackend, VoiceId};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_task_runs_until_break() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let task = RepeatingTask::spawn(Duration::from_millis(100), move || {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_task_runs_no_more() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let task = RepeatingTask::spawn(Duration::from_millis(100), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        time::sleep(Duration::from_millis(250)).await;
        task.stop();
        let before = count.load(Ordering::SeqCst);
        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn alarm_rings_warbles_and_clears() {
        let mut config = Config::default();
        config.audio.tick_enabled = false;
        let backend = OfflineBackend::new(8_000);
        let graph = backend.graph();
        let clock = ManualClock::new(at(7, 29, 59));

        let controller = ClockController::new(&config, Box::new(backend));
        let (runtime, mut events) =
            ClockRuntime::start(controller, Arc::new(clock.clone()), &config.timing);
        runtime.apply(|c| c.set_alarm_input("07:30"));

        time::sleep(Duration::from_millis(250)).await;
        clock.set(at(7, 30, 0));
        time::sleep(Duration::from_millis(200)).await;
        assert!(runtime.controller().lock().unwrap().is_ringing());
        assert!(runtime.is_warble_timer_running());

        time::sleep(Duration::from_millis(360)).await;
        assert_eq!(graph.lock().unwrap().voice_frequency(VoiceId(0)), Some(880.0));

        runtime.apply(|c| c.clear_alarm());
        assert!(!runtime.is_warble_timer_running());
        assert_eq!(graph.lock().unwrap().active_voices(), 0);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&Event::AlarmSet {
            time: AlarmTime::new(7, 30)
        }));
        assert!(seen.contains(&Event::WarbleStarted {
            time: AlarmTime::new(7, 30)
        }));
        assert!(seen.contains(&Event::WarbleStopped));
        runtime.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_silences_ringing_alarm() {
        let config = Config::default();
        let backend = OfflineBackend::new(8_000);
        let graph = backend.graph();
        let controller = ClockController::new(&config, Box::new(backend));
        let clock = ManualClock::new(at(12, 0, 0));
        let (runtime, _events) = ClockRuntime::start(controller, Arc::new(clock), &config.timing);

        runtime.apply(|c| c.test_alarm(None));
        let shared = runtime.controller();
        assert!(shared.lock().unwrap().is_ringing());

        runtime.shutdown();
        assert!(!shared.lock().unwrap().is_ringing());
        assert_eq!(graph.lock().unwrap().active_voices(), 0);
    }
}

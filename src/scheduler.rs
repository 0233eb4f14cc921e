//! Autoplay timer: a background task that advances the carousel on a fixed
//! period until it is canceled.
//!
//! ## Rust concepts
//! - `tokio::time::interval_at` so the first tick lands one period after start
//! - `tokio::select!` to wait on the timer and a restart signal at once
//! - `Drop` to tie the task's lifetime to its handle

use crate::slides::ConfigurationError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// What manual navigation does to the autoplay timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AutoplayPolicy {
    /// Ticks stay on the wall-clock cadence set when autoplay started.
    #[default]
    FixedCadence,
    /// A manual navigation restarts the period, so the next automatic
    /// advance happens one full period after the user's last action.
    ResetOnNavigation,
}

/// Builds autoplay tasks with a fixed period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoAdvanceScheduler {
    period: Duration,
}

impl AutoAdvanceScheduler {
    pub fn new(period: Duration) -> Result<Self, ConfigurationError> {
        if period.is_zero() {
            return Err(ConfigurationError::InvalidAutoplayPeriod(period));
        }
        Ok(Self { period })
    }

    /// Spawn the timer task; `on_tick` runs once per elapsed period.
    ///
    /// Must be called from within a Tokio runtime. The first tick fires one
    /// full period after this call.
    pub fn start<F>(&self, mut on_tick: F) -> AutoplayHandle
    where
        F: FnMut() + Send + 'static,
    {
        let period = self.period;
        let cancelled = Arc::new(AtomicBool::new(false));
        let restart = Arc::new(Notify::new());

        let task = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let restart = Arc::clone(&restart);
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            // A cancel that raced this tick wins.
                            if cancelled.load(Ordering::SeqCst) {
                                break;
                            }
                            on_tick();
                        }
                        _ = restart.notified() => {
                            ticker.reset();
                        }
                    }
                }
            }
        });

        tracing::debug!("Autoplay started with a period of {}ms", period.as_millis());

        AutoplayHandle {
            cancelled,
            restart,
            task,
        }
    }
}

/// Owned handle to a running autoplay task.
///
/// Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct AutoplayHandle {
    cancelled: Arc<AtomicBool>,
    restart: Arc<Notify>,
    task: JoinHandle<()>,
}

impl AutoplayHandle {
    /// Stop the timer. No tick starts after this returns; a tick callback
    /// already running is allowed to finish.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.task.abort();
            tracing::debug!("Autoplay cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Start a fresh period from now.
    pub fn restart_period(&self) {
        self.restart.notify_one();
    }
}

impl Drop for AutoplayHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    const PERIOD: Duration = Duration::from_millis(5000);

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        (ticks, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(
            AutoAdvanceScheduler::new(Duration::ZERO).unwrap_err(),
            ConfigurationError::InvalidAutoplayPeriod(Duration::ZERO)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_period_never_ticks() {
        let (ticks, on_tick) = counting();
        let handle = AutoAdvanceScheduler::new(PERIOD).unwrap().start(on_tick);
        handle.cancel();

        sleep(PERIOD * 4).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (ticks, on_tick) = counting();
        let _handle = AutoAdvanceScheduler::new(PERIOD).unwrap().start(on_tick);

        sleep(PERIOD / 2).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        sleep(PERIOD * 3).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_cancel() {
        let (ticks, on_tick) = counting();
        let handle = AutoAdvanceScheduler::new(PERIOD).unwrap().start(on_tick);

        sleep(PERIOD * 2 + PERIOD / 2).await;
        handle.cancel();
        let seen = ticks.load(Ordering::SeqCst);

        sleep(PERIOD * 5).await;
        assert_eq!(seen, 2);
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let (ticks, on_tick) = counting();
        drop(AutoAdvanceScheduler::new(PERIOD).unwrap().start(on_tick));

        sleep(PERIOD * 3).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pushes_the_next_tick_back() {
        let (ticks, on_tick) = counting();
        let handle = AutoAdvanceScheduler::new(PERIOD).unwrap().start(on_tick);

        // t = 3s: restart, so the next tick moves from 5s to 8s.
        sleep(Duration::from_millis(3000)).await;
        handle.restart_period();

        sleep(Duration::from_millis(3000)).await; // t = 6s
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2500)).await; // t = 8.5s
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}

//! Debounced renumber scheduling
//!
//! # Semantics
//! - [`RenumberScheduler::schedule`] cancels the pending timer and starts a
//!   new one, so a burst of edits collapses into one pass
//! - a timer that fires while a pass is executing waits another delay
//! - a pass that has started always runs to completion
//!
//! There is no queue: at most one timer is pending and at most one pass runs.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Default debounce delay
pub const DEFAULT_RENUMBER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Scheduler errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// `schedule` was called outside a Tokio runtime
    #[error("no tokio runtime available to schedule renumbering")]
    NoRuntime,
}

type Job = Box<dyn Fn() + Send + Sync>;

struct Inner {
    delay: Duration,
    job: Job,
    pending: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    completed: AtomicU64,
}

/// Debounced runner for a synchronous renumber pass
#[derive(Clone)]
pub struct RenumberScheduler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RenumberScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenumberScheduler")
            .field("delay", &self.inner.delay)
            .field("pending", &self.pending())
            .field("running", &self.is_running())
            .field("completed", &self.completed_runs())
            .finish_non_exhaustive()
    }
}

impl RenumberScheduler {
    /// Create scheduler running `job` after `delay` of quiet
    pub fn new<F>(delay: Duration, job: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                delay,
                job: Box::new(job),
                pending: Mutex::new(None),
                running: AtomicBool::new(false),
                completed: AtomicU64::new(0),
            }),
        }
    }

    /// Debounce delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// (Re)start the debounce timer
    ///
    /// # Errors
    /// Returns [`SchedulerError::NoRuntime`] outside a Tokio runtime.
    pub fn schedule(&self) -> Result<(), SchedulerError> {
        let handle = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let mut pending = self.inner.pending.lock();
        if let Some(previous) = pending.take() {
            // a task already inside its pass has no await point left to cancel at
            previous.abort();
        }
        let inner = Arc::clone(&self.inner);
        *pending = Some(handle.spawn(run_after_delay(inner)));
        tracing::debug!(delay_ms = saturating_u64(self.inner.delay.as_millis()), "renumber scheduled");
        Ok(())
    }

    /// Run the pass immediately unless one is executing
    ///
    /// Returns whether the pass ran.
    pub fn run_now(&self) -> bool {
        match RunGuard::acquire(&self.inner.running) {
            Some(guard) => {
                run_pass(&self.inner, guard);
                true
            }
            None => {
                tracing::debug!("renumber pass already running");
                false
            }
        }
    }

    /// Drop the pending timer, if any
    pub fn cancel(&self) -> bool {
        match self.inner.pending.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// A timer is waiting to fire
    #[must_use]
    pub fn pending(&self) -> bool {
        !self.is_running()
            && self
                .inner
                .pending
                .lock()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// A pass is executing
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Passes completed so far
    #[inline]
    #[must_use]
    pub fn completed_runs(&self) -> u64 {
        self.inner.completed.load(Ordering::Acquire)
    }
}

/// Re-entrancy guard; clears the flag even if the pass panics
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn run_after_delay(inner: Arc<Inner>) {
    let guard = loop {
        tokio::time::sleep(inner.delay).await;
        if let Some(guard) = RunGuard::acquire(&inner.running) {
            break guard;
        }
        tracing::debug!("renumber pass in flight, deferring");
    };
    run_pass(&inner, guard);
}

fn run_pass(inner: &Inner, guard: RunGuard<'_>) {
    let started = Instant::now();
    (inner.job)();
    inner.completed.fetch_add(1, Ordering::AcqRel);
    drop(guard);
    tracing::info!(
        elapsed_us = saturating_u64(started.elapsed().as_micros()),
        "renumber pass completed"
    );
}

fn saturating_u64(n: u128) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(delay_ms: u64) -> (RenumberScheduler, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let scheduler = RenumberScheduler::new(Duration::from_millis(delay_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (scheduler, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_triggers_runs_once() {
        let (scheduler, runs) = counting(500);
        scheduler.schedule().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.schedule().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.schedule().unwrap();
        assert!(scheduler.pending());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.completed_runs(), 1);
        assert!(!scheduler.pending());
    }

    #[tokio::test(start_paused = true)]
    async fn fired_timer_waits_for_running_pass() {
        let (scheduler, runs) = counting(100);
        scheduler.inner.running.store(true, Ordering::SeqCst);
        scheduler.schedule().unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(scheduler.inner.pending.lock().as_ref().is_some_and(|h| !h.is_finished()));

        scheduler.inner.running.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_run() {
        let (scheduler, runs) = counting(100);
        scheduler.schedule().unwrap();
        assert!(scheduler.cancel());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!scheduler.cancel());
    }

    #[test]
    fn run_now_respects_guard() {
        let (scheduler, runs) = counting(100);
        assert!(scheduler.run_now());
        scheduler.inner.running.store(true, Ordering::SeqCst);
        assert!(!scheduler.run_now());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.completed_runs(), 1);
    }

    #[test]
    fn schedule_outside_runtime_fails() {
        let (scheduler, _) = counting(100);
        assert_eq!(scheduler.schedule(), Err(SchedulerError::NoRuntime));
    }

    #[test]
    fn log_durations_saturate() {
        assert_eq!(saturating_u64(Duration::from_millis(250).as_millis()), 250);
        assert_eq!(saturating_u64(Duration::MAX.as_micros()), u64::MAX);
    }
}

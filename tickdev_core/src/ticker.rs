//! Self-rearming periodic ticker.
//!
//! Fires on its own cadence independent of any I/O, incrementing
//! `tick_count` under the device lock and re-arming for `now + period`.
//! The callback body is restricted to a bounded, non-blocking field update.
//!
//! Cancellation happens only at device teardown and is synchronous: once
//! [`PeriodicTicker::cancel`] returns, the worker thread has been joined and
//! no further firing can occur. A `reset` command re-arms the deadline
//! without stopping the ticker.

use crate::state::SharedState;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

struct TickerInner {
    state: SharedState,
    period: Duration,
    /// Next firing deadline; moved forward after each firing or re-arm.
    deadline: Mutex<Instant>,
    wakeup: Condvar,
    running: AtomicBool,
}

/// Recurring callback that increments `tick_count` every period.
pub struct PeriodicTicker {
    inner: Arc<TickerInner>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTicker {
    /// Arm the ticker; the first firing happens at `now + period`.
    pub fn start(state: SharedState, period: Duration) -> Self {
        let inner = Arc::new(TickerInner {
            state,
            period,
            deadline: Mutex::new(Instant::now() + period),
            wakeup: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("tickdev-ticker".into())
            .spawn(move || worker.run())
            .expect("failed to spawn ticker thread");

        Self {
            inner,
            handle: Some(handle),
        }
    }

    /// Push the next firing out to `now + period` without stopping the
    /// ticker. Used by the `reset` command.
    pub fn rearm(&self) {
        let mut deadline = self.inner.deadline.lock();
        *deadline = Instant::now() + self.inner.period;
        self.inner.wakeup.notify_all();
    }

    /// Cancel the ticker and join its thread.
    ///
    /// Guaranteed: no firing happens after this returns. Idempotent.
    pub fn cancel(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PeriodicTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl TickerInner {
    fn run(&self) {
        debug!(period_ms = self.period.as_millis() as u64, "ticker armed");
        let mut deadline = self.deadline.lock();
        while self.running.load(Ordering::SeqCst) {
            let target = *deadline;
            if self.wakeup.wait_until(&mut deadline, target).timed_out() {
                // A re-arm may have raced with the timeout wakeup; if the
                // deadline moved, honor the new one instead of firing.
                if *deadline != target {
                    continue;
                }
                {
                    let mut state = self.state.lock();
                    state.tick_count += 1;
                }
                *deadline = Instant::now() + self.period;
            }
        }
        debug!("ticker cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::new_shared;

    #[test]
    fn ticker_increments_over_time() {
        let state = new_shared();
        let mut ticker = PeriodicTicker::start(Arc::clone(&state), Duration::from_millis(20));

        std::thread::sleep(Duration::from_millis(130));
        let ticks = state.lock().tick_count;
        assert!(
            (3..=9).contains(&ticks),
            "expected roughly 6 ticks after 130ms at 20ms period, got {ticks}"
        );
        ticker.cancel();
    }

    #[test]
    fn cancel_is_final() {
        let state = new_shared();
        let mut ticker = PeriodicTicker::start(Arc::clone(&state), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(35));
        ticker.cancel();

        let after_cancel = state.lock().tick_count;
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(
            state.lock().tick_count,
            after_cancel,
            "no firing may happen after cancel returns"
        );
    }

    #[test]
    fn rearm_defers_next_firing() {
        let state = new_shared();
        let ticker = PeriodicTicker::start(Arc::clone(&state), Duration::from_millis(200));

        // Keep re-arming much faster than the period: the ticker must never
        // fire.
        for _ in 0..6 {
            std::thread::sleep(Duration::from_millis(40));
            ticker.rearm();
        }
        assert_eq!(state.lock().tick_count, 0);
    }
}

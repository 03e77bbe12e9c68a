//! Background job queue.
//!
//! A single sequential worker drains a FIFO of job requests. Each raw-data
//! write enqueues a fresh request carrying the configured start delay; the
//! worker waits out the delay, performs the fixed blocking phase, and sets
//! `log_done` under the device lock.
//!
//! Cancellation is best-effort and non-preemptive. [`JobQueue::cancel_and_drain`]
//! bumps a generation counter, clears queued requests, and blocks until no
//! cancellable (queued or delay-phase) job remains. A job already inside its
//! blocking phase runs to the end; its completion is then discarded as stale
//! so a reset stays observable.

use crate::state::SharedState;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct JobRequest {
    delay: Duration,
    generation: u64,
}

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<JobRequest>,
    /// Cancellation epoch; bumped by `cancel_and_drain`.
    generation: u64,
    /// True while the worker sits in the cancellable delay phase.
    delaying: bool,
}

struct JobInner {
    state: SharedState,
    /// Duration of the uninterruptible blocking phase.
    blocking: Duration,
    q: Mutex<QueueState>,
    wakeup: Condvar,
    drained: Condvar,
    running: AtomicBool,
}

/// Single-worker sequential job queue with delayed starts.
pub struct JobQueue {
    inner: Arc<JobInner>,
    handle: Option<JoinHandle<()>>,
}

impl JobQueue {
    /// Spawn the worker thread with the given blocking-phase duration.
    pub fn start(state: SharedState, blocking: Duration) -> Self {
        let inner = Arc::new(JobInner {
            state,
            blocking,
            q: Mutex::new(QueueState::default()),
            wakeup: Condvar::new(),
            drained: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("tickdev-job".into())
            .spawn(move || worker.run())
            .expect("failed to spawn job thread");

        Self {
            inner,
            handle: Some(handle),
        }
    }

    /// Enqueue a fresh job that starts after `delay`. Later-queued jobs wait
    /// their turn behind the single worker.
    pub fn enqueue(&self, delay: Duration) {
        let mut q = self.inner.q.lock();
        let generation = q.generation;
        q.queue.push_back(JobRequest { delay, generation });
        self.inner.wakeup.notify_one();
    }

    /// Cancel every job that has not entered its blocking phase and wait
    /// until those have drained.
    ///
    /// A job already blocking is left to finish; its completion will be
    /// discarded because its generation is stale by then. The caller must
    /// not hold the device lock — this call can wait.
    pub fn cancel_and_drain(&self) {
        let mut q = self.inner.q.lock();
        q.generation += 1;
        let dropped = q.queue.len();
        q.queue.clear();
        self.inner.wakeup.notify_all();
        while q.delaying {
            self.inner.drained.wait(&mut q);
        }
        if dropped > 0 {
            debug!(dropped, "cancelled queued jobs");
        }
    }

    /// Stop the worker and join its thread. Waits for a blocking phase in
    /// progress. Idempotent.
    pub fn stop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

impl JobInner {
    fn run(&self) {
        let mut q = self.q.lock();
        while self.running.load(Ordering::SeqCst) {
            let Some(job) = q.queue.pop_front() else {
                self.wakeup.wait(&mut q);
                continue;
            };

            // Delay phase: cancellable by a generation bump or shutdown.
            q.delaying = true;
            let deadline = Instant::now() + job.delay;
            let mut cancelled = false;
            loop {
                if q.generation != job.generation || !self.running.load(Ordering::SeqCst) {
                    cancelled = true;
                    break;
                }
                if Instant::now() >= deadline {
                    break;
                }
                self.wakeup.wait_until(&mut q, deadline);
            }
            q.delaying = false;
            self.drained.notify_all();
            if cancelled {
                debug!("job cancelled during delay phase");
                continue;
            }
            drop(q);

            // Blocking phase: runs with every lock released and cannot be
            // interrupted, only superseded.
            std::thread::sleep(self.blocking);

            let stale = self.q.lock().generation != job.generation;
            if stale {
                debug!("discarding stale job completion");
            } else {
                self.state.lock().log_done = true;
                debug!("job completed");
            }

            q = self.q.lock();
        }
    }
}

//! Deferred buffer scan.
//!
//! A single-slot "pending" flag drained by a dedicated worker — a bounded
//! capacity-1 queue with overwrite-on-full semantics. Repeated triggers
//! coalesce; when the worker runs it recomputes `char_count` from the live
//! buffer under the device lock, not from a snapshot captured at trigger
//! time, so only the latest buffer state is ever observed.

use crate::state::SharedState;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::trace;

struct ScanInner {
    state: SharedState,
    pending: Mutex<bool>,
    wakeup: Condvar,
    running: AtomicBool,
}

/// Fast, non-blocking deferred recomputation of `char_count`.
pub struct DeferredScan {
    inner: Arc<ScanInner>,
    handle: Option<JoinHandle<()>>,
}

impl DeferredScan {
    /// Spawn the scan worker, initially idle.
    pub fn start(state: SharedState) -> Self {
        let inner = Arc::new(ScanInner {
            state,
            pending: Mutex::new(false),
            wakeup: Condvar::new(),
            running: AtomicBool::new(true),
        });

        let worker = Arc::clone(&inner);
        let handle = std::thread::Builder::new()
            .name("tickdev-scan".into())
            .spawn(move || worker.run())
            .expect("failed to spawn scan thread");

        Self {
            inner,
            handle: Some(handle),
        }
    }

    /// Schedule a rescan. Coalesces with an already-pending trigger.
    pub fn trigger(&self) {
        let mut pending = self.inner.pending.lock();
        *pending = true;
        self.inner.wakeup.notify_one();
    }

    /// Drop a not-yet-run invocation (the `reset` path). An invocation that
    /// already started executing finishes undisturbed.
    pub fn cancel_pending(&self) {
        *self.inner.pending.lock() = false;
    }

    /// Stop the worker and join its thread. Idempotent.
    pub fn stop(&mut self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeferredScan {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ScanInner {
    fn run(&self) {
        let mut pending = self.pending.lock();
        loop {
            while !*pending && self.running.load(Ordering::SeqCst) {
                self.wakeup.wait(&mut pending);
            }
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            *pending = false;
            drop(pending);

            {
                let mut state = self.state.lock();
                state.char_count = state.count_nonzero();
                trace!(char_count = state.char_count, "scan completed");
            }

            pending = self.pending.lock();
        }
    }
}

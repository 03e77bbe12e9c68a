//! Shared mutable record for the timer device.
//!
//! One instance per device, guarded by a single [`parking_lot::Mutex`].
//! The ticker, the scan worker, the job worker and the read/write call path
//! all take the lock only for short field updates; the job's blocking phase
//! runs with the lock released.

use parking_lot::Mutex;
use std::sync::Arc;
use tickdev_common::consts::BUFFER_CAPACITY;

/// All mutable timer-device state.
#[derive(Debug)]
pub struct TimerShared {
    /// Backing store, logically addressed `[0, size)`.
    pub data: [u8; BUFFER_CAPACITY],
    /// Current logical length, `0 <= size <= BUFFER_CAPACITY`.
    pub size: usize,
    /// Incremented once per ticker period.
    pub tick_count: u64,
    /// Count of non-zero bytes in `data[0, size)` as of the last scan.
    /// Stale between writes.
    pub char_count: u64,
    /// Delay applied to the next background-job enqueue [ms].
    pub work_delay_ms: u64,
    /// Set once the most recently enqueued background job completed.
    pub log_done: bool,
}

impl TimerShared {
    /// Create a zeroed record.
    pub const fn new() -> Self {
        Self {
            data: [0; BUFFER_CAPACITY],
            size: 0,
            tick_count: 0,
            char_count: 0,
            work_delay_ms: 0,
            log_done: false,
        }
    }

    /// Zero every field and the buffer (the `reset` command).
    pub fn clear(&mut self) {
        self.data.fill(0);
        self.size = 0;
        self.tick_count = 0;
        self.char_count = 0;
        self.work_delay_ms = 0;
        self.log_done = false;
    }

    /// Count of non-zero bytes in the logical range.
    pub fn count_nonzero(&self) -> u64 {
        self.data[..self.size].iter().filter(|b| **b != 0).count() as u64
    }
}

impl Default for TimerShared {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle shared between the call path and the three execution contexts.
pub type SharedState = Arc<Mutex<TimerShared>>;

/// Create a fresh shared record.
pub fn new_shared() -> SharedState {
    Arc::new(Mutex::new(TimerShared::new()))
}

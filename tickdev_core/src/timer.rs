//! The timer device: periodic ticker + deferred scan + background job.
//!
//! Three independently scheduled execution contexts mutate one shared
//! buffer under a single lock, coordinated through the text command
//! protocol on the write path. See the crate docs for the protocol table.

use crate::command::{Command, classify};
use crate::render::{StatusSnapshot, render_report};
use crate::scan::DeferredScan;
use crate::state::{SharedState, new_shared};
use crate::ticker::PeriodicTicker;
use crate::worker::JobQueue;
use std::sync::Arc;
use std::time::Duration;
use tickdev_common::config::TimerTuning;
use tickdev_common::consts::BUFFER_CAPACITY;
use tickdev_common::device::{CharDevice, DeviceError, DeviceResult, WriteReply};
use tracing::{debug, info, warn};

/// Timing parameters for a timer device instance.
///
/// The protocol fixes both durations (1000 ms / 10 000 ms); overriding them
/// is for tests and benches only.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Ticker period.
    pub tick_period: Duration,
    /// Background-job blocking phase duration.
    pub job_blocking: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::from(&TimerTuning::default())
    }
}

impl From<&TimerTuning> for TimerConfig {
    fn from(tuning: &TimerTuning) -> Self {
        Self {
            tick_period: Duration::from_millis(tuning.tick_period_ms),
            job_blocking: Duration::from_millis(tuning.job_blocking_ms),
        }
    }
}

/// The core device. Dropping it tears everything down: the ticker is
/// cancelled synchronously and both workers are joined.
pub struct TimerDevice {
    shared: SharedState,
    ticker: PeriodicTicker,
    scan: DeferredScan,
    jobs: JobQueue,
}

impl TimerDevice {
    /// Create the device and arm its three execution contexts.
    pub fn new(config: TimerConfig) -> Self {
        let shared = new_shared();
        let ticker = PeriodicTicker::start(Arc::clone(&shared), config.tick_period);
        let scan = DeferredScan::start(Arc::clone(&shared));
        let jobs = JobQueue::start(Arc::clone(&shared), config.job_blocking);
        info!(
            tick_period_ms = config.tick_period.as_millis() as u64,
            job_blocking_ms = config.job_blocking.as_millis() as u64,
            "timer device created"
        );
        Self {
            shared,
            ticker,
            scan,
            jobs,
        }
    }

    /// Capture a consistent snapshot of the device state.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::capture(&self.shared.lock())
    }

    /// Full reset: zero all state, re-arm the ticker, drop the pending scan,
    /// cancel and drain cancellable background jobs.
    fn apply_reset(&self) {
        self.shared.lock().clear();
        self.ticker.rearm();
        self.scan.cancel_pending();
        // Can wait for delay-phase jobs; the device lock is not held here.
        self.jobs.cancel_and_drain();
        info!("timer device reset");
    }
}

impl CharDevice for TimerDevice {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn open(&self) {
        info!("opened timer device");
    }

    fn release(&self) {
        info!("released timer device");
    }

    fn write_at(&self, pos: u64, payload: &[u8]) -> DeviceResult<WriteReply> {
        let offset = pos as usize;
        let mut count = payload.len();
        if offset.saturating_add(count) > BUFFER_CAPACITY {
            count = BUFFER_CAPACITY.saturating_sub(offset);
            if count == 0 {
                warn!(offset, "buffer full");
                return Err(DeviceError::NoSpace {
                    offset: pos,
                    capacity: BUFFER_CAPACITY,
                });
            }
        }
        let payload = &payload[..count];

        match classify(payload)? {
            Command::Reset => {
                self.apply_reset();
                Ok(WriteReply { count, pos })
            }
            Command::SetWorkDelay(ms) => {
                self.shared.lock().work_delay_ms = ms;
                debug!(work_delay_ms = ms, "set job delay");
                Ok(WriteReply { count, pos })
            }
            Command::Data(bytes) => {
                let delay_ms = {
                    let mut state = self.shared.lock();
                    state.data[offset..offset + bytes.len()].copy_from_slice(bytes);
                    let end = offset + bytes.len();
                    if state.size < end {
                        state.size = end;
                    }
                    state.work_delay_ms
                };
                self.scan.trigger();
                self.jobs.enqueue(Duration::from_millis(delay_ms));
                debug!(count, offset, "wrote data");
                Ok(WriteReply {
                    count,
                    pos: (offset + count) as u64,
                })
            }
        }
    }

    fn read_at(&self, pos: u64, maxlen: usize) -> DeviceResult<Vec<u8>> {
        let report = render_report(&self.shared.lock());
        let bytes = report.as_bytes();
        let start = (pos as usize).min(bytes.len());
        let end = start.saturating_add(maxlen).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn size(&self) -> u64 {
        self.shared.lock().size as u64
    }
}

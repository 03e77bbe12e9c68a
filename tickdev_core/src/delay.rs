//! Busy-wait delay device.
//!
//! Demonstrates bounded busy-wait delays on the write path and a blocking
//! read with a configurable timeout. Raw writes burn `udelay_us` µs plus
//! `ndelay_ns` ns per byte in a spin loop (never sleeping) and accumulate
//! the total in `total_delay_ns`; a reader that configured `delay_ms` blocks
//! until a writer signals fresh data or the timeout elapses.

use crate::command::parse_decimal;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tickdev_common::consts::{BUFFER_CAPACITY, NDELAY_MAX_NS, REPORT_CAPACITY, UDELAY_MAX_US};
use tickdev_common::device::{CharDevice, DeviceError, DeviceResult, WriteReply};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct DelayShared {
    data: [u8; BUFFER_CAPACITY],
    size: usize,
    /// Blocking-read timeout [ms]; 0 disables blocking.
    delay_ms: u64,
    /// Per-byte busy-wait on raw writes [µs].
    udelay_us: u64,
    /// Per-byte busy-wait on raw writes [ns].
    ndelay_ns: u64,
    /// Accumulated busy-wait time across all raw writes [ns].
    total_delay_ns: u64,
    /// Set by a raw write, consumed by a blocking read.
    data_ready: bool,
}

impl DelayShared {
    const fn new() -> Self {
        Self {
            data: [0; BUFFER_CAPACITY],
            size: 0,
            delay_ms: 0,
            udelay_us: 0,
            ndelay_ns: 0,
            total_delay_ns: 0,
            data_ready: false,
        }
    }

    fn clear(&mut self) {
        self.data.fill(0);
        self.size = 0;
        self.delay_ms = 0;
        self.udelay_us = 0;
        self.ndelay_ns = 0;
        self.total_delay_ns = 0;
        self.data_ready = false;
    }
}

/// Busy-wait delay accounting device.
pub struct DelayDevice {
    shared: Mutex<DelayShared>,
    ready: Condvar,
}

impl DelayDevice {
    /// Create the device with all delays disabled.
    pub fn new() -> Self {
        info!("delay device created");
        Self {
            shared: Mutex::new(DelayShared::new()),
            ready: Condvar::new(),
        }
    }
}

impl Default for DelayDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Spin for the given duration without sleeping.
fn busy_wait(duration: Duration) {
    let end = Instant::now() + duration;
    while Instant::now() < end {
        std::hint::spin_loop();
    }
}

fn bounded_arg(
    rest: &[u8],
    command: &'static str,
    max: u64,
) -> DeviceResult<u64> {
    let value = parse_decimal(rest).ok_or_else(|| DeviceError::InvalidArgument {
        command,
        value: String::from_utf8_lossy(rest).into_owned(),
    })?;
    if value > max {
        return Err(DeviceError::InvalidArgument {
            command,
            value: value.to_string(),
        });
    }
    Ok(value)
}

impl CharDevice for DelayDevice {
    fn name(&self) -> &'static str {
        "delay"
    }

    fn open(&self) {
        info!("opened delay device");
    }

    fn release(&self) {
        info!("released delay device");
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

        if payload.starts_with(b"reset") {
            self.shared.lock().clear();
            info!("delay device reset");
            return Ok(WriteReply { count, pos });
        }
        if let Some(rest) = payload.strip_prefix(b"delay_ms=") {
            let value = parse_decimal(rest).ok_or_else(|| DeviceError::InvalidArgument {
                command: "delay_ms",
                value: String::from_utf8_lossy(rest).into_owned(),
            })?;
            self.shared.lock().delay_ms = value;
            debug!(delay_ms = value, "set read timeout");
            return Ok(WriteReply { count, pos });
        }
        if let Some(rest) = payload.strip_prefix(b"udelay_us=") {
            let value = bounded_arg(rest, "udelay_us", UDELAY_MAX_US)?;
            self.shared.lock().udelay_us = value;
            return Ok(WriteReply { count, pos });
        }
        if let Some(rest) = payload.strip_prefix(b"ndelay_ns=") {
            let value = bounded_arg(rest, "ndelay_ns", NDELAY_MAX_NS)?;
            self.shared.lock().ndelay_ns = value;
            return Ok(WriteReply { count, pos });
        }

        // Raw data: burn the configured delay per byte, then commit.
        let (udelay_us, ndelay_ns) = {
            let shared = self.shared.lock();
            (shared.udelay_us, shared.ndelay_ns)
        };
        let per_byte_ns = udelay_us * 1000 + ndelay_ns;
        if per_byte_ns > 0 {
            for _ in 0..count {
                busy_wait(Duration::from_nanos(per_byte_ns));
            }
        }

        {
            let mut shared = self.shared.lock();
            shared.data[offset..offset + count].copy_from_slice(payload);
            let end = offset + count;
            if shared.size < end {
                shared.size = end;
            }
            shared.total_delay_ns += per_byte_ns * count as u64;
            shared.data_ready = true;
        }
        self.ready.notify_all();
        debug!(count, offset, "wrote data");
        Ok(WriteReply {
            count,
            pos: (offset + count) as u64,
        })
    }

    fn read_at(&self, pos: u64, maxlen: usize) -> DeviceResult<Vec<u8>> {
        let mut shared = self.shared.lock();
        if shared.delay_ms > 0 {
            let deadline = Instant::now() + Duration::from_millis(shared.delay_ms);
            while !shared.data_ready {
                if self.ready.wait_until(&mut shared, deadline).timed_out() {
                    debug!("read timed out");
                    return Ok(Vec::new());
                }
            }
            shared.data_ready = false;
        }
        if shared.size == 0 {
            return Ok(Vec::new());
        }

        let mut report: heapless::String<REPORT_CAPACITY> = heapless::String::new();
        {
            use core::fmt::Write as _;
            let _ = report.push_str("data: ");
            for chunk in shared.data[..shared.size].utf8_chunks() {
                let _ = report.push_str(chunk.valid());
                if !chunk.invalid().is_empty() {
                    let _ = report.push('\u{FFFD}');
                }
            }
            let _ = write!(report, "\ntotal_delay_ns: {}\n", shared.total_delay_ns);
        }
        drop(shared);

        let bytes = report.as_bytes();
        let start = (pos as usize).min(bytes.len());
        let end = start.saturating_add(maxlen).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn size(&self) -> u64 {
        self.shared.lock().size as u64
    }
}

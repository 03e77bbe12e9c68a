//! Tick/cycle diffing device with a minimum-interval read gate.
//!
//! Reports monotonic tick and cycle counters and their deltas since the
//! previous read. Once armed, reads closer together than `min_interval_ms`
//! fail with [`DeviceError::TooSoon`] instead of blocking, mirroring a
//! non-blocking EAGAIN path. The tick counter is milliseconds of monotonic
//! time since device creation; the cycle counter is the same clock in
//! nanoseconds.

use crate::command::parse_decimal;
use core::fmt::Write as _;
use parking_lot::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tickdev_common::consts::{BUFFER_CAPACITY, REPORT_CAPACITY};
use tickdev_common::device::{CharDevice, DeviceError, DeviceResult, WriteReply};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct TicksShared {
    data: [u8; BUFFER_CAPACITY],
    size: usize,
    /// Tick value recorded at the previous read [ms].
    last_ticks: u64,
    /// Cycle value recorded at the previous read [ns].
    last_cycles: u64,
    /// Minimum interval between reads [ms].
    min_interval_ms: u64,
    /// Whether the gate is armed (set by `interval=` and by every read).
    interval_set: bool,
}

impl TicksShared {
    const fn new() -> Self {
        Self {
            data: [0; BUFFER_CAPACITY],
            size: 0,
            last_ticks: 0,
            last_cycles: 0,
            min_interval_ms: 0,
            interval_set: false,
        }
    }
}

/// Monotonic tick/cycle diffing device.
pub struct TicksDevice {
    shared: Mutex<TicksShared>,
    /// Device creation time; all tick/cycle values are relative to it.
    epoch: Instant,
}

impl TicksDevice {
    /// Create the device with an open gate.
    pub fn new() -> Self {
        info!("ticks device created");
        Self {
            shared: Mutex::new(TicksShared::new()),
            epoch: Instant::now(),
        }
    }

    fn now_ticks(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn now_cycles(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}

impl Default for TicksDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl CharDevice for TicksDevice {
    fn name(&self) -> &'static str {
        "ticks"
    }

    fn open(&self) {
        info!("opened ticks device");
    }

    fn release(&self) {
        info!("released ticks device");
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
            let mut shared = self.shared.lock();
            // Disarm the gate so the next read always passes; it re-arms
            // itself on that read with the retained interval.
            shared.interval_set = false;
            shared.last_ticks = self.now_ticks();
            shared.last_cycles = self.now_cycles();
            info!("ticks device reset");
            return Ok(WriteReply { count, pos });
        }
        if let Some(rest) = payload.strip_prefix(b"interval=") {
            let value = parse_decimal(rest).ok_or_else(|| DeviceError::InvalidArgument {
                command: "interval",
                value: String::from_utf8_lossy(rest).into_owned(),
            })?;
            let mut shared = self.shared.lock();
            shared.min_interval_ms = value;
            shared.last_ticks = self.now_ticks();
            shared.interval_set = true;
            debug!(interval_ms = value, "armed read gate");
            return Ok(WriteReply { count, pos });
        }

        let mut shared = self.shared.lock();
        shared.data[offset..offset + count].copy_from_slice(payload);
        let end = offset + count;
        if shared.size < end {
            shared.size = end;
        }
        debug!(count, offset, "wrote data");
        Ok(WriteReply {
            count,
            pos: (offset + count) as u64,
        })
    }

    fn read_at(&self, pos: u64, maxlen: usize) -> DeviceResult<Vec<u8>> {
        let now_ticks = self.now_ticks();
        let now_cycles = self.now_cycles();
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        let mut shared = self.shared.lock();
        if shared.interval_set {
            let gate_opens = shared.last_ticks.saturating_add(shared.min_interval_ms);
            if now_ticks < gate_opens {
                debug!(remaining_ms = gate_opens - now_ticks, "read too soon");
                return Err(DeviceError::TooSoon {
                    remaining_ms: gate_opens - now_ticks,
                });
            }
        }

        let monotonic = self.epoch.elapsed();
        let mut report: heapless::String<REPORT_CAPACITY> = heapless::String::new();
        let _ = write!(
            report,
            "ticks: {}\nticks_diff_ms: {}\ncycles_diff: {}\nmonotonic: {}.{:09}\nrealtime: {}.{:09}\ndata: ",
            now_ticks,
            now_ticks.saturating_sub(shared.last_ticks),
            now_cycles.saturating_sub(shared.last_cycles),
            monotonic.as_secs(),
            monotonic.subsec_nanos(),
            wall.as_secs(),
            wall.subsec_nanos(),
        );
        for chunk in shared.data[..shared.size].utf8_chunks() {
            let _ = report.push_str(chunk.valid());
            if !chunk.invalid().is_empty() {
                let _ = report.push('\u{FFFD}');
            }
        }
        let _ = report.push('\n');

        shared.last_ticks = now_ticks;
        shared.last_cycles = now_cycles;
        shared.interval_set = true;
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_read_passes_and_arms_the_gate() {
        let dev = TicksDevice::new();
        dev.write_at(0, b"abc").unwrap();

        let report = String::from_utf8(dev.read_at(0, 4096).unwrap()).unwrap();
        assert!(report.starts_with("ticks: "));
        assert!(report.contains("\ndata: abc\n"));
        assert!(dev.shared.lock().interval_set);
    }

    #[test]
    fn gated_read_fails_too_soon() {
        let dev = TicksDevice::new();
        dev.write_at(0, b"interval=60000").unwrap();

        let err = dev.read_at(0, 4096).unwrap_err();
        assert!(matches!(err, DeviceError::TooSoon { remaining_ms } if remaining_ms > 0));
    }

    #[test]
    fn gate_reopens_after_interval() {
        let dev = TicksDevice::new();
        dev.write_at(0, b"interval=20").unwrap();

        assert!(dev.read_at(0, 4096).is_err());
        std::thread::sleep(Duration::from_millis(40));
        assert!(dev.read_at(0, 4096).is_ok());
    }

    #[test]
    fn reset_reopens_the_gate_immediately() {
        let dev = TicksDevice::new();
        dev.write_at(0, b"interval=60000").unwrap();
        assert!(dev.read_at(0, 4096).is_err());

        dev.write_at(0, b"reset").unwrap();
        assert!(dev.read_at(0, 4096).is_ok());
    }

    #[test]
    fn malformed_interval_is_rejected() {
        let dev = TicksDevice::new();
        assert!(matches!(
            dev.write_at(0, b"interval=soon").unwrap_err(),
            DeviceError::InvalidArgument { command: "interval", .. }
        ));
    }

    #[test]
    fn diffs_are_relative_to_previous_read() {
        let dev = TicksDevice::new();
        let _ = dev.read_at(0, 4096).unwrap();
        std::thread::sleep(Duration::from_millis(30));

        let report = String::from_utf8(dev.read_at(0, 4096).unwrap()).unwrap();
        let diff_line = report
            .lines()
            .find(|l| l.starts_with("ticks_diff_ms: "))
            .unwrap();
        let diff: u64 = diff_line["ticks_diff_ms: ".len()..].parse().unwrap();
        assert!((20..1000).contains(&diff), "diff was {diff}");
    }
}

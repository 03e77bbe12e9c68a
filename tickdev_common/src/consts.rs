//! System-wide constants for the tickdev device family.

use static_assertions::const_assert;

/// Fixed capacity of every device data buffer [bytes].
pub const BUFFER_CAPACITY: usize = 1024;

/// Capacity of a rendered status report [bytes].
///
/// Sized so that a report can never overflow: the data line is at most
/// `3 * BUFFER_CAPACITY` bytes after lossy UTF-8 replacement (every invalid
/// byte expands to a three-byte replacement character), plus header lines
/// with 20-digit counters.
pub const REPORT_CAPACITY: usize = 3 * BUFFER_CAPACITY + 128;

/// Periodic ticker period [ms]. Fixed by the protocol, not reconfigurable
/// through the command channel.
pub const TICK_PERIOD_MS: u64 = 1000;

/// Background-job blocking phase duration [ms].
pub const JOB_BLOCKING_MS: u64 = 10_000;

/// Upper bound accepted by the delay device's `udelay_us=` command [µs].
pub const UDELAY_MAX_US: u64 = 1000;

/// Upper bound accepted by the delay device's `ndelay_ns=` command [ns].
pub const NDELAY_MAX_NS: u64 = 1_000_000;

const_assert!(BUFFER_CAPACITY.is_power_of_two());
const_assert!(REPORT_CAPACITY >= 3 * BUFFER_CAPACITY + 96);
const_assert!(UDELAY_MAX_US * 1000 <= NDELAY_MAX_NS);

//! Prelude module for common re-exports.
//!
//! This module provides convenient re-exports of commonly used types
//! so that consumers can do `use tickdev_common::prelude::*;` and get
//! the most important types without listing individual paths.

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig, TickdevConfig, TimerTuning};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{BUFFER_CAPACITY, JOB_BLOCKING_MS, REPORT_CAPACITY, TICK_PERIOD_MS};

// ─── Device Contract ────────────────────────────────────────────────
pub use crate::device::{CharDevice, DeviceError, DeviceResult, Whence, WriteReply};

/// Default ticker period as Duration.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(TICK_PERIOD_MS);

/// Default background-job blocking phase as Duration.
pub const DEFAULT_JOB_BLOCKING: Duration = Duration::from_millis(JOB_BLOCKING_MS);

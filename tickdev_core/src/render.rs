//! Status report rendering for the timer device.
//!
//! The report is built into a fixed-capacity buffer so the render can run
//! under the device lock without allocating. [`StatusSnapshot`] is the
//! allocating, serializable counterpart used by the CLI's JSON output.

use crate::state::TimerShared;
use core::fmt::Write as _;
use serde::Serialize;
use tickdev_common::consts::REPORT_CAPACITY;

/// Fixed-layout text report of the timer device state.
pub type Report = heapless::String<REPORT_CAPACITY>;

/// Render the four-line status report from state observed under one lock
/// hold. Buffer bytes are shown as lossy UTF-8.
///
/// ```text
/// data: <buffer[0,size)>
/// tick_count: <uint>
/// char_count: <uint>
/// log_done: <0|1>
/// ```
pub fn render_report(state: &TimerShared) -> Report {
    let mut out = Report::new();
    // REPORT_CAPACITY is sized so these writes cannot overflow.
    let _ = out.push_str("data: ");
    push_lossy(&mut out, &state.data[..state.size]);
    let _ = write!(
        out,
        "\ntick_count: {}\nchar_count: {}\nlog_done: {}\n",
        state.tick_count, state.char_count, state.log_done as u8
    );
    out
}

fn push_lossy(out: &mut Report, bytes: &[u8]) {
    for chunk in bytes.utf8_chunks() {
        let _ = out.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            let _ = out.push('\u{FFFD}');
        }
    }
}

/// Point-in-time view of the timer device, taken under one lock hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Buffer contents up to the logical size, lossy UTF-8.
    pub data: String,
    /// Ticker firings since creation or last reset.
    pub tick_count: u64,
    /// Non-zero byte count as of the last scan.
    pub char_count: u64,
    /// Whether the most recently enqueued background job completed.
    pub log_done: bool,
}

impl StatusSnapshot {
    /// Capture a consistent snapshot from locked state.
    pub fn capture(state: &TimerShared) -> Self {
        Self {
            data: String::from_utf8_lossy(&state.data[..state.size]).into_owned(),
            tick_count: state.tick_count,
            char_count: state.char_count,
            log_done: state.log_done,
        }
    }
}

//! # Tickdev Core
//!
//! In-memory character devices demonstrating timing primitives, served
//! through a byte-stream open/read/write/seek interface with a small text
//! command protocol.
//!
//! ## Devices
//!
//! - **timer** — the coordination core: a self-rearming periodic ticker, a
//!   write-triggered coalescing scan task, and a delayed background job with
//!   a long blocking phase, all mutating one shared buffer under a single
//!   lock ([`timer::TimerDevice`]).
//! - **delay** — busy-wait delay accounting on writes and a blocking read
//!   with a configurable timeout ([`delay::DelayDevice`]).
//! - **ticks** — monotonic tick/cycle diffing with a minimum-interval read
//!   gate ([`ticks::TicksDevice`]).
//!
//! ## Concurrency model
//!
//! Each timer device runs three dedicated threads (ticker, scan worker, job
//! worker) beside the caller's read/write path. One `parking_lot::Mutex`
//! per device guards all shared fields; critical sections are short and
//! never sleep. The job worker's blocking phase runs with the lock
//! released. Dropping a device cancels the ticker synchronously and joins
//! every worker.
//!
//! ## Command protocol
//!
//! | Device | Payload | Effect |
//! |--------|---------|--------|
//! | timer  | `reset` | zero all state, re-arm ticker, drain jobs |
//! | timer  | `work_delay=<ms>` | start delay for the next background job |
//! | delay  | `reset`, `delay_ms=`, `udelay_us=`, `ndelay_ns=` | see [`delay`] |
//! | ticks  | `reset`, `interval=<ms>` | see [`ticks`] |
//! | all    | anything else | appended as raw buffer data |

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod delay;
pub mod registry;
pub mod render;
pub mod scan;
pub mod state;
pub mod ticker;
pub mod ticks;
pub mod timer;
pub mod worker;

pub use delay::DelayDevice;
pub use registry::{DeviceHandle, DeviceRegistry};
pub use render::{Report, StatusSnapshot, render_report};
pub use ticks::TicksDevice;
pub use timer::{TimerConfig, TimerDevice};

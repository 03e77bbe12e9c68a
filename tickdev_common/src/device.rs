//! # Character Device Contract
//!
//! Defines the byte-stream surface every tickdev device exposes. The
//! registry and the CLI consume devices only through this trait; device-node
//! creation, numbering and filesystem registration are out of scope.
//!
//! # Design
//!
//! The trait is deliberately thin — it captures the four stream operations
//! (open, release, positioned read, positioned write) plus the logical size
//! needed for end-relative seeks, without mandating how a device schedules
//! its internal work.

use thiserror::Error;

/// Outcome of a completed write.
///
/// Command writes consume the whole payload but leave the handle position
/// unchanged; raw-data writes advance it past the copied bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReply {
    /// Bytes consumed from the payload, after any capacity clamping.
    pub count: usize,
    /// Handle position after the call.
    pub pos: u64,
}

/// Seek origin, mirroring `SEEK_SET` / `SEEK_CUR` / `SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start of the stream.
    Set,
    /// Relative to the current handle position.
    Cur,
    /// Relative to the device's logical size.
    End,
}

/// Error type for device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Raw-data write found zero remaining space at the given offset.
    /// Distinct from a short write, which succeeds with a clamped count.
    #[error("no space left on device (offset {offset}, capacity {capacity})")]
    NoSpace {
        /// Write offset that exhausted the buffer.
        offset: u64,
        /// Fixed buffer capacity.
        capacity: usize,
    },

    /// Recognized command with an unparsable or out-of-range argument.
    #[error("invalid argument for {command}: {value:?}")]
    InvalidArgument {
        /// Command keyword that matched.
        command: &'static str,
        /// Offending argument text.
        value: String,
    },

    /// Minimum read interval has not elapsed yet.
    #[error("read gated for another {remaining_ms} ms")]
    TooSoon {
        /// Milliseconds until the gate reopens.
        remaining_ms: u64,
    },

    /// Seek resolved to a negative position.
    #[error("invalid seek to {offset}")]
    InvalidSeek {
        /// The rejected resolved position.
        offset: i64,
    },

    /// No device registered under the requested name.
    #[error("no such device: {name}")]
    NotFound {
        /// Requested device name.
        name: String,
    },

    /// Transfer fault at the process boundary.
    #[error("transfer fault: {source}")]
    Io {
        /// Source I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Byte-stream contract for a tickdev in-memory device.
///
/// Implementations are shared between handles and their own background
/// execution contexts, so every method takes `&self`; interior mutability
/// is guarded by the device's single lock.
pub trait CharDevice: Send + Sync {
    /// Stable device name used for registration and logging.
    fn name(&self) -> &'static str;

    /// Associate a new handle with the device. No core state changes.
    fn open(&self);

    /// Release a handle. No core state changes.
    fn release(&self);

    /// Serve up to `maxlen` bytes of the rendered status report starting at
    /// `pos`. Reading past the end of the report yields zero bytes, not an
    /// error.
    fn read_at(&self, pos: u64, maxlen: usize) -> DeviceResult<Vec<u8>>;

    /// Route a payload through the device's command interpreter.
    ///
    /// Returns the consumed byte count (possibly clamped to the remaining
    /// buffer space) and the position the handle should adopt.
    fn write_at(&self, pos: u64, payload: &[u8]) -> DeviceResult<WriteReply>;

    /// Current logical size of the data buffer, for end-relative seeks.
    fn size(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let e = DeviceError::NoSpace {
            offset: 1024,
            capacity: 1024,
        };
        let msg = format!("{e}");
        assert!(msg.contains("no space"), "message: {msg}");
        assert!(msg.contains("1024"), "message: {msg}");

        let e2 = DeviceError::InvalidArgument {
            command: "work_delay",
            value: "abc".into(),
        };
        let msg2 = format!("{e2}");
        assert!(msg2.contains("work_delay"), "message: {msg2}");
        assert!(msg2.contains("abc"), "message: {msg2}");

        let e3 = DeviceError::TooSoon { remaining_ms: 40 };
        assert!(format!("{e3}").contains("40"));
    }

    #[test]
    fn test_io_errors_convert_to_transfer_faults() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let e = DeviceError::from(io);
        assert!(matches!(e, DeviceError::Io { .. }));
        assert!(format!("{e}").contains("transfer fault"));
    }

    /// Verify the trait is object-safe (devices are stored as `dyn CharDevice`).
    #[test]
    fn test_char_device_is_object_safe() {
        struct NullDevice;
        impl CharDevice for NullDevice {
            fn name(&self) -> &'static str {
                "null"
            }
            fn open(&self) {}
            fn release(&self) {}
            fn read_at(&self, _pos: u64, _maxlen: usize) -> DeviceResult<Vec<u8>> {
                Ok(Vec::new())
            }
            fn write_at(&self, pos: u64, payload: &[u8]) -> DeviceResult<WriteReply> {
                Ok(WriteReply {
                    count: payload.len(),
                    pos,
                })
            }
            fn size(&self) -> u64 {
                0
            }
        }

        let dev: Box<dyn CharDevice> = Box::new(NullDevice);
        assert_eq!(dev.name(), "null");
        let reply = dev.write_at(3, b"xy").unwrap();
        assert_eq!(reply.count, 2);
        assert_eq!(reply.pos, 3);
        assert!(dev.read_at(0, 16).unwrap().is_empty());
    }
}

//! Device registry and stream handles.
//!
//! Provides a `DeviceRegistry` struct for registering and opening devices
//! by name. This uses constructor-injection rather than global state: the
//! registry is built at startup, populated via `register()`, and handed to
//! whatever front-end serves the devices.

use std::collections::HashMap;
use std::sync::Arc;
use tickdev_common::device::{CharDevice, DeviceError, DeviceResult, Whence};
use tracing::debug;

/// Registry of available devices.
pub struct DeviceRegistry {
    devices: HashMap<&'static str, Arc<dyn CharDevice>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
        }
    }

    /// Register a device under its name.
    ///
    /// # Panics
    /// Panics if a device with the same name is already registered.
    pub fn register(&mut self, device: Arc<dyn CharDevice>) {
        let name = device.name();
        if self.devices.contains_key(name) {
            panic!("Device '{name}' is already registered");
        }
        self.devices.insert(name, device);
    }

    /// Open a handle on a device by name.
    ///
    /// # Errors
    /// Returns `DeviceError::NotFound` if no device with the given name is
    /// registered.
    pub fn open(&self, name: &str) -> DeviceResult<DeviceHandle> {
        let device = self
            .devices
            .get(name)
            .cloned()
            .ok_or_else(|| DeviceError::NotFound {
                name: name.to_string(),
            })?;
        device.open();
        Ok(DeviceHandle { device, pos: 0 })
    }

    /// List all registered device names.
    pub fn list_devices(&self) -> Vec<&'static str> {
        self.devices.keys().copied().collect()
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// An open byte-stream handle with its own position cursor.
///
/// Dropping the handle releases the device association.
pub struct DeviceHandle {
    device: Arc<dyn CharDevice>,
    pos: u64,
}

impl DeviceHandle {
    /// Device name this handle is bound to.
    pub fn device_name(&self) -> &'static str {
        self.device.name()
    }

    /// Current stream position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Write a payload at the current position. Command payloads leave the
    /// position unchanged; raw data advances it.
    pub fn write(&mut self, payload: &[u8]) -> DeviceResult<usize> {
        let reply = self.device.write_at(self.pos, payload)?;
        self.pos = reply.pos;
        Ok(reply.count)
    }

    /// Read up to `maxlen` bytes from the current position, advancing it by
    /// the number of bytes returned.
    pub fn read(&mut self, maxlen: usize) -> DeviceResult<Vec<u8>> {
        let bytes = self.device.read_at(self.pos, maxlen)?;
        self.pos += bytes.len() as u64;
        Ok(bytes)
    }

    /// Reposition the stream. `Whence::End` is relative to the device's
    /// logical data size. A negative resolved position is rejected.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> DeviceResult<u64> {
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.pos as i64,
            Whence::End => self.device.size() as i64,
        };
        let newpos = base.checked_add(offset).unwrap_or(-1);
        if newpos < 0 {
            return Err(DeviceError::InvalidSeek { offset: newpos });
        }
        self.pos = newpos as u64;
        debug!(pos = self.pos, "seek");
        Ok(self.pos)
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.device.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickdev_common::device::WriteReply;

    struct EchoDevice;

    impl CharDevice for EchoDevice {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn open(&self) {}
        fn release(&self) {}
        fn read_at(&self, pos: u64, maxlen: usize) -> DeviceResult<Vec<u8>> {
            let body = b"0123456789";
            let start = (pos as usize).min(body.len());
            let end = start.saturating_add(maxlen).min(body.len());
            Ok(body[start..end].to_vec())
        }
        fn write_at(&self, pos: u64, payload: &[u8]) -> DeviceResult<WriteReply> {
            Ok(WriteReply {
                count: payload.len(),
                pos: pos + payload.len() as u64,
            })
        }
        fn size(&self) -> u64 {
            10
        }
    }

    fn registry_with_echo() -> DeviceRegistry {
        let mut reg = DeviceRegistry::new();
        reg.register(Arc::new(EchoDevice));
        reg
    }

    #[test]
    fn registry_register_and_open() {
        let reg = registry_with_echo();
        let handle = reg.open("echo").expect("should open");
        assert_eq!(handle.device_name(), "echo");
    }

    #[test]
    fn registry_device_not_found() {
        let reg = DeviceRegistry::new();
        let result = reg.open("nonexistent");
        assert!(matches!(result, Err(DeviceError::NotFound { .. })));
    }

    #[test]
    fn registry_list_devices() {
        let reg = registry_with_echo();
        assert_eq!(reg.list_devices(), vec!["echo"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = registry_with_echo();
        reg.register(Arc::new(EchoDevice));
    }

    #[test]
    fn handle_tracks_position() {
        let reg = registry_with_echo();
        let mut handle = reg.open("echo").unwrap();

        assert_eq!(handle.write(b"abc").unwrap(), 3);
        assert_eq!(handle.pos(), 3);
        assert_eq!(handle.read(4).unwrap(), b"3456");
        assert_eq!(handle.pos(), 7);
    }

    #[test]
    fn handle_seek_whence() {
        let reg = registry_with_echo();
        let mut handle = reg.open("echo").unwrap();

        assert_eq!(handle.seek(4, Whence::Set).unwrap(), 4);
        assert_eq!(handle.seek(-2, Whence::Cur).unwrap(), 2);
        assert_eq!(handle.seek(-1, Whence::End).unwrap(), 9);
        assert!(matches!(
            handle.seek(-3, Whence::Set),
            Err(DeviceError::InvalidSeek { .. })
        ));
        // Position is untouched by a failed seek.
        assert_eq!(handle.pos(), 9);
    }
}

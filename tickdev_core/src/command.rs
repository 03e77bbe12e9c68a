//! Write-path payload classification for the timer device.
//!
//! Matching is positional: `reset` is a prefix match over the payload,
//! `work_delay=` takes the rest of the payload as an unsigned decimal. A recognized prefix with a malformed or out-of-range
//! value is rejected with `InvalidArgument`, never treated as data.

use tickdev_common::device::{DeviceError, DeviceResult};

/// A classified write payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// Full state reset.
    Reset,
    /// Set the background-job start delay [ms].
    SetWorkDelay(u64),
    /// Anything else: raw buffer data.
    Data(&'a [u8]),
}

/// Classify a (capacity-clamped) write payload.
pub fn classify(payload: &[u8]) -> DeviceResult<Command<'_>> {
    if payload.starts_with(b"reset") {
        return Ok(Command::Reset);
    }
    if let Some(rest) = payload.strip_prefix(b"work_delay=") {
        let value = parse_decimal(rest).ok_or_else(|| DeviceError::InvalidArgument {
            command: "work_delay",
            value: String::from_utf8_lossy(rest).into_owned(),
        })?;
        return Ok(Command::SetWorkDelay(value));
    }
    Ok(Command::Data(payload))
}

/// Parse an unsigned decimal argument, tolerating trailing ASCII whitespace
/// and a trailing NUL from callers that pass C-style strings.
pub(crate) fn parse_decimal(bytes: &[u8]) -> Option<u64> {
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], b'\n' | b'\r' | b'\t' | b' ' | 0) {
        end -= 1;
    }
    let trimmed = &bytes[..end];
    if trimmed.is_empty() {
        return None;
    }
    std::str::from_utf8(trimmed).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_is_a_prefix_match() {
        assert_eq!(classify(b"reset").unwrap(), Command::Reset);
        assert_eq!(classify(b"reset\n").unwrap(), Command::Reset);
        // Trailing bytes after the keyword are ignored.
        assert_eq!(classify(b"reset and more").unwrap(), Command::Reset);
    }

    #[test]
    fn work_delay_parses_decimal() {
        assert_eq!(
            classify(b"work_delay=100").unwrap(),
            Command::SetWorkDelay(100)
        );
        assert_eq!(
            classify(b"work_delay=0\n").unwrap(),
            Command::SetWorkDelay(0)
        );
        assert_eq!(
            classify(b"work_delay=42\0").unwrap(),
            Command::SetWorkDelay(42)
        );
    }

    #[test]
    fn malformed_work_delay_is_rejected_not_data() {
        for payload in [
            b"work_delay=abc".as_slice(),
            b"work_delay=",
            b"work_delay=-5",
            b"work_delay=1e3",
            b"work_delay=99999999999999999999999",
        ] {
            let err = classify(payload).unwrap_err();
            assert!(
                matches!(err, DeviceError::InvalidArgument { command, .. } if command == "work_delay"),
                "payload {payload:?} must be rejected"
            );
        }
    }

    #[test]
    fn everything_else_is_data() {
        assert_eq!(classify(b"hello").unwrap(), Command::Data(b"hello"));
        // An unrecognized key=value is plain data, not a near-miss command.
        assert_eq!(
            classify(b"work_delays=5").unwrap(),
            Command::Data(b"work_delays=5")
        );
        // Non-UTF8 payloads are data too.
        assert_eq!(
            classify(&[0xff, 0xfe, 0x00]).unwrap(),
            Command::Data(&[0xff, 0xfe, 0x00][..])
        );
    }

    #[test]
    fn parse_decimal_trims_trailing_noise_only() {
        assert_eq!(parse_decimal(b"17 \n"), Some(17));
        assert_eq!(parse_decimal(b" 17"), None);
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"\n"), None);
    }
}

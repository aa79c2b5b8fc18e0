//! Hex helpers used by dumps and by tests that describe messages as text.

use thiserror::Error;

/// Errors from [`from_hex`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HexError {
    /// Odd number of digits
    #[error("hex string must have an even length, found {0}")]
    OddLength(usize),
    /// A character outside `0-9a-fA-F`
    #[error("invalid hex digit at {0}")]
    InvalidDigit(usize),
}

/// Lowercase, two digits per byte, no separators.
///
/// ```
/// assert_eq!(coolmidi::bytes::to_hex(&[0xFF, 0x2F, 0x00]), "ff2f00");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Parse a string produced by [`to_hex`]. Either case is accepted.
pub fn from_hex(hex: &str) -> Result<Vec<u8>, HexError> {
    if hex.len() % 2 != 0 {
        return Err(HexError::OddLength(hex.len()));
    }
    hex.as_bytes()
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let hi = digit(pair[0]).ok_or(HexError::InvalidDigit(i * 2))?;
            let lo = digit(pair[1]).ok_or(HexError::InvalidDigit(i * 2 + 1))?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

const fn digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let bytes = [0x0F, 0x0F, 0xFF, 0x05];
        assert_eq!(to_hex(&bytes), "0f0fff05");
        assert_eq!(to_hex(&[]), "");
        assert_eq!(from_hex("0f0fff05").unwrap(), bytes);
        assert_eq!(from_hex("FF5103061A80").unwrap(), [0xFF, 0x51, 0x03, 0x06, 0x1A, 0x80]);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert_eq!(from_hex("fff"), Err(HexError::OddLength(3)));
        assert_eq!(from_hex("0g"), Err(HexError::InvalidDigit(1)));
        assert_eq!(from_hex(""), Ok(vec![]));
    }
}

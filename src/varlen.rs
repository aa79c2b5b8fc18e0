#![doc = r#"
Variable-length quantities.

Delta-times and a few length prefixes in a MIDI file are stored as
7 bits per byte, most significant group first. Every byte except the
last has its top bit set.

```text
Value        Encoding
0x00000040   40
0x0000007F   7F
0x00000080   81 00
0x00002000   C0 00
0x00003FFF   FF 7F
0x00004000   81 80 00
0x0FFFFFFF   FF FF FF 7F
```
"#]

use crate::VarLenError;

/// The largest value that fits in four 7-bit groups.
pub const MAX_VALUE: u32 = 0x0FFF_FFFF;

/// The most bytes a quantity may use.
pub const MAX_BYTES: u8 = 4;

/// Decode a quantity from a byte source.
///
/// Returns the value and the number of bytes consumed. Stops at the
/// first byte with a clear top bit and never reads past it.
pub fn decode<I>(bytes: I) -> Result<(u32, u8), VarLenError>
where
    I: IntoIterator<Item = u8>,
{
    let mut value = 0u32;
    let mut nbytes = 0u8;
    for byte in bytes {
        value = (value << 7) | (byte & 0x7F) as u32;
        nbytes += 1;
        if byte & 0x80 == 0 {
            return Ok((value, nbytes));
        }
        if nbytes == MAX_BYTES {
            return Err(VarLenError::TooLong);
        }
    }
    match nbytes {
        0 => Err(VarLenError::Empty),
        n => Err(VarLenError::Truncated(n)),
    }
}

/// Encode a value using the fewest bytes.
pub fn encode(value: u32) -> Result<Vec<u8>, VarLenError> {
    encode_padded(value, 1)
}

/// Encode a value using at least `width` bytes.
///
/// Files occasionally store delta-times with redundant leading `0x80`
/// groups; padding to the original width reproduces them exactly.
pub fn encode_padded(value: u32, width: u8) -> Result<Vec<u8>, VarLenError> {
    if value > MAX_VALUE {
        return Err(VarLenError::Overflow(value));
    }
    let mut groups = Vec::with_capacity(MAX_BYTES as usize);
    let mut rest = value;
    loop {
        groups.push((rest & 0x7F) as u8);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    while groups.len() < width.min(MAX_BYTES) as usize {
        groups.push(0);
    }
    groups.reverse();
    let last = groups.len() - 1;
    for group in &mut groups[..last] {
        *group |= 0x80;
    }
    Ok(groups)
}

/// Number of bytes [`encode`] would emit for `value`.
pub const fn encoded_len(value: u32) -> u8 {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_values() {
        assert_eq!(decode([0xFF, 0x7F]), Ok((0x3FFF, 2)));
        assert_eq!(decode([0x81, 0x80, 0x80, 0x00]), Ok((0x0020_0000, 4)));
        assert_eq!(decode([0x84, 0x3C]), Ok((0x023C, 2)));
        assert_eq!(decode([0x98, 0x00]), Ok((3072, 2)));
        assert_eq!(decode([0x00]), Ok((0, 1)));
    }

    #[test]
    fn decode_stops_at_terminator() {
        let mut bytes = [0x81, 0x00, 0x40].into_iter();
        assert_eq!(decode(&mut bytes), Ok((0x80, 2)));
        assert_eq!(bytes.next(), Some(0x40));
    }

    #[test]
    fn decode_failures() {
        assert_eq!(decode([]), Err(VarLenError::Empty));
        assert_eq!(decode([0x81, 0x80]), Err(VarLenError::Truncated(2)));
        assert_eq!(
            decode([0x81, 0x80, 0x80, 0x80, 0x00]),
            Err(VarLenError::TooLong)
        );
    }

    #[test]
    fn encodes_reference_values() {
        assert_eq!(encode(0x3FFF).unwrap(), [0xFF, 0x7F]);
        assert_eq!(encode(0x0020_0000).unwrap(), [0x81, 0x80, 0x80, 0x00]);
        assert_eq!(encode(0x023C).unwrap(), [0x84, 0x3C]);
        assert_eq!(encode(3072).unwrap(), [0x98, 0x00]);
        assert_eq!(encode(0).unwrap(), [0x00]);
        assert_eq!(encode(MAX_VALUE).unwrap(), [0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(encode(MAX_VALUE + 1), Err(VarLenError::Overflow(MAX_VALUE + 1)));
    }

    #[test]
    fn padded_encoding_keeps_width() {
        assert_eq!(encode_padded(0, 2).unwrap(), [0x80, 0x00]);
        assert_eq!(encode_padded(0x40, 3).unwrap(), [0x80, 0x80, 0x40]);
        assert_eq!(decode(encode_padded(0x40, 3).unwrap()), Ok((0x40, 3)));
        // never narrower than the value needs
        assert_eq!(encode_padded(0x3FFF, 1).unwrap(), [0xFF, 0x7F]);
    }

    #[test]
    fn round_trips_across_group_boundaries() {
        let samples = [
            0, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, 0x0800_0000, MAX_VALUE,
        ];
        for x in samples
            .into_iter()
            .chain((0..MAX_VALUE).step_by(0x0001_2345))
        {
            let bytes = encode(x).unwrap();
            assert_eq!(bytes.len(), encoded_len(x) as usize);
            assert_eq!(decode(bytes.iter().copied()), Ok((x, bytes.len() as u8)));
        }
    }
}

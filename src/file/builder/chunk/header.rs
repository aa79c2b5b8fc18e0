use crate::{
    HeaderError, ParseError,
    file::{FormatType, Timing},
    reader::{ReadResult, Reader, inv_data},
};

/// Chunk id of the header
pub const HEADER_ID: [u8; 4] = *b"MThd";
/// The only legal header length
pub const HEADER_LEN: u32 = 6;

#[doc = r#"
The validated contents of the `MThd` chunk.

```text
"MThd" <len=6:BE32> <format:BE16> <ntracks:BE16> <tickdiv:BE16>
```
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    format: FormatType,
    ntracks: u16,
    tickdiv: u16,
    timing: Timing,
}

impl Header {
    /// Validate raw header fields.
    ///
    /// Fails if the id isn't `MThd`, the length isn't 6, the format is
    /// unknown, the track count doesn't suit the format or the SMPTE
    /// frame rate is invalid.
    pub fn new(
        id: [u8; 4],
        len: u32,
        format: u16,
        ntracks: u16,
        tickdiv: u16,
    ) -> Result<Self, ParseError> {
        if id != HEADER_ID {
            return Err(HeaderError::InvalidId(id).into());
        }
        if len != HEADER_LEN {
            return Err(HeaderError::InvalidLength(len).into());
        }
        let format =
            FormatType::try_from(format).map_err(|_| HeaderError::InvalidFormat(format))?;
        if !format.accepts_track_count(ntracks) {
            return Err(HeaderError::InvalidTrackCount { format, ntracks }.into());
        }
        let timing = Timing::from_tickdiv(tickdiv)?;
        Ok(Self {
            format,
            ntracks,
            tickdiv,
            timing,
        })
    }

    pub(crate) fn read(reader: &mut Reader<'_>) -> ReadResult<Self> {
        let id = reader.read_exact_size()?;
        let len = reader.read_u32()?;
        let format = reader.read_u16()?;
        let ntracks = reader.read_u16()?;
        let tickdiv = reader.read_u16()?;
        Self::new(id, len, format, ntracks, tickdiv).map_err(|e| inv_data(reader, e))
    }

    /// The file format
    pub const fn format_type(&self) -> FormatType {
        self.format
    }

    /// Number of track chunks that follow
    pub const fn ntracks(&self) -> u16 {
        self.ntracks
    }

    /// The raw time division word
    pub const fn tickdiv(&self) -> u16 {
        self.tickdiv
    }

    /// The interpreted time division
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// True if delta times count fractions of a quarter note
    pub const fn uses_ticks_per_beat(&self) -> bool {
        self.timing.uses_ticks_per_beat()
    }

    /// Append the 14 chunk bytes
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&HEADER_ID);
        out.extend_from_slice(&HEADER_LEN.to_be_bytes());
        out.extend_from_slice(&self.format.word().to_be_bytes());
        out.extend_from_slice(&self.ntracks.to_be_bytes());
        out.extend_from_slice(&self.tickdiv.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BYTES: [u8; 14] = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0x01, 0xE0,
    ];

    #[test]
    fn reads_format_one_header() {
        let header = Header::read(&mut Reader::from_byte_slice(&BYTES)).unwrap();
        assert_eq!(header.format_type(), FormatType::Simultaneous);
        assert_eq!(header.ntracks(), 2);
        assert_eq!(header.tickdiv(), 480);
        assert!(header.uses_ticks_per_beat());

        let mut out = Vec::new();
        header.write_to(&mut out);
        assert_eq!(out, BYTES);
    }

    #[test]
    fn validates_fields() {
        assert_eq!(
            Header::new(*b"MThd", 7, 1, 2, 480),
            Err(ParseError::Header(HeaderError::InvalidLength(7)))
        );
        assert_eq!(
            Header::new(*b"MThd", 6, 3, 2, 480),
            Err(ParseError::Header(HeaderError::InvalidFormat(3)))
        );
        assert_eq!(
            Header::new(*b"MThd", 6, 0, 2, 480),
            Err(ParseError::Header(HeaderError::InvalidTrackCount {
                format: FormatType::SingleMultiChannel,
                ntracks: 2
            }))
        );
        assert!(Header::new(*b"MThd", 6, 2, 3, 480).is_ok());
    }

    #[test]
    fn truncated_header_is_out_of_bounds() {
        let err = Header::read(&mut Reader::from_byte_slice(&BYTES[..10])).unwrap_err();
        assert!(err.is_out_of_bounds());
    }
}

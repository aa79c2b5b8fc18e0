#![doc = r#"
A positional reader over the bytes of a MIDI file.

Every read advances the cursor; running past the end produces
[`ReaderErrorKind::OutOfBounds`] tagged with the position of the failed read.
"#]

mod error;
pub use error::*;

use crate::varlen;

/// Reads big-endian words, variable-length quantities and raw slices
/// from a byte buffer.
#[derive(Debug, Clone)]
pub struct Reader<'slc> {
    buffer: &'slc [u8],
    position: usize,
}

impl<'slc> Reader<'slc> {
    /// Create a reader at the start of `bytes`
    pub const fn from_byte_slice(bytes: &'slc [u8]) -> Self {
        Self {
            buffer: bytes,
            position: 0,
        }
    }

    /// The offset of the next byte to be read
    pub const fn buffer_position(&self) -> usize {
        self.position
    }

    /// Number of unread bytes
    pub const fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// True when every byte has been consumed
    pub const fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// The bytes between `start` and the cursor.
    ///
    /// `start` must not be past the cursor.
    pub fn since(&self, start: usize) -> &'slc [u8] {
        &self.buffer[start.min(self.position)..self.position]
    }

    /// Read one byte
    pub fn read_next(&mut self) -> ReadResult<u8> {
        let byte = *self
            .buffer
            .get(self.position)
            .ok_or(ReaderError::oob(self.position))?;
        self.position += 1;
        Ok(byte)
    }

    /// Read a slice of `len` bytes
    pub fn read_exact(&mut self, len: usize) -> ReadResult<&'slc [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(ReaderError::oob(self.position))?;
        let slice = &self.buffer[self.position..end];
        self.position = end;
        Ok(slice)
    }

    /// Read exactly `N` bytes into an array
    pub fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let slice = self.read_exact(N)?;
        let mut out = [0; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Skip `len` bytes
    pub fn skip(&mut self, len: usize) -> ReadResult<()> {
        self.read_exact(len).map(|_| ())
    }

    /// Read a big-endian u16
    pub fn read_u16(&mut self) -> ReadResult<u16> {
        self.read_exact_size().map(u16::from_be_bytes)
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> ReadResult<u32> {
        self.read_exact_size().map(u32::from_be_bytes)
    }

    /// Read a variable-length quantity, returning the value and the
    /// number of bytes it took.
    ///
    /// Running out of bytes is reported as [`ReaderErrorKind::OutOfBounds`];
    /// an unterminated quantity as [`VarLenError::TooLong`](crate::VarLenError::TooLong).
    pub fn read_varlen(&mut self) -> ReadResult<(u32, u8)> {
        let start = self.position;
        let rest = &self.buffer[start..];
        match varlen::decode(rest.iter().copied()) {
            Ok((value, nbytes)) => {
                self.position += nbytes as usize;
                Ok((value, nbytes))
            }
            Err(crate::VarLenError::Empty) | Err(crate::VarLenError::Truncated(_)) => {
                Err(ReaderError::oob(self.buffer.len()))
            }
            Err(e) => Err(inv_data(self, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_words() {
        let mut reader = Reader::from_byte_slice(&[0x00, 0x06, 0x00, 0x00, 0x01, 0xE0]);
        assert_eq!(reader.read_u16().unwrap(), 6);
        assert_eq!(reader.read_u32().unwrap(), 0x01E0);
        assert!(reader.is_at_end());
    }

    #[test]
    fn out_of_bounds_reports_position() {
        let mut reader = Reader::from_byte_slice(&[0x01, 0x02, 0x03]);
        reader.read_next().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(err.is_out_of_bounds());
        assert_eq!(err.position(), 1);
        // failed reads don't move the cursor
        assert_eq!(reader.buffer_position(), 1);
    }

    #[test]
    fn reads_varlen_and_advances() {
        let mut reader = Reader::from_byte_slice(&[0x84, 0x3C, 0x7F]);
        assert_eq!(reader.read_varlen().unwrap(), (0x023C, 2));
        assert_eq!(reader.read_varlen().unwrap(), (0x7F, 1));
        assert!(reader.read_varlen().unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn unterminated_varlen_is_a_parse_error() {
        let mut reader = Reader::from_byte_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        let err = reader.read_varlen().unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&crate::ParseError::VarLen(crate::VarLenError::TooLong))
        );
    }

    #[test]
    fn since_returns_consumed_bytes() {
        let mut reader = Reader::from_byte_slice(&[0x90, 0x40, 0x7F, 0x00]);
        let start = reader.buffer_position();
        reader.skip(3).unwrap();
        assert_eq!(reader.since(start), &[0x90, 0x40, 0x7F]);
    }
}

#![doc = r#"
Error types produced while decoding a MIDI file.

Fatal decode problems are grouped under [`ParseError`], which the
[`Reader`](crate::reader::Reader) wraps together with the byte position
in a [`ReaderError`](crate::reader::ReaderError).
"#]

use thiserror::Error;

use crate::file::{EventType, FormatType};

/// Any fatal problem found while decoding a file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The `MThd` chunk was rejected
    #[error("Invalid header: {0}")]
    Header(#[from] HeaderError),
    /// An `MTrk` chunk could not be decoded
    #[error("Track: {0}")]
    Track(#[from] TrackError),
    /// A variable-length quantity was malformed
    #[error("Varlen: {0}")]
    VarLen(#[from] VarLenError),
    /// An SMPTE offset or timing field was malformed
    #[error("Smpte: {0}")]
    Smpte(#[from] SmpteError),
}

/// Problems with the `MThd` chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The chunk id was not `MThd`
    #[error("Not a MIDI file: header id must be 'MThd', found {0:02x?}")]
    InvalidId([u8; 4]),
    /// The chunk length was not 6
    #[error("Header chunk must be 6 bytes, found {0}")]
    InvalidLength(u32),
    /// The format word was not 0, 1 or 2
    #[error("Header format must be 0, 1 or 2, found {0}")]
    InvalidFormat(u16),
    /// Track count doesn't fit the format
    #[error("Format {format:?} cannot hold {ntracks} track(s)")]
    InvalidTrackCount {
        /// Declared format
        format: FormatType,
        /// Declared number of tracks
        ntracks: u16,
    },
    /// Only format 1 files are played
    #[error("Format {0:?} files are not supported")]
    UnsupportedFormat(FormatType),
}

/// Problems found inside an `MTrk` chunk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// The chunk id was not `MTrk`
    #[error("Track #{track}: chunk id must be 'MTrk', found {id:02x?}")]
    InvalidId {
        /// Track index
        track: usize,
        /// The id bytes found
        id: [u8; 4],
    },
    /// The events didn't consume exactly the declared chunk length
    #[error("Track #{track}: declared {declared} bytes but parsed {parsed}")]
    LengthMismatch {
        /// Track index
        track: usize,
        /// Length field of the chunk
        declared: u32,
        /// Bytes actually consumed by events
        parsed: u32,
    },
    /// A status byte that is neither a status nor valid running status
    #[error("Track #{track}: unexpected status byte {status:#04x}")]
    UnknownStatus {
        /// Track index
        track: usize,
        /// The offending byte
        status: u8,
    },
    /// A meta type outside the supported table
    #[error("Track #{track}: unknown meta event type {kind:#04x}")]
    UnknownMeta {
        /// Track index
        track: usize,
        /// The meta type byte
        kind: u8,
    },
    /// A fixed-size meta event declared the wrong length
    #[error("Track #{track}: meta event {kind:#04x} must carry {expected} bytes, declared {found}")]
    MetaLength {
        /// Track index
        track: usize,
        /// The meta type byte
        kind: u8,
        /// Length from the fixed table
        expected: u8,
        /// Length byte found in the file
        found: u8,
    },
    /// A channel message with a status nibble outside 8..=E
    #[error("Track #{track}: unexpected MIDI message with status {status:#04x}")]
    UnexpectedMessage {
        /// Track index
        track: usize,
        /// Effective status byte
        status: u8,
    },
    /// The last event was not `FF 2F 00`
    #[error("Track #{0}: last event is not End of Track")]
    MissingEndOfTrack(usize),
    /// Bytes left over after the declared tracks
    #[error("{0} bytes remain after the last track")]
    TrailingBytes(usize),
}

/// Problems decoding or encoding a variable-length quantity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VarLenError {
    /// No byte was available
    #[error("no bytes to decode")]
    Empty,
    /// The quantity didn't terminate within 4 bytes
    #[error("more than 4 bytes used")]
    TooLong,
    /// The source ended before the terminating byte
    #[error("source ended mid-quantity after {0} byte(s)")]
    Truncated(u8),
    /// Value above 0x0FFFFFFF
    #[error("{0:#x} does not fit in 28 bits")]
    Overflow(u32),
}

/// Problems with SMPTE related fields.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SmpteError {
    /// The header's frame rate byte isn't -24, -25, -29 or -30
    #[error("Invalid header frame rate: {0}")]
    HeaderFrameTime(i8),
    /// The offset's frame type bits aren't 0..=3
    #[error("Invalid track frame type: {0}")]
    TrackFrame(u8),
    /// The offset payload isn't 5 bytes
    #[error("Offset must be 5 bytes, found {0}")]
    Length(usize),
    /// Hour above 23
    #[error("Hour out of range: {0}")]
    HourOffset(u8),
    /// Minute above 59
    #[error("Minute out of range: {0}")]
    MinuteOffset(u8),
    /// Second above 59
    #[error("Second out of range: {0}")]
    SecondOffset(u8),
    /// Subframe above 99
    #[error("Subframe out of range: {0}")]
    Subframe(u8),
}

/// Problems extracting the payload of a decoded event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The payload was requested from the wrong kind of event
    #[error("expected a {expected:?} event, found {found:?}")]
    WrongType {
        /// The type the extractor works on
        expected: EventType,
        /// The event's actual type
        found: EventType,
    },
    /// The stored message doesn't hold the recorded number of data bytes
    #[error("payload should be {expected} bytes, found {found}")]
    PayloadLength {
        /// Recorded data length
        expected: usize,
        /// Bytes actually present
        found: usize,
    },
}

/// Channel state setters reject values outside the MIDI data range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// A value above its field's maximum
    #[error("{field} value {value} out of range 0..={max}")]
    OutOfRange {
        /// Name of the rejected field
        field: &'static str,
        /// The rejected value
        value: u32,
        /// Largest accepted value
        max: u32,
    },
    /// Channel numbers are 0..=15 on the wire
    #[error("no channel with index {0}")]
    InvalidChannel(u8),
}

/// Failure to load a file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file couldn't be read
    #[error("could not read {path}: {source}")]
    Io {
        /// The path that was opened
        path: String,
        /// The underlying error
        source: std::io::Error,
    },
    /// The file isn't a playable MIDI file
    #[error("could not parse {path}: {source}")]
    Parse {
        /// The path that was parsed
        path: String,
        /// Where and why decoding stopped
        source: crate::reader::ReaderError,
    },
}

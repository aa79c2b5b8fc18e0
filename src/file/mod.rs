#![doc = r#"
Rusty representation of a [`MidiFile`]

Only format 1 files (simultaneous tracks sharing the tempo of the first
track) are decoded. A file is parsed eagerly: every event of every track is
read, validated and stored with its raw bytes, so the file can be written
back byte for byte with [`MidiFile::to_bytes`].
"#]

/// Contains the [`MidiFileBuilder`](builder::MidiFileBuilder) and the
/// chunk readers.
pub mod builder;

mod event;
pub use event::*;

mod format;
pub use format::*;

mod meta;
pub use meta::*;

mod timing;
pub use timing::*;

mod track;
pub use track::*;

pub use builder::chunk::Header;

use core::fmt;
use std::path::Path;

use tracing::debug;

use crate::{
    LoadError,
    bytes::to_hex,
    channel::Channel,
    reader::{ReadResult, Reader, inv_data},
};
use builder::MidiFileBuilder;

#[doc = r#"
A decoded Standard MIDI File.

# Example
```rust
# use coolmidi::file::MidiFile;
let bytes = [
    b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x01, 0xE0,
    b'M', b'T', b'r', b'k', 0, 0, 0, 8,
    0x00, 0x90, 0x40, 0x7F,
    0x00, 0xFF, 0x2F, 0x00,
];
let file = MidiFile::parse(&bytes).unwrap();

assert_eq!(file.tracks().len(), 1);
assert_eq!(file.tracks()[0].events().len(), 2);
assert_eq!(file.to_bytes(), bytes);
```
"#]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MidiFile {
    header: Header,
    tracks: Vec<Track>,
    channels_used: [bool; 16],
    filename: Option<String>,
}

impl MidiFile {
    /// Parse a set of bytes into a file struct
    pub fn parse(bytes: &[u8]) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);
        let header = Header::read(&mut reader)?;
        debug!(
            "header: {:?}, {} tracks, tickdiv {}",
            header.format_type(),
            header.ntracks(),
            header.tickdiv()
        );
        let mut builder = MidiFileBuilder::new(header)
            .map_err(|e| inv_data(&reader, e))?;

        while builder.track_count() < header.ntracks() as usize {
            builder.read_track(&mut reader)?;
        }

        builder.build(&reader)
    }

    /// Read and parse the file at `path`, remembering its name
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut file = Self::parse(&bytes).map_err(|source| LoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        file.filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(file)
    }

    /// Returns header info
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns header timing
    pub const fn timing(&self) -> Timing {
        self.header.timing()
    }

    /// Returns the tracks in file order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Which channels carry notes, polyphonic pressure or pitch bend
    pub const fn channels_used(&self) -> [bool; 16] {
        self.channels_used
    }

    /// The name of the file this was read from
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The tempo of the first track, in microseconds per quarter note
    pub fn tempo(&self) -> u32 {
        self.tracks.first().map_or(DEFAULT_TEMPO, Track::tempo)
    }

    /// Length of the longest track in ticks
    pub fn duration_ticks(&self) -> u64 {
        self.tracks
            .iter()
            .map(Track::duration_ticks)
            .max()
            .unwrap_or_default()
    }

    /// The file bytes, reproduced from the decoded chunks
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = 14 + self.tracks.iter().map(|t| t.len() as usize + 8).sum::<usize>();
        let mut out = Vec::with_capacity(len);
        self.header.write_to(&mut out);
        for track in &self.tracks {
            track.write_to(&mut out);
        }
        out
    }

    /// [`MidiFile::to_bytes`] as lowercase hex without separators
    pub fn hexdump(&self) -> String {
        to_hex(&self.to_bytes())
    }
}

impl fmt::Display for MidiFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.filename {
            writeln!(f, "{name}")?;
        }
        let header = &self.header;
        writeln!(
            f,
            "format {} | {} tracks | tickdiv {} ({})",
            header.format_type().word(),
            header.ntracks(),
            header.tickdiv(),
            if header.uses_ticks_per_beat() {
                "ticks per beat"
            } else {
                "smpte"
            }
        )?;
        let used = Channel::all()
            .into_iter()
            .filter(|c| self.channels_used[c.index()])
            .map(|c| c.to_string())
            .collect::<Vec<_>>();
        writeln!(f, "channels used: [{}]", used.join(", "))?;
        let tempo = self.tempo();
        writeln!(
            f,
            "tempo {tempo} us/qn ({} bpm) | {:.3} ms/tick",
            bpm(tempo),
            self.timing().micros_per_tick(tempo) / 1000.
        )?;
        for track in &self.tracks {
            writeln!(
                f,
                "track #{}: {} bytes, {} events, {} ticks, {}",
                track.index(),
                track.len(),
                track.events().len(),
                track.duration_ticks(),
                track.time_signature()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeaderError, ParseError, TrackError};
    use pretty_assertions::assert_eq;

    fn file_bytes(format: u16, tracks: &[&[u8]]) -> Vec<u8> {
        let mut bytes = b"MThd".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(&format.to_be_bytes());
        bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&480u16.to_be_bytes());
        for track in tracks {
            bytes.extend_from_slice(b"MTrk");
            bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
            bytes.extend_from_slice(track);
        }
        bytes
    }

    #[test]
    fn rejects_other_formats() {
        let bytes = file_bytes(0, &[&[0x00, 0xFF, 0x2F, 0x00]]);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::Header(HeaderError::UnsupportedFormat(
                FormatType::SingleMultiChannel
            )))
        );
    }

    #[test]
    fn meta_length_must_match_table() {
        let bytes = file_bytes(1, &[&[0x00, 0xFF, 0x51, 0x04, 0, 0, 0, 0, 0x00, 0xFF, 0x2F, 0x00]]);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::Track(TrackError::MetaLength {
                track: 0,
                kind: 0x51,
                expected: 3,
                found: 4
            }))
        );
    }

    #[test]
    fn unknown_meta_is_fatal() {
        let bytes = file_bytes(1, &[&[0x00, 0xFF, 0x60, 0x00, 0x00, 0xFF, 0x2F, 0x00]]);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::Track(TrackError::UnknownMeta {
                track: 0,
                kind: 0x60
            }))
        );
    }

    #[test]
    fn running_status_needs_a_previous_midi_event() {
        let bytes = file_bytes(1, &[&[0x00, 0x40, 0x7F, 0x00, 0xFF, 0x2F, 0x00]]);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::Track(TrackError::UnknownStatus {
                track: 0,
                status: 0x40
            }))
        );
    }

    #[test]
    fn trailing_bytes() {
        let mut bytes = file_bytes(1, &[&[0x00, 0xFF, 0x2F, 0x00]]);
        bytes.push(0);
        assert!(MidiFile::parse(&bytes).is_ok());
        bytes.push(0);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.parse_error(),
            Some(&ParseError::Track(TrackError::TrailingBytes(2)))
        );
    }

    #[test]
    fn sysex_and_text_payloads() {
        let bytes = file_bytes(
            1,
            &[&[
                0x00, 0xFF, 0x03, 0x03, b'f', b'o', b'o', // track name
                0x00, 0xF0, 0x03, 0x7E, 0x7F, 0xF7, // sysex
                0x00, 0xFF, 0x2F, 0x00,
            ]],
        );
        let file = MidiFile::parse(&bytes).unwrap();
        let events = file.tracks()[0].events();
        assert_eq!(events[0].kind(), EventKind::Meta(MetaKind::TrackName));
        assert_eq!(events[0].meta_payload().unwrap(), b"foo");
        assert_eq!(events[1].sysex_payload().unwrap(), &[0x7E, 0x7F, 0xF7]);
        assert_eq!(file.to_bytes(), bytes);
    }

    #[test]
    fn summary_lists_tracks() {
        let bytes = file_bytes(1, &[&[0x00, 0x91, 0x40, 0x7F, 0x60, 0xFF, 0x2F, 0x00]]);
        let file = MidiFile::parse(&bytes).unwrap();
        assert!(file.channels_used()[1]);
        let summary = file.to_string();
        assert!(summary.contains("channels used: [2]"));
        assert!(summary.contains("120 bpm"));
        assert!(summary.contains("track #0: 8 bytes, 2 events, 96 ticks, 4/4"));
    }
}

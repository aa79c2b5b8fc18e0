pub mod chunk;

use tracing::debug;

use super::MidiFile;
use crate::{
    HeaderError, TrackError,
    file::{FormatType, Track},
    reader::{ReadResult, Reader, inv_data},
};
use chunk::{Header, TrackChunkReader};

/// Assembles a [`MidiFile`] from its chunks.
pub struct MidiFileBuilder {
    header: Header,
    tracks: Vec<Track>,
    channels_used: [bool; 16],
}

impl MidiFileBuilder {
    /// Start a file from its header.
    ///
    /// Only format 1 files are decoded further.
    pub fn new(header: Header) -> Result<Self, HeaderError> {
        if header.format_type() != FormatType::Simultaneous {
            return Err(HeaderError::UnsupportedFormat(header.format_type()));
        }
        Ok(Self {
            header,
            tracks: Vec::with_capacity(header.ntracks() as usize),
            channels_used: [false; 16],
        })
    }

    /// Read the next track chunk from `reader`
    pub fn read_track(&mut self, reader: &mut Reader<'_>) -> ReadResult<()> {
        let index = self.tracks.len();
        let track = TrackChunkReader::new(reader, index, &mut self.channels_used)
            .read(self.header.format_type())?;
        self.tracks.push(track);
        Ok(())
    }

    /// Number of tracks read so far
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Finish the file.
    ///
    /// At most one stray byte may follow the last track. Every track then
    /// takes its tempo and time signature from the first one.
    pub fn build(mut self, reader: &Reader<'_>) -> ReadResult<MidiFile> {
        let trailing = reader.remaining();
        if trailing > 1 {
            return Err(inv_data(reader, TrackError::TrailingBytes(trailing)));
        }

        if let Some(first) = self.tracks.first() {
            let (tempo, time_signature) = (first.tempo(), first.time_signature());
            debug!("aligning {} tracks to tempo {tempo}, {time_signature}", self.tracks.len());
            for track in &mut self.tracks {
                track.set_timing(tempo, time_signature);
            }
        }

        Ok(MidiFile {
            header: self.header,
            tracks: self.tracks,
            channels_used: self.channels_used,
            filename: None,
        })
    }
}

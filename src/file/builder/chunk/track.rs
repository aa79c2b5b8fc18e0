use tracing::{debug, warn};

use crate::{
    TrackError,
    file::{
        Event, EventKind, FormatType, MetaKind, SmpteOffset, TimeSignature, Track,
        tempo_from_bytes,
    },
    message::VoiceKind,
    reader::{ReadResult, Reader, inv_data},
};

/// Chunk id of a track
pub const TRACK_ID: [u8; 4] = *b"MTrk";

/// Decodes the events of one `MTrk` chunk.
///
/// Tempo, time signature and SMPTE offset are captured on the first
/// occurrence; repeats are logged and ignored. Channels carrying notes,
/// polyphonic pressure or pitch bend are flagged in `channels_used`.
pub(crate) struct TrackChunkReader<'r, 'slc> {
    reader: &'r mut Reader<'slc>,
    index: usize,
    channels_used: &'r mut [bool; 16],
    /// status of the previous event, if it was a MIDI event
    previous_status: Option<u8>,
    tempo_set: bool,
    time_signature_set: bool,
}

impl<'r, 'slc> TrackChunkReader<'r, 'slc> {
    pub(crate) fn new(
        reader: &'r mut Reader<'slc>,
        index: usize,
        channels_used: &'r mut [bool; 16],
    ) -> Self {
        Self {
            reader,
            index,
            channels_used,
            previous_status: None,
            tempo_set: false,
            time_signature_set: false,
        }
    }

    /// Read the chunk header and every event up to the declared length.
    pub(crate) fn read(mut self, format: FormatType) -> ReadResult<Track> {
        let index = self.index;
        let id: [u8; 4] = self.reader.read_exact_size()?;
        if id != TRACK_ID {
            return Err(inv_data(self.reader, TrackError::InvalidId { track: index, id }));
        }
        let declared = self.reader.read_u32()?;
        let start = self.reader.buffer_position();
        debug!("track #{index}: {declared} bytes at offset {start}");

        let mut track = Track::new(index, declared);
        while self.reader.buffer_position() - start < declared as usize {
            let event = self.read_event(&mut track)?;
            track.push(event);
        }

        let parsed = (self.reader.buffer_position() - start) as u32;
        if parsed != declared {
            return Err(inv_data(
                self.reader,
                TrackError::LengthMismatch {
                    track: index,
                    declared,
                    parsed,
                },
            ));
        }
        if !track.events().last().is_some_and(Event::is_end_of_track) {
            return Err(inv_data(self.reader, TrackError::MissingEndOfTrack(index)));
        }

        // the first two tracks may carry timing in format 1
        if format == FormatType::Simultaneous && index > 1 {
            let timing_related = track
                .events()
                .iter()
                .filter_map(|e| match e.kind() {
                    EventKind::Meta(kind) if kind.is_timing_related() => Some(kind),
                    _ => None,
                })
                .collect::<Vec<_>>();
            if !timing_related.is_empty() {
                warn!(
                    "track #{index}: timing related meta events outside the tempo track: {timing_related:?}"
                );
            }
        }

        debug!("track #{index}: {} events", track.events().len());
        Ok(track)
    }

    fn read_event(&mut self, track: &mut Track) -> ReadResult<Event> {
        let (ticks, tick_bytes) = self.reader.read_varlen()?;
        let message_start = self.reader.buffer_position();
        let status = self.reader.read_next()?;

        let event = match status {
            0xFF => {
                self.previous_status = None;
                self.read_meta(ticks, tick_bytes, message_start, track)?
            }
            0xF0 | 0xF7 => {
                self.previous_status = None;
                let (len, len_bytes) = self.reader.read_varlen()?;
                self.reader.skip(len as usize)?;
                Event::new(
                    ticks,
                    tick_bytes,
                    EventKind::Sysex,
                    self.reader.since(message_start).to_vec(),
                    false,
                    1 + len_bytes as usize,
                    len as usize,
                )
            }
            0x80..=0xEF => self.read_midi(ticks, tick_bytes, message_start, status, false)?,
            0x00..=0x7F => match self.previous_status {
                Some(previous) => {
                    self.read_midi(ticks, tick_bytes, message_start, previous, true)?
                }
                None => {
                    return Err(inv_data(
                        self.reader,
                        TrackError::UnknownStatus {
                            track: self.index,
                            status,
                        },
                    ));
                }
            },
            _ => {
                return Err(inv_data(
                    self.reader,
                    TrackError::UnknownStatus {
                        track: self.index,
                        status,
                    },
                ));
            }
        };
        Ok(event)
    }

    fn read_midi(
        &mut self,
        ticks: u32,
        tick_bytes: u8,
        message_start: usize,
        status: u8,
        running_status: bool,
    ) -> ReadResult<Event> {
        let Some(kind) = VoiceKind::from_status(status) else {
            return Err(inv_data(
                self.reader,
                TrackError::UnexpectedMessage {
                    track: self.index,
                    status,
                },
            ));
        };
        // under running status the first data byte was already read as the status
        let remaining = kind.data_len() - running_status as usize;
        self.reader.skip(remaining)?;

        if kind.marks_channel_used() {
            self.channels_used[(status & 0x0F) as usize] = true;
        }

        let raw = self.reader.since(message_start);
        let mut message = Vec::with_capacity(raw.len() + 1);
        if running_status {
            message.push(status);
        }
        message.extend_from_slice(raw);

        self.previous_status = Some(status);
        Ok(Event::new(
            ticks,
            tick_bytes,
            EventKind::Midi(kind),
            message,
            running_status,
            1,
            kind.data_len(),
        ))
    }

    fn read_meta(
        &mut self,
        ticks: u32,
        tick_bytes: u8,
        message_start: usize,
        track: &mut Track,
    ) -> ReadResult<Event> {
        let type_byte = self.reader.read_next()?;
        let kind = MetaKind::try_from(type_byte).map_err(|_| {
            inv_data(
                self.reader,
                TrackError::UnknownMeta {
                    track: self.index,
                    kind: type_byte,
                },
            )
        })?;

        let (data_start, data_len) = match kind.fixed_len() {
            Some(expected) => {
                let found = self.reader.read_next()?;
                if found != expected {
                    return Err(inv_data(
                        self.reader,
                        TrackError::MetaLength {
                            track: self.index,
                            kind: type_byte,
                            expected,
                            found,
                        },
                    ));
                }
                let data = self.reader.read_exact(expected as usize)?;
                self.capture(kind, data, track)?;
                // End of Track's payload is its length byte
                let data_start = if expected == 0 { 2 } else { 3 };
                (data_start, expected as usize)
            }
            None => {
                let (len, len_bytes) = self.reader.read_varlen()?;
                self.reader.skip(len as usize)?;
                (2 + len_bytes as usize, len as usize)
            }
        };

        Ok(Event::new(
            ticks,
            tick_bytes,
            EventKind::Meta(kind),
            self.reader.since(message_start).to_vec(),
            false,
            data_start,
            data_len,
        ))
    }

    fn capture(&mut self, kind: MetaKind, data: &[u8], track: &mut Track) -> ReadResult<()> {
        let index = self.index;
        match kind {
            MetaKind::SetTempo => {
                let tempo = tempo_from_bytes([data[0], data[1], data[2]]);
                if self.tempo_set {
                    warn!(
                        "track #{index}: tempo already set to {}, ignoring {tempo}",
                        track.tempo()
                    );
                } else {
                    debug!("track #{index}: tempo {tempo}");
                    track.set_tempo(tempo);
                    self.tempo_set = true;
                }
            }
            MetaKind::TimeSignature => {
                let signature = TimeSignature::from_bytes([data[0], data[1], data[2], data[3]]);
                if signature.thirty_seconds_per_beat != 8 {
                    warn!(
                        "track #{index}: time signature with {} 32nd notes per quarter note",
                        signature.thirty_seconds_per_beat
                    );
                }
                if self.time_signature_set {
                    warn!(
                        "track #{index}: time signature already set to {}, ignoring {signature}",
                        track.time_signature()
                    );
                } else {
                    track.set_time_signature(signature);
                    self.time_signature_set = true;
                }
            }
            MetaKind::SmpteOffset => {
                if track.smpte_offset().is_none() {
                    let offset = SmpteOffset::parse(data).map_err(|e| inv_data(self.reader, e))?;
                    track.set_smpte_offset(offset);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

use core::fmt;

use crate::{
    EventError,
    bytes::to_hex,
    channel::Channel,
    file::{MetaKind, tempo_from_bytes},
    message::{ChannelMessage, VoiceKind},
    varlen,
};

/// The coarse classification of an event's status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    /// Status `8n`-`En`
    Midi,
    /// Status `FF`
    Meta,
    /// Status `F0` or `F7`
    Sysex,
}

/// What an event is, down to its voice or meta kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A channel voice message
    Midi(VoiceKind),
    /// A meta event
    Meta(MetaKind),
    /// A system exclusive message
    Sysex,
}

impl EventKind {
    /// The coarse type of this kind
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Midi(_) => EventType::Midi,
            Self::Meta(_) => EventType::Meta,
            Self::Sysex => EventType::Sysex,
        }
    }
}

#[doc = r#"
A single event of a track, as found in the file.

The message holds every byte from the status byte through the last data
byte. Running status events have the effective status byte re-inserted at
the front, so `message()[0]` is always the status.

The payload (the bytes after the status, meta type and length prefix) is
located with an offset and a length so it can be extracted without
re-parsing.
"#]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    ticks: u32,
    tick_bytes: u8,
    kind: EventKind,
    message: Vec<u8>,
    running_status: bool,
    data_start: usize,
    data_len: usize,
}

impl Event {
    pub(crate) fn new(
        ticks: u32,
        tick_bytes: u8,
        kind: EventKind,
        message: Vec<u8>,
        running_status: bool,
        data_start: usize,
        data_len: usize,
    ) -> Self {
        Self {
            ticks,
            tick_bytes,
            kind,
            message,
            running_status,
            data_start,
            data_len,
        }
    }

    /// `Cn pp`: select `program` on `channel`, due immediately
    pub fn program_change(channel: Channel, program: u8) -> Self {
        let status = 0xC0 | channel.index() as u8;
        Self::new(
            0,
            1,
            EventKind::Midi(VoiceKind::ProgramChange),
            vec![status, program & 0x7F],
            false,
            1,
            1,
        )
    }

    /// `Bn 07 vv`: set the volume controller of `channel`, due immediately
    pub fn channel_volume(channel: Channel, volume: u8) -> Self {
        let status = 0xB0 | channel.index() as u8;
        Self::new(
            0,
            1,
            EventKind::Midi(VoiceKind::Controller),
            vec![status, 0x07, volume & 0x7F],
            false,
            1,
            2,
        )
    }

    /// Delta time in ticks since the previous event of the track
    pub const fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Number of bytes the delta time took in the file (1-4)
    pub const fn tick_bytes(&self) -> u8 {
        self.tick_bytes
    }

    /// The kind of event
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// The coarse type of event
    pub const fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// The full message, status byte included
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// True if the file omitted this event's status byte
    pub const fn running_status(&self) -> bool {
        self.running_status
    }

    /// The (effective) status byte
    pub fn status(&self) -> u8 {
        self.message.first().copied().unwrap_or_default()
    }

    /// The channel of a MIDI event
    pub fn channel(&self) -> Option<Channel> {
        match self.kind {
            EventKind::Midi(_) => Some(Channel::from_status(self.status())),
            _ => None,
        }
    }

    /// True for `FF 2F 00`
    pub const fn is_end_of_track(&self) -> bool {
        matches!(self.kind, EventKind::Meta(MetaKind::EndOfTrack))
    }

    /// True for Set Tempo meta events
    pub const fn is_tempo(&self) -> bool {
        matches!(self.kind, EventKind::Meta(MetaKind::SetTempo))
    }

    /// The tempo set by a Set Tempo event
    pub fn tempo(&self) -> Option<u32> {
        if !self.is_tempo() {
            return None;
        }
        let data: [u8; 3] = self.meta_payload().ok()?.try_into().ok()?;
        Some(tempo_from_bytes(data))
    }

    /// Bytes this event occupied in its track chunk
    pub fn encoded_len(&self) -> usize {
        self.tick_bytes as usize + self.message.len() - self.running_status as usize
    }

    fn payload(&self) -> &[u8] {
        self.message.get(self.data_start..).unwrap_or_default()
    }

    /// The data bytes of a meta event.
    ///
    /// End of Track has no data; its payload is the single `00` length byte.
    pub fn meta_payload(&self) -> Result<&[u8], EventError> {
        self.expect(EventType::Meta)?;
        let payload = self.payload();
        if self.is_end_of_track() {
            return Ok(payload);
        }
        if payload.len() != self.data_len {
            return Err(EventError::PayloadLength {
                expected: self.data_len,
                found: payload.len(),
            });
        }
        Ok(payload)
    }

    /// The bytes of a sysex message following its length prefix
    pub fn sysex_payload(&self) -> Result<&[u8], EventError> {
        self.expect(EventType::Sysex)?;
        let payload = self.payload();
        if payload.len() != self.data_len {
            return Err(EventError::PayloadLength {
                expected: self.data_len,
                found: payload.len(),
            });
        }
        Ok(payload)
    }

    /// Decode the channel message of a MIDI event
    pub fn channel_message(&self) -> Result<ChannelMessage, EventError> {
        self.expect(EventType::Midi)?;
        let payload = self.payload();
        ChannelMessage::from_bytes(self.status(), payload).ok_or(EventError::PayloadLength {
            expected: self.data_len,
            found: payload.len(),
        })
    }

    fn expect(&self, expected: EventType) -> Result<(), EventError> {
        let found = self.event_type();
        if found != expected {
            return Err(EventError::WrongType { expected, found });
        }
        Ok(())
    }

    /// Append the bytes this event occupied in the file.
    ///
    /// The delta time keeps its original width and running status events
    /// drop their status byte again.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        // ticks were decoded from at most four bytes, so they always fit
        out.extend(varlen::encode_padded(self.ticks, self.tick_bytes).unwrap_or_default());
        let skip = self.running_status as usize;
        out.extend_from_slice(&self.message[skip.min(self.message.len())..]);
    }

    /// The file bytes of this event as lowercase hex
    pub fn hexdump(&self) -> String {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out);
        to_hex(&out)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{:<6} {:<30}", self.ticks, format!("{:?}", self.kind))?;
        write!(f, " {}", to_hex(&self.message))?;
        if self.running_status {
            write!(f, " (running)")?;
        }
        Ok(())
    }
}

/// An event with its absolute position in ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticked<T> {
    ticks: u64,
    event: T,
}

impl<T> Ticked<T> {
    /// Attach an absolute tick count to `event`
    pub const fn new(ticks: u64, event: T) -> Self {
        Self { ticks, event }
    }

    /// Ticks from the start of the track
    pub const fn accumulated_ticks(&self) -> u64 {
        self.ticks
    }

    /// The wrapped event
    pub const fn event(&self) -> &T {
        &self.event
    }

    /// Unwrap the event
    pub fn into_event(self) -> T {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tempo_event() -> Event {
        Event::new(
            0,
            1,
            EventKind::Meta(MetaKind::SetTempo),
            vec![0xFF, 0x51, 0x03, 0x06, 0x1A, 0x80],
            false,
            3,
            3,
        )
    }

    #[test]
    fn meta_payload_extraction() {
        let tempo = tempo_event();
        assert_eq!(tempo.meta_payload().unwrap(), &[0x06, 0x1A, 0x80]);
        assert_eq!(tempo.tempo(), Some(400_000));
        assert_eq!(
            tempo.channel_message().unwrap_err(),
            EventError::WrongType {
                expected: EventType::Midi,
                found: EventType::Meta
            }
        );

        let eot = Event::new(
            0,
            1,
            EventKind::Meta(MetaKind::EndOfTrack),
            vec![0xFF, 0x2F, 0x00],
            false,
            2,
            0,
        );
        assert_eq!(eot.meta_payload().unwrap(), &[0x00]);
    }

    #[test]
    fn short_meta_payload_is_an_error() {
        let truncated = Event::new(
            0,
            1,
            EventKind::Meta(MetaKind::SetTempo),
            vec![0xFF, 0x51, 0x03, 0x06],
            false,
            3,
            3,
        );
        assert_eq!(
            truncated.meta_payload().unwrap_err(),
            EventError::PayloadLength {
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn running_status_hexdump_drops_status() {
        let event = Event::new(
            0x40,
            1,
            EventKind::Midi(VoiceKind::NoteOn),
            vec![0x90, 0x40, 0x00],
            true,
            1,
            2,
        );
        assert_eq!(event.hexdump(), "404000");
        assert_eq!(event.encoded_len(), 3);
        assert_eq!(event.channel(), Some(Channel::One));
        assert_eq!(event.channel_message().unwrap().data2, Some(0));
    }

    #[test]
    fn templates() {
        let program = Event::program_change(Channel::Ten, 25);
        assert_eq!(program.message(), &[0xC9, 25]);
        let volume = Event::channel_volume(Channel::Three, 100);
        assert_eq!(volume.message(), &[0xB2, 0x07, 100]);
        assert_eq!(
            volume.channel_message().unwrap(),
            ChannelMessage {
                kind: VoiceKind::Controller,
                channel: Channel::Three,
                data1: 7,
                data2: Some(100)
            }
        );
    }
}

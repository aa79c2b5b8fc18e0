#![doc = r#"
Channel voice messages

# Layout
```text
|--------------|---------------|---------------|
| kind|channel  | data 1        | data 2        |
| 1000 - 1110  | 0 - 127       | 0 - 127 / --  |
|--------------|---------------|---------------|
```
Program change and channel pressure carry a single data byte.
"#]

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::channel::Channel;

/// The upper nibble of a channel message's status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum VoiceKind {
    /// 0x8n
    NoteOff = 0x8,
    /// 0x9n
    NoteOn = 0x9,
    /// 0xAn
    PolyphonicPressure = 0xA,
    /// 0xBn
    Controller = 0xB,
    /// 0xCn
    ProgramChange = 0xC,
    /// 0xDn
    ChannelPressure = 0xD,
    /// 0xEn
    PitchBend = 0xE,
}

impl VoiceKind {
    /// Classify a status byte by its upper nibble
    pub fn from_status(status: u8) -> Option<Self> {
        Self::try_from(status >> 4).ok()
    }

    /// Number of data bytes following the status byte
    pub const fn data_len(self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            _ => 2,
        }
    }

    /// Whether a message of this kind marks its channel as used by a file.
    ///
    /// Controller, program and channel pressure messages don't.
    pub const fn marks_channel_used(self) -> bool {
        matches!(
            self,
            Self::NoteOff | Self::NoteOn | Self::PolyphonicPressure | Self::PitchBend
        )
    }
}

/// A decoded channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMessage {
    /// What the message does
    pub kind: VoiceKind,
    /// Which channel it addresses
    pub channel: Channel,
    /// First data byte
    pub data1: u8,
    /// Second data byte, absent for program change and channel pressure
    pub data2: Option<u8>,
}

impl ChannelMessage {
    /// Build a message from its status byte and data bytes.
    ///
    /// Returns `None` when the status isn't a voice message or the
    /// data count doesn't fit its kind.
    pub fn from_bytes(status: u8, data: &[u8]) -> Option<Self> {
        let kind = VoiceKind::from_status(status)?;
        if data.len() != kind.data_len() {
            return None;
        }
        Some(Self {
            kind,
            channel: Channel::from_status(status),
            data1: data[0],
            data2: data.get(1).copied(),
        })
    }

    /// The status byte: kind in the upper nibble, channel in the lower
    pub fn status(&self) -> u8 {
        (u8::from(self.kind) << 4) | self.channel.index() as u8
    }

    /// 14-bit pitch bend value (LSB first on the wire)
    pub fn pitch_bend(&self) -> Option<u16> {
        match (self.kind, self.data2) {
            (VoiceKind::PitchBend, Some(msb)) => {
                Some(((msb as u16 & 0x7F) << 7) | (self.data1 as u16 & 0x7F))
            }
            _ => None,
        }
    }

    /// The wire bytes of this message
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.status(), self.data1];
        bytes.extend(self.data2);
        bytes
    }
}

#[test]
fn voice_kind_lengths() {
    assert_eq!(VoiceKind::from_status(0x93), Some(VoiceKind::NoteOn));
    assert_eq!(VoiceKind::from_status(0xF0), None);
    assert_eq!(VoiceKind::ProgramChange.data_len(), 1);
    assert_eq!(VoiceKind::PitchBend.data_len(), 2);
    assert!(!VoiceKind::Controller.marks_channel_used());
}

#[test]
fn channel_message_bytes() {
    let msg = ChannelMessage::from_bytes(0xE1, &[0x00, 0x40]).unwrap();
    assert_eq!(msg.channel, Channel::Two);
    assert_eq!(msg.pitch_bend(), Some(8192));
    assert_eq!(msg.to_bytes(), vec![0xE1, 0x00, 0x40]);

    let program = ChannelMessage::from_bytes(0xC9, &[0x10]).unwrap();
    assert_eq!(program.data2, None);
    assert_eq!(program.to_bytes(), vec![0xC9, 0x10]);
    assert!(ChannelMessage::from_bytes(0xC9, &[0x10, 0x11]).is_none());
}

#![doc = r#"
Meta events (`FF <type> <len> <data>`).

Most meta types carry a fixed number of data bytes after a single length
byte. Sequence numbers, text-like events and sequencer specific data use a
variable-length length prefix instead.

| Type | Event              | Data bytes |
|------|--------------------|------------|
| 00   | Sequence number    | varlen     |
| 01-09| Text-like events   | varlen     |
| 20   | MIDI channel prefix| 1          |
| 21   | MIDI port          | 1          |
| 2F   | End of track       | 0          |
| 51   | Set tempo          | 3          |
| 54   | SMPTE offset       | 5          |
| 58   | Time signature     | 4          |
| 59   | Key signature      | 2          |
| 7F   | Sequencer specific | varlen     |
"#]

mod smpte_offset;
pub use smpte_offset::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The type byte of a meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MetaKind {
    /// FF 00
    SequenceNumber = 0x00,
    /// FF 01
    Text = 0x01,
    /// FF 02
    Copyright = 0x02,
    /// FF 03
    TrackName = 0x03,
    /// FF 04
    InstrumentName = 0x04,
    /// FF 05
    Lyric = 0x05,
    /// FF 06
    Marker = 0x06,
    /// FF 07
    CuePoint = 0x07,
    /// FF 08
    ProgramName = 0x08,
    /// FF 09
    DeviceName = 0x09,
    /// FF 20
    ChannelPrefix = 0x20,
    /// FF 21
    MidiPort = 0x21,
    /// FF 2F
    EndOfTrack = 0x2F,
    /// FF 51
    SetTempo = 0x51,
    /// FF 54
    SmpteOffset = 0x54,
    /// FF 58
    TimeSignature = 0x58,
    /// FF 59
    KeySignature = 0x59,
    /// FF 7F
    SequencerSpecific = 0x7F,
}

impl MetaKind {
    /// The type byte following `FF`
    pub fn type_byte(self) -> u8 {
        self.into()
    }

    /// Number of data bytes for fixed-size events.
    ///
    /// `None` means the data is preceded by a variable-length quantity.
    pub const fn fixed_len(self) -> Option<u8> {
        use MetaKind::*;
        match self {
            ChannelPrefix | MidiPort => Some(1),
            EndOfTrack => Some(0),
            SetTempo => Some(3),
            SmpteOffset => Some(5),
            TimeSignature => Some(4),
            KeySignature => Some(2),
            SequenceNumber | Text | Copyright | TrackName | InstrumentName | Lyric | Marker
            | CuePoint | ProgramName | DeviceName | SequencerSpecific => None,
        }
    }

    /// Marker, cue point, tempo, SMPTE offset, time and key signature.
    ///
    /// In a format 1 file these belong in the first track only.
    pub const fn is_timing_related(self) -> bool {
        matches!(
            self,
            Self::Marker
                | Self::CuePoint
                | Self::SetTempo
                | Self::SmpteOffset
                | Self::TimeSignature
                | Self::KeySignature
        )
    }
}

/// Decode the 24-bit payload of a Set Tempo event.
pub const fn tempo_from_bytes(data: [u8; 3]) -> u32 {
    u32::from_be_bytes([0, data[0], data[1], data[2]])
}

/// Beats per minute for a tempo in microseconds per quarter note.
pub const fn bpm(tempo: u32) -> u32 {
    if tempo == 0 { 0 } else { 60_000_000 / tempo }
}

/// The payload of a Time Signature event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,
    /// Beat unit as a power of two (2 means a quarter note)
    pub denominator_power: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note
    pub thirty_seconds_per_beat: u8,
}

impl TimeSignature {
    /// Build from the four data bytes of `FF 58 04 nn dd cc bb`
    pub const fn from_bytes(data: [u8; 4]) -> Self {
        Self {
            numerator: data[0],
            denominator_power: data[1],
            clocks_per_click: data[2],
            thirty_seconds_per_beat: data[3],
        }
    }

    /// The beat unit, e.g. 4 for x/4
    pub const fn denominator(&self) -> u32 {
        match 1u32.checked_shl(self.denominator_power as u32) {
            Some(denominator) => denominator,
            None => 0,
        }
    }
}

impl Default for TimeSignature {
    /// 4/4 with a click every quarter note
    fn default() -> Self {
        Self::from_bytes([4, 2, 24, 8])
    }
}

impl core::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator())
    }
}

#[test]
fn meta_length_table() {
    assert_eq!(MetaKind::try_from(0x51u8).unwrap().fixed_len(), Some(3));
    assert_eq!(MetaKind::try_from(0x2Fu8).unwrap().fixed_len(), Some(0));
    assert_eq!(MetaKind::Lyric.fixed_len(), None);
    assert_eq!(MetaKind::SequenceNumber.fixed_len(), None);
    assert!(MetaKind::try_from(0x60u8).is_err());
    assert!(MetaKind::KeySignature.is_timing_related());
    assert!(!MetaKind::TrackName.is_timing_related());
}

#[test]
fn tempo_and_time_signature() {
    assert_eq!(tempo_from_bytes([0x06, 0x1A, 0x80]), 400_000);
    assert_eq!(bpm(500_000), 120);
    let sig = TimeSignature::from_bytes([6, 3, 36, 8]);
    assert_eq!(sig.to_string(), "6/8");
    assert_eq!(TimeSignature::default().to_string(), "4/4");
}

#[test]
fn oversized_denominator_power() {
    const HALF: TimeSignature = TimeSignature::from_bytes([2, 1, 24, 8]);
    assert_eq!(HALF.denominator(), 2);
    assert_eq!(TimeSignature::from_bytes([4, 40, 24, 8]).denominator(), 0);
}

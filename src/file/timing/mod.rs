mod smpte;
pub use smpte::*;

use crate::SmpteError;

/// Microseconds per quarter note when a file sets no tempo (120 BPM).
pub const DEFAULT_TEMPO: u32 = 500_000;

/// The header timing type.
///
/// The `tickdiv` word of the header is either the number of ticks per
/// quarter note (high bit clear) or an SMPTE frame rate and ticks per
/// frame (high bit set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timing {
    /// The midi file's delta times are defined using a tick rate per quarter note
    TicksPerQuarterNote(TicksPerQuarterNote),

    /// The midi file's delta times are defined using an SMPTE and MIDI Time Code
    Smpte(SmpteHeader),
}

impl Timing {
    /// The tickrate per quarter note defines what a "quarter note" means.
    ///
    /// The leading bit of the u16 is disregarded, so 1-32767
    pub const fn new_ticks_per_quarter_note(tpqn: u16) -> Self {
        Self::TicksPerQuarterNote(TicksPerQuarterNote { inner: tpqn & 0x7FFF })
    }

    /// Define the timing in terms of fps and ticks per frame
    pub const fn new_smpte(fps: SmpteFps, ticks_per_frame: u8) -> Self {
        Self::Smpte(SmpteHeader {
            fps,
            ticks_per_frame,
        })
    }

    /// Interpret the raw `tickdiv` word of a header.
    pub fn from_tickdiv(tickdiv: u16) -> Result<Self, SmpteError> {
        let [hi, lo] = tickdiv.to_be_bytes();
        match hi >> 7 {
            0 => Ok(Self::new_ticks_per_quarter_note(tickdiv)),
            _ => SmpteHeader::new([hi, lo]).map(Self::Smpte),
        }
    }

    /// Returns Some if the midi timing is defined
    /// as ticks per quarter note
    pub const fn ticks_per_quarter_note(&self) -> Option<u16> {
        match self {
            Self::TicksPerQuarterNote(t) => Some(t.ticks_per_quarter_note()),
            _ => None,
        }
    }

    /// True when delta times are in tempo-relative ticks.
    pub const fn uses_ticks_per_beat(&self) -> bool {
        matches!(self, Self::TicksPerQuarterNote(_))
    }

    /// Length of one tick in microseconds.
    ///
    /// For metrical timing this is `tempo / tpqn`. SMPTE timing is
    /// absolute, so `tempo` is ignored:
    /// `1 000 000 / (fps × ticks_per_frame)`.
    pub fn micros_per_tick(&self, tempo: u32) -> f64 {
        match self {
            Self::TicksPerQuarterNote(t) => {
                tempo as f64 / t.ticks_per_quarter_note().max(1) as f64
            }
            Self::Smpte(v) => {
                let ticks_per_second = v.fps().as_division() as u32 * v.ticks_per_frame() as u32;
                1_000_000. / ticks_per_second.max(1) as f64
            }
        }
    }
}

/// A representation of the `tpqn` timing for a MIDI file
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TicksPerQuarterNote {
    pub(crate) inner: u16,
}
impl TicksPerQuarterNote {
    /// Returns the ticks per quarter note for the file.
    pub const fn ticks_per_quarter_note(&self) -> u16 {
        self.inner
    }
}

/// A representation of the `smpte` timing for a MIDI file
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteHeader {
    pub(crate) fps: SmpteFps,
    pub(crate) ticks_per_frame: u8,
}

impl SmpteHeader {
    fn new(bytes: [u8; 2]) -> Result<Self, SmpteError> {
        //first bit is known to be 1 when calling this
        //Bits 14 thru 8 contain one of the four values -24, -25, -29, or -30
        let byte = bytes[0] as i8;

        let frame = match byte {
            -24 => SmpteFps::TwentyFour,
            -25 => SmpteFps::TwentyFive,
            -29 => SmpteFps::TwentyNine,
            -30 => SmpteFps::Thirty,
            _ => return Err(SmpteError::HeaderFrameTime(byte)),
        };
        Ok(Self {
            fps: frame,
            ticks_per_frame: bytes[1],
        })
    }

    /// Returns the frames per second
    pub const fn fps(&self) -> SmpteFps {
        self.fps
    }

    /// Returns the ticks per frame
    pub const fn ticks_per_frame(&self) -> u8 {
        self.ticks_per_frame
    }
}

#[test]
fn tickdiv_interpretation() {
    assert_eq!(
        Timing::from_tickdiv(0x01E0).unwrap().ticks_per_quarter_note(),
        Some(480)
    );
    let smpte = Timing::from_tickdiv(0xE728).unwrap();
    assert_eq!(smpte, Timing::new_smpte(SmpteFps::TwentyFive, 40));
    assert!(!smpte.uses_ticks_per_beat());
    assert_eq!(
        Timing::from_tickdiv(0x8128),
        Err(SmpteError::HeaderFrameTime(-127))
    );
}

#[test]
fn micros_per_tick() {
    let tpqn = Timing::new_ticks_per_quarter_note(480);
    assert_eq!(tpqn.micros_per_tick(500_000), 500_000. / 480.);
    // 25 fps × 40 subframes is a millisecond resolution
    let smpte = Timing::new_smpte(SmpteFps::TwentyFive, 40);
    assert_eq!(smpte.micros_per_tick(500_000), 1000.);
    assert_eq!(smpte.micros_per_tick(250_000), 1000.);
}

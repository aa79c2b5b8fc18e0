#![doc = r#"
SMPTE frame rates.

Files may time their events in absolute SMPTE frames instead of
tempo-relative ticks, and tracks may carry an SMPTE start offset. Both use
one of the four frame rates below.
"#]

/// The possible FPS (Frames Per Second) for MIDI tracks and files
///
/// The "TwentyNine" variant represents 29.97 fps drop-frame timecode
/// (30000/1001 fps). No frames are dropped; the timecode numbering skips
/// values to stay aligned with real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmpteFps {
    /// 24 frames per second
    TwentyFour,
    /// 25 frames per second
    TwentyFive,
    /// 29.97 frames per second
    TwentyNine,
    /// 30 frames per second
    Thirty,
}

impl SmpteFps {
    /// The nominal frame rate used for tick arithmetic.
    ///
    /// Drop-frame 29.97 fps returns 30 here.
    pub const fn as_division(&self) -> u8 {
        match self {
            Self::TwentyFour => 24,
            Self::TwentyFive => 25,
            Self::TwentyNine => 30,
            Self::Thirty => 30,
        }
    }
    /// The precise frame rate, including 30000/1001 for drop-frame.
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::TwentyFour => 24.,
            Self::TwentyFive => 25.,
            Self::TwentyNine => DROP_FRAME,
            Self::Thirty => 30.,
        }
    }
}

const DROP_FRAME: f64 = 30_000. / 1001.;

use crate::{SmpteError, file::SmpteFps};

/// The SMPTE time at which a track is meant to start (`FF 54 05`).
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmpteOffset {
    /// The frame rate for this offset.
    pub fps: SmpteFps,
    /// Hour component of the time code (0-23).
    pub hour: u8,
    /// Minute component of the time code (0-59).
    pub minute: u8,
    /// Second component of the time code (0-59).
    pub second: u8,
    /// Frame number within the current second.
    pub frame: u8,
    /// Hundredths of a frame (0-99).
    pub subframe: u8,
}

impl SmpteOffset {
    /// Convert this SMPTE offset to microseconds using its own frame rate.
    pub const fn as_micros(&self) -> f64 {
        ((((self.hour as u64 * 3600) + (self.minute as u64) * 60 + self.second as u64) * 1_000_000)
            as f64)
            + ((self.frame as u64) * 1_000_000) as f64 / self.fps.as_f64()
            + ((self.subframe as u32) * 10_000) as f64 / self.fps.as_f64()
    }

    /// Parse the 5 data bytes of an SMPTE offset event.
    ///
    /// - Byte 0: `0rrhhhhh` where `rr` is frame rate type, `hhhhh` is hours
    /// - Byte 1: Minutes (0-59)
    /// - Byte 2: Seconds (0-59)
    /// - Byte 3: Frames
    /// - Byte 4: Fractional frames in 100ths (0-99)
    pub const fn parse(data: &[u8]) -> Result<Self, SmpteError> {
        if data.len() != 5 {
            return Err(SmpteError::Length(data.len()));
        }

        // 0 rr hhhhh
        let fps = match data[0] >> 5 {
            0 => SmpteFps::TwentyFour,
            1 => SmpteFps::TwentyFive,
            2 => SmpteFps::TwentyNine,
            3 => SmpteFps::Thirty,
            v => return Err(SmpteError::TrackFrame(v)),
        };
        let hour = data[0] & 0b0001_1111;
        if hour > 23 {
            return Err(SmpteError::HourOffset(hour));
        }
        let minute = data[1];
        if minute > 59 {
            return Err(SmpteError::MinuteOffset(minute));
        }
        let second = data[2];
        if second > 59 {
            return Err(SmpteError::SecondOffset(second));
        }
        let frame = data[3];
        let subframe = data[4];
        if subframe > 99 {
            return Err(SmpteError::Subframe(subframe));
        }
        Ok(Self {
            fps,
            hour,
            minute,
            second,
            frame,
            subframe,
        })
    }
}

#[test]
fn parse_smpte_offset() {
    use pretty_assertions::assert_eq;
    // the bytes after 00 FF 54 05
    let bytes = [0x41, 0x17, 0x2D, 0x0C, 0x22];
    let offset = SmpteOffset::parse(&bytes).unwrap();

    assert_eq!(offset.fps, SmpteFps::TwentyNine);
    assert_eq!(offset.hour, 1);
    assert_eq!(offset.minute, 23);
    assert_eq!(offset.second, 45);
    assert_eq!(offset.frame, 12);
    assert_eq!(offset.subframe, 34);
}

#[test]
fn parse_invalid_smpte_offset() {
    use pretty_assertions::assert_eq;
    assert_eq!(
        SmpteOffset::parse(&[0x7F, 0x17, 0x2D, 0x0C, 0x22]).unwrap_err(),
        SmpteError::HourOffset(31)
    );
    assert_eq!(
        SmpteOffset::parse(&[0x41, 0x50, 0x2D, 0x0C, 0x22]).unwrap_err(),
        SmpteError::MinuteOffset(80)
    );
    assert_eq!(
        SmpteOffset::parse(&[0x41, 0x17]).unwrap_err(),
        SmpteError::Length(2)
    );
}

#[test]
fn offset_in_micros() {
    // 00:00:01 frame 12 at 25 fps
    let offset = SmpteOffset::parse(&[0x20, 0, 1, 12, 0]).unwrap();
    assert_eq!(offset.as_micros(), 1_480_000.);
}

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[doc = r#"
The file format word of the `MThd` chunk.

- Format 0: a single multi-channel track
- Format 1: two or more tracks played simultaneously. The first track is
  the tempo track carrying every timing related meta event.
- Format 2: one or more independent sequences

Only [`FormatType::Simultaneous`] files are decoded past the header.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum FormatType {
    /// Format 0
    SingleMultiChannel = 0,
    /// Format 1
    Simultaneous = 1,
    /// Format 2
    SequentiallyIndependent = 2,
}

impl FormatType {
    /// The format word as stored in the header
    pub fn word(self) -> u16 {
        self.into()
    }

    /// True if `ntracks` is a legal track count for this format
    pub const fn accepts_track_count(self, ntracks: u16) -> bool {
        match self {
            Self::SingleMultiChannel => ntracks == 1,
            Self::Simultaneous | Self::SequentiallyIndependent => ntracks >= 1,
        }
    }
}

#[test]
fn format_words() {
    assert_eq!(FormatType::try_from(1u16).unwrap(), FormatType::Simultaneous);
    assert_eq!(FormatType::SequentiallyIndependent.word(), 2);
    assert!(FormatType::try_from(3u16).is_err());
    assert!(!FormatType::SingleMultiChannel.accepts_track_count(2));
    assert!(FormatType::Simultaneous.accepts_track_count(13));
    assert!(!FormatType::Simultaneous.accepts_track_count(0));
}

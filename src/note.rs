use core::fmt;

#[doc = r#"
A note number as carried by note on/off and polyphonic pressure messages.

Notes are 7-bit. Note `0` is `C-1`, note `60` is middle C (`C4`) and note
`127` is `G9`.

# Example
```rust
# use coolmidi::note::{Key, Note};
let note = Note::new(63);

assert_eq!(note.key(), Key::DSharp);
assert_eq!(note.octave(), 4);
assert_eq!(note.to_string(), "D#4");
```
"#]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Note(u8);

impl Note {
    /// Create a note, masking off the high bit
    pub const fn new(byte: u8) -> Self {
        Self(byte & 0x7F)
    }

    /// The key of the note within its octave
    #[inline]
    pub const fn key(&self) -> Key {
        Key::from_mod_12(self.0 % 12)
    }

    /// The octave, from -1 to 9
    #[inline]
    pub const fn octave(&self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Returns the underlying byte of the note
    pub const fn byte(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key(), self.octave())
    }
}

#[allow(missing_docs)]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// The twelve keys of an octave
pub enum Key {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Key {
    /// Returns true if the key is a black key
    #[inline]
    pub const fn is_sharp(&self) -> bool {
        use Key::*;
        matches!(self, CSharp | DSharp | FSharp | GSharp | ASharp)
    }

    const fn from_mod_12(value: u8) -> Self {
        use Key::*;
        match value {
            0 => C,
            1 => CSharp,
            2 => D,
            3 => DSharp,
            4 => E,
            5 => F,
            6 => FSharp,
            7 => G,
            8 => GSharp,
            9 => A,
            10 => ASharp,
            _ => B,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Key::*;
        let name = match self {
            C => "C",
            CSharp => "C#",
            D => "D",
            DSharp => "D#",
            E => "E",
            F => "F",
            FSharp => "F#",
            G => "G",
            GSharp => "G#",
            A => "A",
            ASharp => "A#",
            B => "B",
        };
        f.write_str(name)
    }
}

#[test]
fn note_names() {
    assert_eq!(Note::new(60).to_string(), "C4");
    assert_eq!(Note::new(0).to_string(), "C-1");
    assert_eq!(Note::new(127).to_string(), "G9");
    assert_eq!(Note::new(0xFF), Note::new(127));
    assert!(Note::new(94).key().is_sharp());
}

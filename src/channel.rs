#![doc = r#"
The state of the sixteen MIDI channels during playback.

Each [`ChannelState`] mirrors what a synthesizer would remember about one
channel: the sounding note, the controller array, the selected program,
pitch bend and aftertouch. Only the
[`Controller`](crate::controller::Controller) mutates it, through
[`ChannelState::apply`].
"#]

use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    ChannelError,
    message::{ChannelMessage, VoiceKind},
    note::Note,
};

/// Controller number of channel volume
pub const CONTROLLER_VOLUME: u8 = 7;
/// Controller number of pan
pub const CONTROLLER_PAN: u8 = 10;
/// Pitch bend value meaning "no bend"
pub const PITCH_BEND_CENTER: u16 = 8192;
/// Largest 14-bit pitch bend value
pub const PITCH_BEND_MAX: u16 = 16383;

const DATA_MAX: u8 = 127;

#[doc = r#"
One of the sixteen MIDI channels.

The discriminant is the wire nibble (0-15); [`Channel::number`] gives the
1-16 numbering shown to people.
"#]
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive, IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[num_enum(error_type(name = ChannelError, constructor = ChannelError::InvalidChannel))]
#[repr(u8)]
pub enum Channel {
    One = 0,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Eleven,
    Twelve,
    Thirteen,
    Fourteen,
    Fifteen,
    Sixteen,
}

impl Channel {
    /// The channel addressed by the low nibble of a status byte
    pub const fn from_status(status: u8) -> Self {
        use Channel::*;
        match status & 0x0F {
            0 => One,
            1 => Two,
            2 => Three,
            3 => Four,
            4 => Five,
            5 => Six,
            6 => Seven,
            7 => Eight,
            8 => Nine,
            9 => Ten,
            10 => Eleven,
            11 => Twelve,
            12 => Thirteen,
            13 => Fourteen,
            14 => Fifteen,
            _ => Sixteen,
        }
    }

    /// All channels in wire order
    pub const fn all() -> [Channel; 16] {
        let mut out = [Channel::One; 16];
        let mut i = 0;
        while i < 16 {
            out[i] = Self::from_status(i as u8);
            i += 1;
        }
        out
    }

    /// Wire index, 0-15
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human numbering, 1-16
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

fn check(field: &'static str, value: u8) -> Result<u8, ChannelError> {
    if value > DATA_MAX {
        return Err(ChannelError::OutOfRange {
            field,
            value: value as u32,
            max: DATA_MAX as u32,
        });
    }
    Ok(value)
}

/// What a synthesizer remembers about one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    channel: Channel,
    used: bool,
    note: u8,
    note_on: bool,
    velocity: u8,
    controllers: Vec<u8>,
    last_controller: u8,
    program: u8,
    pitch_bend: u16,
    pressure: u8,
    polyphonic_pressure: Vec<u8>,
}

impl ChannelState {
    /// A silent channel with every controller at zero
    pub fn new(channel: Channel, used: bool) -> Self {
        Self {
            channel,
            used,
            note: 0,
            note_on: false,
            velocity: 0,
            controllers: vec![0; 128],
            last_controller: 0,
            program: 0,
            pitch_bend: PITCH_BEND_CENTER,
            pressure: 0,
            polyphonic_pressure: vec![0; 128],
        }
    }

    /// Which channel this is
    pub const fn channel(&self) -> Channel {
        self.channel
    }
    /// True if the current file plays notes on this channel
    pub const fn used(&self) -> bool {
        self.used
    }
    /// The last note started or stopped
    pub const fn note(&self) -> u8 {
        self.note
    }
    /// True while a note is sounding
    pub const fn note_on(&self) -> bool {
        self.note_on
    }
    /// Velocity of the sounding note
    pub const fn velocity(&self) -> u8 {
        self.velocity
    }
    /// Value of controller `index`
    pub fn controller(&self, index: u8) -> Option<u8> {
        self.controllers.get(index as usize).copied()
    }
    /// Number of the last controller that changed
    pub const fn last_controller(&self) -> u8 {
        self.last_controller
    }
    /// Selected program (instrument)
    pub const fn program(&self) -> u8 {
        self.program
    }
    /// 14-bit pitch bend, 8192 is centered
    pub const fn pitch_bend(&self) -> u16 {
        self.pitch_bend
    }
    /// Channel aftertouch
    pub const fn pressure(&self) -> u8 {
        self.pressure
    }
    /// Aftertouch of `note`
    pub fn polyphonic_pressure(&self, note: u8) -> Option<u8> {
        self.polyphonic_pressure.get(note as usize).copied()
    }
    /// Controller 7
    pub fn volume(&self) -> u8 {
        self.controllers[CONTROLLER_VOLUME as usize]
    }

    /// Start `note` at `velocity`
    pub fn set_note(&mut self, note: u8, velocity: u8) -> Result<(), ChannelError> {
        let note = check("note", note)?;
        self.velocity = check("velocity", velocity)?;
        self.note = note;
        self.note_on = true;
        Ok(())
    }

    /// Stop the sounding note
    pub fn release_note(&mut self) {
        self.note_on = false;
        self.note = 0;
        self.velocity = 0;
    }

    /// Set controller `index` to `value`
    pub fn set_controller(&mut self, index: u8, value: u8) -> Result<(), ChannelError> {
        let index = check("controller", index)?;
        let value = check("controller value", value)?;
        self.controllers[index as usize] = value;
        self.last_controller = index;
        Ok(())
    }

    /// Shorthand for controller 7
    pub fn set_volume(&mut self, volume: u8) -> Result<(), ChannelError> {
        self.set_controller(CONTROLLER_VOLUME, volume)
    }

    /// Select a program
    pub fn set_program(&mut self, program: u8) -> Result<(), ChannelError> {
        self.program = check("program", program)?;
        Ok(())
    }

    /// Set the 14-bit pitch bend
    pub fn set_pitch_bend(&mut self, value: u16) -> Result<(), ChannelError> {
        if value > PITCH_BEND_MAX {
            return Err(ChannelError::OutOfRange {
                field: "pitch bend",
                value: value as u32,
                max: PITCH_BEND_MAX as u32,
            });
        }
        self.pitch_bend = value;
        Ok(())
    }

    /// Set channel aftertouch
    pub fn set_pressure(&mut self, pressure: u8) -> Result<(), ChannelError> {
        self.pressure = check("pressure", pressure)?;
        Ok(())
    }

    /// Set the aftertouch of a single note
    pub fn set_polyphonic_pressure(&mut self, note: u8, pressure: u8) -> Result<(), ChannelError> {
        let note = check("note", note)?;
        let pressure = check("pressure", pressure)?;
        self.polyphonic_pressure[note as usize] = pressure;
        Ok(())
    }

    /// Apply a channel message to this state.
    ///
    /// A note on with velocity 0 releases the note.
    pub fn apply(&mut self, msg: &ChannelMessage) -> Result<(), ChannelError> {
        let data2 = msg.data2.unwrap_or_default();
        match msg.kind {
            VoiceKind::NoteOn if data2 > 0 => self.set_note(msg.data1, data2),
            VoiceKind::NoteOn | VoiceKind::NoteOff => {
                self.release_note();
                Ok(())
            }
            VoiceKind::PolyphonicPressure => self.set_polyphonic_pressure(msg.data1, data2),
            VoiceKind::Controller => self.set_controller(msg.data1, data2),
            VoiceKind::ProgramChange => self.set_program(msg.data1),
            VoiceKind::ChannelPressure => self.set_pressure(msg.data1),
            VoiceKind::PitchBend => {
                self.set_pitch_bend(((data2 as u16) << 7) | msg.data1 as u16)
            }
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let note = if self.note_on {
            Note::new(self.note).to_string()
        } else {
            "---".to_string()
        };
        let controller = match self.last_controller {
            CONTROLLER_VOLUME => "Volume".to_string(),
            CONTROLLER_PAN => "Pan".to_string(),
            other => other.to_string(),
        };
        write!(
            f,
            "ch{:>2} {:<4} vel={:03} vol={:03} cc={:<6} prg={:03} bend={:05} pres={:03}",
            self.channel,
            note,
            self.velocity,
            self.volume(),
            controller,
            self.program,
            self.pitch_bend,
            self.pressure
        )
    }
}

/// The sixteen channel states of a playing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    states: Vec<ChannelState>,
}

impl Channels {
    /// Fresh channels, marking the ones a file uses
    pub fn new(used: [bool; 16]) -> Self {
        Self {
            states: Channel::all()
                .into_iter()
                .map(|channel| ChannelState::new(channel, used[channel.index()]))
                .collect(),
        }
    }

    /// The state of `channel`
    pub fn get(&self, channel: Channel) -> &ChannelState {
        &self.states[channel.index()]
    }

    /// Mutable state of `channel`
    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelState {
        &mut self.states[channel.index()]
    }

    /// All channels in wire order
    pub fn iter(&self) -> impl Iterator<Item = &ChannelState> {
        self.states.iter()
    }

    /// Number of channels the file uses
    pub fn used_count(&self) -> usize {
        self.states.iter().filter(|s| s.used()).count()
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::new([false; 16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn channel_numbering() {
        assert_eq!(Channel::from_status(0x9F), Channel::Sixteen);
        assert_eq!(Channel::Ten.number(), 10);
        assert_eq!(Channel::try_from(3u8), Ok(Channel::Four));
        assert_eq!(Channel::try_from(16u8), Err(ChannelError::InvalidChannel(16)));
        assert_eq!(Channel::all()[15], Channel::Sixteen);
    }

    #[test]
    fn setters_validate_ranges() {
        let mut state = ChannelState::new(Channel::One, true);
        assert_eq!(state.pitch_bend(), PITCH_BEND_CENTER);
        state.set_volume(100).unwrap();
        assert_eq!(state.volume(), 100);
        assert_eq!(state.last_controller(), CONTROLLER_VOLUME);
        assert_eq!(
            state.set_controller(7, 128),
            Err(ChannelError::OutOfRange {
                field: "controller value",
                value: 128,
                max: 127
            })
        );
        assert!(state.set_pitch_bend(16384).is_err());
        assert!(state.set_pitch_bend(16383).is_ok());
        assert!(state.set_program(200).is_err());
        // a rejected value leaves the state untouched
        assert_eq!(state.volume(), 100);
    }

    #[test]
    fn applies_channel_messages() {
        let mut state = ChannelState::new(Channel::One, true);
        let on = ChannelMessage::from_bytes(0x90, &[60, 90]).unwrap();
        state.apply(&on).unwrap();
        assert!(state.note_on());
        assert_eq!((state.note(), state.velocity()), (60, 90));
        assert!(state.to_string().contains("C4"));

        let off = ChannelMessage::from_bytes(0x90, &[60, 0]).unwrap();
        state.apply(&off).unwrap();
        assert!(!state.note_on());

        let bend = ChannelMessage::from_bytes(0xE0, &[0x7F, 0x7F]).unwrap();
        state.apply(&bend).unwrap();
        assert_eq!(state.pitch_bend(), PITCH_BEND_MAX);
    }

    #[test]
    fn channels_count_usage() {
        let mut used = [false; 16];
        used[0] = true;
        used[9] = true;
        let mut channels = Channels::new(used);
        assert_eq!(channels.used_count(), 2);
        assert!(channels.get(Channel::Ten).used());
        channels.get_mut(Channel::Two).set_program(5).unwrap();
        assert_eq!(channels.get(Channel::Two).program(), 5);
    }
}

use crate::{
    bytes::to_hex,
    file::{DEFAULT_TEMPO, Event, SmpteOffset, Ticked, TimeSignature},
};

/// An `MTrk` chunk and the timing values found in it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    index: usize,
    len: u32,
    events: Vec<Event>,
    tempo: u32,
    time_signature: TimeSignature,
    smpte_offset: Option<SmpteOffset>,
}

impl Track {
    pub(crate) fn new(index: usize, len: u32) -> Self {
        Self {
            index,
            len,
            events: Vec::new(),
            tempo: DEFAULT_TEMPO,
            time_signature: TimeSignature::default(),
            smpte_offset: None,
        }
    }

    pub(crate) fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub(crate) fn set_timing(&mut self, tempo: u32, time_signature: TimeSignature) {
        self.tempo = tempo;
        self.time_signature = time_signature;
    }

    pub(crate) fn set_tempo(&mut self, tempo: u32) {
        self.tempo = tempo;
    }

    pub(crate) fn set_time_signature(&mut self, time_signature: TimeSignature) {
        self.time_signature = time_signature;
    }

    pub(crate) fn set_smpte_offset(&mut self, offset: SmpteOffset) {
        self.smpte_offset = Some(offset);
    }

    /// Position of the track in the file, starting at 0
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The length field of the chunk
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// True if the chunk declared no bytes
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The events, in file order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Microseconds per quarter note
    pub const fn tempo(&self) -> u32 {
        self.tempo
    }

    /// The time signature in effect
    pub const fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    /// The SMPTE start time, if the track declared one
    pub const fn smpte_offset(&self) -> Option<&SmpteOffset> {
        self.smpte_offset.as_ref()
    }

    /// Events paired with their running tick count from the track start
    pub fn ticked_events(&self) -> impl Iterator<Item = Ticked<&Event>> {
        self.events.iter().scan(0u64, |ticks, event| {
            *ticks += event.ticks() as u64;
            Some(Ticked::new(*ticks, event))
        })
    }

    /// Total length of the track in ticks
    pub fn duration_ticks(&self) -> u64 {
        self.events.iter().map(|e| e.ticks() as u64).sum()
    }

    /// Append the chunk bytes, header included
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&self.len.to_be_bytes());
        for event in &self.events {
            event.write_to(out);
        }
    }

    /// The chunk bytes as lowercase hex
    pub fn hexdump(&self) -> String {
        let mut out = Vec::with_capacity(self.len as usize + 8);
        self.write_to(&mut out);
        to_hex(&out)
    }
}

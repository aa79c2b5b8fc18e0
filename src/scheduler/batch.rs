use itertools::Itertools;

use crate::{
    file::{Event, EventKind, MidiFile, Ticked, Timing},
    micros::UMicros,
};

/// Events that fire at the same tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBatch {
    relative_ticks: u64,
    events: Vec<Ticked<Event>>,
}

/// Within a tick, meta and sysex events go before channel messages so a
/// tempo or program change applies to notes at the same instant.
fn dispatch_priority(event: &Event) -> u8 {
    match event.kind() {
        EventKind::Meta(_) | EventKind::Sysex => 0,
        EventKind::Midi(_) => 1,
    }
}

impl EventBatch {
    /// Merge every track of `file` into batches.
    ///
    /// The first batch always sits at tick 0, even when nothing fires
    /// there. Events keep their track order within a tick, after the
    /// meta-before-MIDI ordering. End of Track events are dropped.
    pub fn from_file(file: &MidiFile) -> Vec<EventBatch> {
        let merged = file
            .tracks()
            .iter()
            .flat_map(|track| track.ticked_events())
            .filter(|ticked| !ticked.event().is_end_of_track())
            .sorted_by_key(|ticked| (ticked.accumulated_ticks(), dispatch_priority(ticked.event())));

        let mut batches = vec![EventBatch {
            relative_ticks: 0,
            events: Vec::new(),
        }];
        let mut previous = 0;
        for (tick, group) in &merged.chunk_by(|ticked| ticked.accumulated_ticks()) {
            let events = group
                .map(|ticked| Ticked::new(tick, (*ticked.event()).clone()))
                .collect::<Vec<_>>();
            if tick == 0 {
                batches[0].events = events;
            } else {
                batches.push(EventBatch {
                    relative_ticks: tick - previous,
                    events,
                });
                previous = tick;
            }
        }
        batches
    }

    /// Ticks since the previous batch
    pub const fn relative_ticks(&self) -> u64 {
        self.relative_ticks
    }

    /// Events firing at this instant, in dispatch order
    pub fn events(&self) -> &[Ticked<Event>] {
        &self.events
    }

    /// Absolute tick of this batch
    pub fn absolute_ticks(&self) -> u64 {
        self.events
            .first()
            .map(Ticked::accumulated_ticks)
            .unwrap_or_default()
    }
}

/// Wall-clock delay for `ticks` at `tempo`
pub fn delay_for(ticks: u64, timing: Timing, tempo: u32) -> UMicros {
    UMicros::from_f64(ticks as f64 * timing.micros_per_tick(tempo))
}

/// How long the batches take to play from `tempo`, following every
/// Set Tempo event on the way.
pub fn playing_time(batches: &[EventBatch], timing: Timing, mut tempo: u32) -> UMicros {
    let mut total = UMicros::ZERO;
    for batch in batches {
        total += delay_for(batch.relative_ticks, timing, tempo);
        if let Some(last) = batch.events.iter().filter_map(|t| t.event().tempo()).last() {
            tempo = last;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MetaKind;
    use pretty_assertions::assert_eq;

    fn two_tracks() -> MidiFile {
        let mut bytes = vec![
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0x01, 0xE0, // header
        ];
        let track_a: &[u8] = &[
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo 500000
            0x00, 0x90, 0x3C, 0x64, // tick 0
            0x83, 0x60, 0x80, 0x3C, 0x00, // tick 480
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let track_b: &[u8] = &[
            0x83, 0x60, 0x91, 0x40, 0x64, // tick 480
            0x00, 0xC1, 0x05, // tick 480
            0x00, 0xFF, 0x2F, 0x00,
        ];
        for track in [track_a, track_b] {
            bytes.extend_from_slice(b"MTrk");
            bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
            bytes.extend_from_slice(track);
        }
        MidiFile::parse(&bytes).unwrap()
    }

    #[test]
    fn merges_tracks_by_tick() {
        let batches = EventBatch::from_file(&two_tracks());
        assert_eq!(batches.len(), 2);

        assert_eq!(batches[0].relative_ticks(), 0);
        let first = batches[0]
            .events()
            .iter()
            .map(|t| t.event().kind())
            .collect::<Vec<_>>();
        assert_eq!(
            first,
            vec![
                EventKind::Meta(MetaKind::SetTempo),
                EventKind::Midi(crate::message::VoiceKind::NoteOn)
            ]
        );

        assert_eq!(batches[1].relative_ticks(), 480);
        assert_eq!(batches[1].absolute_ticks(), 480);
        let second = batches[1]
            .events()
            .iter()
            .map(|t| t.event().status())
            .collect::<Vec<_>>();
        // track order is kept, end of track is gone
        assert_eq!(second, vec![0x80, 0x91, 0xC1]);
    }

    #[test]
    fn batch_delay_at_default_tempo() {
        let file = two_tracks();
        let batches = EventBatch::from_file(&file);
        let delay = delay_for(batches[1].relative_ticks(), file.timing(), file.tempo());
        assert_eq!(delay, UMicros::from_ms(500));
        assert_eq!(
            playing_time(&batches, file.timing(), file.tempo()),
            UMicros::from_ms(500)
        );
    }

    #[test]
    fn first_batch_exists_without_tick_zero_events() {
        let bytes = [
            b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x00, 0x60, //
            b'M', b'T', b'r', b'k', 0, 0, 0, 8, //
            0x60, 0x90, 0x40, 0x7F, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let batches = EventBatch::from_file(&MidiFile::parse(&bytes).unwrap());
        assert_eq!(batches.len(), 2);
        assert!(batches[0].events().is_empty());
        assert_eq!(batches[1].relative_ticks(), 0x60);
    }
}

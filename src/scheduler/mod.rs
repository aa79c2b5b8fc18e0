#![doc = r#"
Real-time dispatch of a [`MidiFile`].

A file is turned into [`EventBatch`]es once, then the dispatcher waits for
each batch's deadline and sends its events through the [`Controller`].
Deadlines accumulate from the start of the file, so time spent sending
doesn't push later batches back.
"#]

mod batch;
pub use batch::*;

mod wait;
pub use wait::*;

use std::{
    hint,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    EventError,
    controller::{Controller, ControllerError},
    file::{Event, EventKind, MidiFile},
};

/// Why a file stopped before its end.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A malformed event
    #[error(transparent)]
    Event(#[from] EventError),
    /// The controller or the receiver refused an event
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// How a file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every batch was dispatched
    Finished,
    /// A quit was requested
    Interrupted,
}

/// Drives the files of a [`Controller`] in real time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    controller: Arc<Controller>,
    wait: WaitStrategy,
}

impl Scheduler {
    /// A scheduler using the controller's configured wait strategy
    pub fn new(controller: Arc<Controller>) -> Self {
        let wait = controller.config().wait_strategy;
        Self { controller, wait }
    }

    /// Wait between batches with `wait` instead
    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// The controller driven by this scheduler
    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    /// Play files until the playlist runs out or the controller shuts down.
    ///
    /// A file that fails is logged, its channels muted, and playback moves
    /// on to the next one.
    pub fn run(&self) {
        while let Some(file) = self.controller.get_next_midi() {
            let name = file.filename().unwrap_or("<unnamed>").to_string();
            match self.play_file(&file) {
                Ok(outcome) => debug!("{name}: {outcome:?}"),
                Err(e) => {
                    error!("{name}: playback failed, {e}");
                    self.controller.mute_all();
                }
            }
            self.controller.finish_file();
        }
        info!("playlist done");
    }

    /// Run on a dispatcher thread of its own
    pub fn spawn(self) -> JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    /// Dispatch every batch of `file`, blocking until it is done.
    pub fn play_file(&self, file: &MidiFile) -> Result<PlaybackOutcome, PlaybackError> {
        let batches = EventBatch::from_file(file);
        let timing = file.timing();
        let mut remaining = playing_time(&batches, timing, self.controller.tempo().get());
        self.controller.set_remaining_time(remaining);

        let mut deadline = Instant::now();
        for batch in &batches {
            let delay = delay_for(batch.relative_ticks(), timing, self.controller.tempo().get());
            deadline += delay.as_duration();
            // a pause during the wait keeps the rest of the delay for after it
            while !self.wait.wait_until_or(deadline, || self.should_hold()) {
                if self.controller.quit_requested() {
                    return Ok(self.interrupt());
                }
                let paused_at = Instant::now();
                while !self.controller.is_playing() && !self.controller.quit_requested() {
                    hint::spin_loop();
                }
                deadline += paused_at.elapsed();
            }
            if self.controller.quit_requested() {
                return Ok(self.interrupt());
            }

            for ticked in batch.events() {
                self.dispatch(ticked.event())?;
            }
            remaining = remaining.saturating_sub(delay);
            self.controller.set_remaining_time(remaining);
        }
        Ok(PlaybackOutcome::Finished)
    }

    fn should_hold(&self) -> bool {
        !self.controller.is_playing() || self.controller.quit_requested()
    }

    fn interrupt(&self) -> PlaybackOutcome {
        debug!("quit requested, stopping file");
        self.controller.mute_all();
        PlaybackOutcome::Interrupted
    }

    fn dispatch(&self, event: &Event) -> Result<(), PlaybackError> {
        match event.kind() {
            EventKind::Midi(_) => {
                let message = event.channel_message()?;
                self.controller.update_channels(&message);
                self.controller.send_event(event)?;
            }
            EventKind::Meta(_) => {
                if let Some(tempo) = event.tempo() {
                    debug!("tempo {} -> {tempo}", self.controller.tempo().get());
                    self.controller.tempo().set(tempo);
                }
                self.controller.broadcast(event.kind());
                self.controller.send_event(event)?;
            }
            EventKind::Sysex => self.controller.send_event(event)?,
        }
        Ok(())
    }
}

/// Drain injected program and volume changes on a thread of their own.
///
/// The thread exits after [`Controller::shutdown`].
pub fn spawn_event_pump(controller: Arc<Controller>) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Some(event) = controller.listen_for_midi_event() {
            match event.channel_message() {
                Ok(message) => controller.update_channels(&message),
                Err(e) => warn!("injected event {event}: {e}"),
            }
            if let Err(e) = controller.send_event(&event) {
                warn!("could not send injected event {event}: {e}");
            }
        }
        debug!("event pump stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::Channel,
        controller::{PlaybackState, Playlist},
        message::{ChannelMessage, VoiceKind, WireMessage},
        micros::UMicros,
        receiver::RecordingReceiver,
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn file(track: &[u8]) -> MidiFile {
        let mut bytes = vec![b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x01, 0xE0];
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
        MidiFile::parse(&bytes).unwrap()
    }

    // about 10 ms per batch at the default tempo
    fn short_tune() -> MidiFile {
        file(&[
            0x00, 0xC0, 0x05, //
            0x00, 0x90, 0x3C, 0x64, //
            0x0A, 0x80, 0x3C, 0x00, //
            0x0A, 0x91, 0x40, 0x50, //
            0x00, 0xFF, 0x2F, 0x00,
        ])
    }

    fn setup(files: Vec<MidiFile>) -> (Scheduler, RecordingReceiver) {
        let receiver = RecordingReceiver::new();
        let controller = Controller::new(Playlist::new(files), receiver.clone()).shared();
        let scheduler = Scheduler::new(controller).with_wait_strategy(WaitStrategy::hybrid());
        (scheduler, receiver)
    }

    fn statuses(messages: &[WireMessage]) -> Vec<u8> {
        messages
            .iter()
            .filter_map(|m| match m {
                WireMessage::Channel(c) => Some(c.status()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn plays_a_file_in_order() {
        let (scheduler, receiver) = setup(vec![short_tune()]);
        let file = scheduler.controller().get_next_midi().unwrap();

        let start = Instant::now();
        let outcome = scheduler.play_file(&file).unwrap();
        assert_eq!(outcome, PlaybackOutcome::Finished);
        assert!(start.elapsed() >= Duration::from_millis(20));

        assert_eq!(statuses(&receiver.messages()), vec![0xC0, 0x90, 0x80, 0x91]);
        let channels = scheduler.controller().channels();
        assert_eq!(channels.get(Channel::One).program(), 5);
        assert!(!channels.get(Channel::One).note_on());
        assert!(channels.get(Channel::Two).note_on());
        assert_eq!(channels.get(Channel::Two).velocity(), 0x50);
        assert_eq!(scheduler.controller().current_remaining_time(), UMicros::ZERO);
    }

    #[test]
    fn tempo_changes_apply_to_following_batches() {
        let (scheduler, receiver) = setup(vec![file(&[
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // 500000
            0x00, 0x90, 0x3C, 0x64, //
            0x0A, 0xFF, 0x51, 0x03, 0x00, 0x27, 0x10, // 10000
            0x83, 0x60, 0x80, 0x3C, 0x00, // 480 ticks, 10 ms at the new tempo
            0x00, 0xFF, 0x2F, 0x00,
        ])]);
        let file = scheduler.controller().get_next_midi().unwrap();
        assert_eq!(scheduler.controller().tempo().get(), 500_000);

        let start = Instant::now();
        scheduler.play_file(&file).unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(scheduler.controller().tempo().get(), 10_000);
        // set tempo never reaches the receiver
        assert_eq!(statuses(&receiver.messages()), vec![0x90, 0x80]);
        assert_eq!(receiver.messages().len(), 2);
    }

    #[test]
    fn quit_mutes_and_stops() {
        let (scheduler, receiver) = setup(vec![short_tune()]);
        let file = scheduler.controller().get_next_midi().unwrap();
        scheduler.controller().shutdown();

        assert_eq!(scheduler.play_file(&file).unwrap(), PlaybackOutcome::Interrupted);
        let messages = receiver.messages();
        assert_eq!(messages.len(), 16);
        assert!(statuses(&messages).iter().all(|s| s & 0xF0 == 0xB0));
    }

    #[test]
    fn pause_holds_dispatch_until_resumed() {
        let (scheduler, receiver) = setup(vec![short_tune()]);
        let file = scheduler.controller().get_next_midi().unwrap();
        assert!(!scheduler.controller().toggle_playing());
        assert_eq!(scheduler.controller().state(), PlaybackState::Paused);
        receiver.clear();

        let controller = Arc::clone(scheduler.controller());
        let resume = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            controller.toggle_playing();
        });
        let start = Instant::now();
        assert_eq!(scheduler.play_file(&file).unwrap(), PlaybackOutcome::Finished);
        assert!(start.elapsed() >= Duration::from_millis(30));
        resume.join().unwrap();

        // restored volumes first, then the tune
        let statuses = statuses(&receiver.messages());
        assert_eq!(statuses.len(), 16 + 4);
        assert_eq!(&statuses[16..], &[0xC0, 0x90, 0x80, 0x91]);
    }

    #[test]
    fn pause_during_a_wait_keeps_the_remaining_delay() {
        // 480 ticks at 100000 us per quarter: a 100 ms gap
        let (scheduler, receiver) = setup(vec![file(&[
            0x00, 0xFF, 0x51, 0x03, 0x01, 0x86, 0xA0, //
            0x00, 0x90, 0x3C, 0x64, //
            0x83, 0x60, 0x80, 0x3C, 0x00, //
            0x00, 0xFF, 0x2F, 0x00,
        ])]);
        let file = scheduler.controller().get_next_midi().unwrap();

        let controller = Arc::clone(scheduler.controller());
        let toggler = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            controller.toggle_playing();
            thread::sleep(Duration::from_millis(190));
            controller.toggle_playing();
        });
        let start = Instant::now();
        assert_eq!(scheduler.play_file(&file).unwrap(), PlaybackOutcome::Finished);
        let elapsed = start.elapsed();
        toggler.join().unwrap();

        // 10 ms played, 190 ms paused, then the 90 ms left of the gap
        assert!(elapsed >= Duration::from_millis(280), "note off after {elapsed:?}");
        assert_eq!(statuses(&receiver.messages()).last(), Some(&0x80));
    }

    #[test]
    fn run_plays_the_whole_playlist() {
        let (scheduler, receiver) = setup(vec![short_tune(), short_tune()]);
        scheduler.clone().spawn().join().unwrap();

        assert_eq!(statuses(&receiver.messages()).len(), 8);
        assert_eq!(receiver.recording().reopened, 2);
        assert_eq!(scheduler.controller().state(), PlaybackState::Stopped);
    }

    #[test]
    fn event_pump_forwards_injected_changes() {
        let (scheduler, receiver) = setup(vec![]);
        let controller = Arc::clone(scheduler.controller());
        let pump = spawn_event_pump(Arc::clone(&controller));

        controller.add_channel_volume_event(Channel::Four, 99).unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while receiver.messages().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        controller.shutdown();
        pump.join().unwrap();

        assert_eq!(
            receiver.messages(),
            vec![WireMessage::Channel(ChannelMessage {
                kind: VoiceKind::Controller,
                channel: Channel::Four,
                data1: 7,
                data2: Some(99),
            })]
        );
        assert_eq!(controller.channels().get(Channel::Four).volume(), 99);
    }
}

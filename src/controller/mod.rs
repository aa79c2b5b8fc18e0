#![doc = r#"
Live control of a playback session.

The [`Controller`] is shared between the dispatcher thread, the event pump
and whatever front end drives playback, so every method takes `&self`.
Mutable state sits behind `parking_lot` mutexes (playlist, channels,
receiver) or atomics (flags, remaining time). Program and volume changes
requested by the front end travel through a bounded queue that the
[event pump](crate::scheduler::spawn_event_pump) drains.
"#]

mod playlist;
pub use playlist::*;

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use crossbeam_channel::{Sender, TrySendError, bounded, select};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    ChannelError, EventError, LoadError,
    channel::{Channel, Channels},
    config::PlayerConfig,
    file::{Event, EventKind, MidiFile},
    message::{ChannelMessage, WireMessage},
    micros::UMicros,
    receiver::{Receiver, ReceiverError, Timestamp},
    scheduler::{EventBatch, playing_time},
    tempo::SharedTempo,
};

/// Errors returned by [`Controller`] operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A replacement file couldn't be loaded
    #[error(transparent)]
    Load(#[from] LoadError),
    /// An event couldn't be converted for the receiver
    #[error(transparent)]
    Event(#[from] EventError),
    /// The receiver refused a message
    #[error(transparent)]
    Receiver(#[from] ReceiverError),
    /// A requested value is out of range
    #[error(transparent)]
    Channel(#[from] ChannelError),
    /// The injected event queue is full
    #[error("injected event queue is full")]
    QueueFull,
    /// The controller was shut down
    #[error("controller is shut down")]
    ShutDown,
}

/// Where playback stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No file is being played
    Stopped,
    /// A file is being dispatched
    Playing,
    /// A file is loaded but dispatch is held
    Paused,
}

/// Published after a channel or the session changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelNotification {
    /// The channel that changed; `None` for meta events affecting all
    pub channel: Option<Channel>,
    /// What changed it
    pub kind: EventKind,
}

/// The shared state of a playback session.
pub struct Controller {
    playlist: Mutex<Playlist>,
    channels: Mutex<Channels>,
    receiver: Mutex<Box<dyn Receiver>>,
    tempo: SharedTempo,
    config: PlayerConfig,

    is_playing: AtomicBool,
    looping: AtomicBool,
    quit_immediately: AtomicBool,
    active: AtomicBool,
    shut_down: AtomicBool,
    remaining_micros: AtomicU64,

    injected_tx: Sender<Event>,
    injected_rx: crossbeam_channel::Receiver<Event>,
    notify_tx: Sender<ChannelNotification>,
    notify_rx: crossbeam_channel::Receiver<ChannelNotification>,
    // dropped on shutdown, which wakes every blocked listener
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: crossbeam_channel::Receiver<()>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state())
            .field("looping", &self.is_looping())
            .field("tempo", &self.tempo.get())
            .finish()
    }
}

impl Controller {
    /// A controller with the default configuration
    pub fn new(playlist: Playlist, receiver: impl Receiver + 'static) -> Self {
        Self::with_config(playlist, receiver, PlayerConfig::default())
    }

    /// A controller with the given configuration
    pub fn with_config(
        playlist: Playlist,
        receiver: impl Receiver + 'static,
        config: PlayerConfig,
    ) -> Self {
        let (injected_tx, injected_rx) = bounded(config.event_queue_capacity.max(1));
        let (notify_tx, notify_rx) = bounded(config.notification_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = bounded(0);
        Self {
            playlist: Mutex::new(playlist),
            channels: Mutex::new(Channels::default()),
            receiver: Mutex::new(Box::new(receiver)),
            tempo: SharedTempo::default(),
            is_playing: AtomicBool::new(false),
            looping: AtomicBool::new(config.start_looping),
            quit_immediately: AtomicBool::new(false),
            active: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            remaining_micros: AtomicU64::new(0),
            injected_tx,
            injected_rx,
            notify_tx,
            notify_rx,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            config,
        }
    }

    /// Wrap in an [`Arc`] for sharing with the scheduler and the pump
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The configuration this controller was built with
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The tempo cell of the session
    pub fn tempo(&self) -> &SharedTempo {
        &self.tempo
    }

    /// Start the next file.
    ///
    /// A file queued by [`Controller::replace_currently_playing`] comes
    /// first; a looping session repeats the current file. Channels are
    /// reset from the file's channel usage, the receiver is reopened and
    /// the tempo and remaining time start over. Returns `None` when the
    /// playlist is exhausted or the controller was shut down.
    pub fn get_next_midi(&self) -> Option<Arc<MidiFile>> {
        if self.is_shut_down() {
            return None;
        }
        let file = {
            let mut playlist = self.playlist.lock();
            self.quit_immediately.store(false, Ordering::SeqCst);
            playlist.advance(self.is_looping())?
        };
        info!(
            "next file: {}",
            file.filename().unwrap_or("<unnamed>")
        );

        *self.channels.lock() = Channels::new(file.channels_used());
        {
            let mut receiver = self.receiver.lock();
            receiver.close();
            if let Err(e) = receiver.reopen() {
                warn!("could not reopen receiver: {e}");
            }
        }
        self.tempo.set(file.tempo());
        let total = playing_time(&EventBatch::from_file(&file), file.timing(), file.tempo());
        self.set_remaining_time(total);
        self.active.store(true, Ordering::SeqCst);
        self.is_playing.store(true, Ordering::SeqCst);
        Some(file)
    }

    /// The file being played
    pub fn current_midi(&self) -> Option<Arc<MidiFile>> {
        self.playlist.lock().current()
    }

    /// Pause or resume. Returns true if now playing.
    ///
    /// Pausing mutes every channel; resuming restores each channel's
    /// last volume.
    pub fn toggle_playing(&self) -> bool {
        // volumes are restored before the dispatcher may continue
        if self.is_playing() {
            self.is_playing.store(false, Ordering::SeqCst);
            info!("paused");
            self.mute_all();
            false
        } else {
            info!("resumed");
            self.restore_volumes();
            self.is_playing.store(true, Ordering::SeqCst);
            true
        }
    }

    /// Flip looping of the current file. Returns the new setting.
    pub fn toggle_current_midi_looping(&self) -> bool {
        let looping = !self.looping.fetch_xor(true, Ordering::SeqCst);
        info!("looping {}", if looping { "on" } else { "off" });
        looping
    }

    /// Load the file at `path` and switch to it at once.
    pub fn replace_currently_playing(&self, path: impl AsRef<Path>) -> Result<(), ControllerError> {
        let file = MidiFile::parse_file(path)?;
        self.replace_currently_playing_with(file);
        Ok(())
    }

    /// Append `file` to the playlist and switch to it at once.
    ///
    /// The running dispatch loop notices at its next batch and stops.
    pub fn replace_currently_playing_with(&self, file: MidiFile) {
        {
            let mut playlist = self.playlist.lock();
            let index = playlist.push(file);
            playlist.queue(index);
            // flagged under the lock so the next file never sees a stale quit
            self.quit_immediately.store(true, Ordering::SeqCst);
            info!("queued file #{index} to replace the current one");
        }
        self.mute_all();
    }

    /// Apply a channel message to the channel state.
    ///
    /// Out of range values are logged and skipped. A notification is
    /// published when the state changed, unless the queue is full.
    pub fn update_channels(&self, message: &ChannelMessage) {
        let applied = self.channels.lock().get_mut(message.channel).apply(message);
        match applied {
            Ok(()) => self.notify(ChannelNotification {
                channel: Some(message.channel),
                kind: EventKind::Midi(message.kind),
            }),
            Err(e) => warn!("channel {}: skipping update, {e}", message.channel),
        }
    }

    /// Publish a meta event that concerns every channel
    pub fn broadcast(&self, kind: EventKind) {
        self.notify(ChannelNotification {
            channel: None,
            kind,
        });
    }

    fn notify(&self, notification: ChannelNotification) {
        if let Err(TrySendError::Full(n)) = self.notify_tx.try_send(notification) {
            debug!("notification queue full, dropping {n:?}");
        }
    }

    /// Send an event to the receiver at once.
    ///
    /// Set Tempo events only drive the session tempo and are not sent.
    pub fn send_event(&self, event: &Event) -> Result<(), ControllerError> {
        if event.is_tempo() {
            return Ok(());
        }
        let message = WireMessage::from_event(event)?;
        self.send_message(&message)
    }

    fn send_message(&self, message: &WireMessage) -> Result<(), ControllerError> {
        self.receiver.lock().send(message, Timestamp::Immediate)?;
        Ok(())
    }

    /// Queue a program change for `channel`
    pub fn add_program_change_event(
        &self,
        channel: Channel,
        program: u8,
    ) -> Result<(), ControllerError> {
        check_data("program", program)?;
        self.inject(Event::program_change(channel, program))
    }

    /// Queue a volume change for `channel`
    pub fn add_channel_volume_event(
        &self,
        channel: Channel,
        volume: u8,
    ) -> Result<(), ControllerError> {
        check_data("volume", volume)?;
        self.inject(Event::channel_volume(channel, volume))
    }

    fn inject(&self, event: Event) -> Result<(), ControllerError> {
        info!("injecting {event}");
        self.injected_tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => ControllerError::QueueFull,
            TrySendError::Disconnected(_) => ControllerError::ShutDown,
        })
    }

    /// Block until an injected event arrives. `None` after shutdown.
    pub fn listen_for_midi_event(&self) -> Option<Event> {
        select! {
            recv(self.injected_rx) -> event => event.ok(),
            recv(self.shutdown_rx) -> _ => None,
        }
    }

    /// Block until a channel notification arrives. `None` after shutdown.
    pub fn listen_for_midi_channel_event(&self) -> Option<ChannelNotification> {
        select! {
            recv(self.notify_rx) -> notification => notification.ok(),
            recv(self.shutdown_rx) -> _ => None,
        }
    }

    /// A snapshot of the sixteen channels
    pub fn channels(&self) -> Channels {
        self.channels.lock().clone()
    }

    /// Time left in the current file
    pub fn current_remaining_time(&self) -> UMicros {
        UMicros::new(self.remaining_micros.load(Ordering::Relaxed))
    }

    pub(crate) fn set_remaining_time(&self, remaining: UMicros) {
        self.remaining_micros.store(remaining.us(), Ordering::Relaxed);
    }

    /// Stopped, playing or paused
    pub fn state(&self) -> PlaybackState {
        if !self.active.load(Ordering::SeqCst) {
            PlaybackState::Stopped
        } else if self.is_playing() {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    /// True unless paused
    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    /// True if the current file repeats
    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::SeqCst)
    }

    /// True once the current file should stop at the next batch
    pub fn quit_requested(&self) -> bool {
        self.quit_immediately.load(Ordering::SeqCst)
    }

    /// True after [`Controller::shutdown`]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Mark the current file as done
    pub(crate) fn finish_file(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.set_remaining_time(UMicros::ZERO);
    }

    /// Stop playback for good and wake every blocked listener
    pub fn shutdown(&self) {
        info!("shutting down");
        self.shut_down.store(true, Ordering::SeqCst);
        self.quit_immediately.store(true, Ordering::SeqCst);
        self.shutdown_tx.lock().take();
    }

    /// Send volume 0 on every channel without touching channel state
    pub fn mute_all(&self) {
        for channel in Channel::all() {
            self.send_transient(Event::channel_volume(channel, 0));
        }
    }

    fn restore_volumes(&self) {
        let volumes = self
            .channels
            .lock()
            .iter()
            .map(|state| (state.channel(), state.volume()))
            .collect::<Vec<_>>();
        for (channel, volume) in volumes {
            self.send_transient(Event::channel_volume(channel, volume));
        }
    }

    fn send_transient(&self, event: Event) {
        if let Err(e) = self.send_event(&event) {
            warn!("could not send {event}: {e}");
        }
    }
}

fn check_data(field: &'static str, value: u8) -> Result<(), ChannelError> {
    if value > 127 {
        return Err(ChannelError::OutOfRange {
            field,
            value: value as u32,
            max: 127,
        });
    }
    Ok(())
}

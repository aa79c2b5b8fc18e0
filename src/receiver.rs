#![doc = r#"
Where decoded messages go.

A [`Receiver`] is a fire-and-forget sink for [`WireMessage`]s: a hardware
port, a software synthesizer or a log. The
[`Controller`](crate::controller::Controller) owns exactly one and closes and
reopens it on every file transition.
"#]

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, trace};

use crate::{message::WireMessage, micros::UMicros};

/// When a message should sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timestamp {
    /// As soon as possible
    #[default]
    Immediate,
    /// At a point in time on the receiver's clock
    At(UMicros),
}

/// Errors produced by a [`Receiver`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReceiverError {
    /// The receiver isn't connected to anything
    #[error("receiver is not connected")]
    NotConnected,
    /// No output port matched
    #[error("no MIDI output port {0}")]
    NoSuchPort(String),
    /// The backend refused to connect
    #[error("could not connect: {0}")]
    Connect(String),
    /// The backend refused a message
    #[error("could not send: {0}")]
    Send(String),
}

/// A sink for MIDI messages.
pub trait Receiver: Send {
    /// Deliver one message
    fn send(&mut self, message: &WireMessage, at: Timestamp) -> Result<(), ReceiverError>;

    /// Reconnect after a [`Receiver::close`], or reset a live connection
    fn reopen(&mut self) -> Result<(), ReceiverError> {
        Ok(())
    }

    /// Release the underlying output
    fn close(&mut self) {}
}

/// Logs every message at trace level and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReceiver;

impl Receiver for LoggingReceiver {
    fn send(&mut self, message: &WireMessage, at: Timestamp) -> Result<(), ReceiverError> {
        trace!("{at:?} {message:?}");
        Ok(())
    }

    fn reopen(&mut self) -> Result<(), ReceiverError> {
        info!("receiver reopened");
        Ok(())
    }
}

/// What a [`RecordingReceiver`] has seen.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Every message in delivery order
    pub messages: Vec<WireMessage>,
    /// Number of [`Receiver::reopen`] calls
    pub reopened: usize,
    /// Number of [`Receiver::close`] calls
    pub closed: usize,
}

/// Keeps every message in memory. Clones share the same recording.
#[derive(Debug, Default, Clone)]
pub struct RecordingReceiver {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingReceiver {
    /// An empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far
    pub fn recording(&self) -> Recording {
        self.recording.lock().clone()
    }

    /// A copy of the messages recorded so far
    pub fn messages(&self) -> Vec<WireMessage> {
        self.recording.lock().messages.clone()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        *self.recording.lock() = Recording::default();
    }
}

impl Receiver for RecordingReceiver {
    fn send(&mut self, message: &WireMessage, _at: Timestamp) -> Result<(), ReceiverError> {
        self.recording.lock().messages.push(message.clone());
        Ok(())
    }

    fn reopen(&mut self) -> Result<(), ReceiverError> {
        self.recording.lock().reopened += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.recording.lock().closed += 1;
    }
}

#[cfg(feature = "midir")]
pub use hardware::MidirReceiver;

#[cfg(feature = "midir")]
mod hardware {
    use midir::{MidiOutput, MidiOutputConnection};
    use tracing::{debug, warn};

    use super::{Receiver, ReceiverError, Timestamp};
    use crate::message::WireMessage;

    const CLIENT_NAME: &str = "coolmidi output";

    /// Sends channel and sysex messages to an OS MIDI output port.
    ///
    /// Meta events have no wire form and are skipped. Timestamps are
    /// ignored; every message is sent immediately.
    pub struct MidirReceiver {
        port_name: Option<String>,
        midi: Option<MidiOutput>,
        connection: Option<MidiOutputConnection>,
    }

    impl std::fmt::Debug for MidirReceiver {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MidirReceiver")
                .field("port_name", &self.port_name)
                .field("connected", &self.connection.is_some())
                .finish()
        }
    }

    impl MidirReceiver {
        /// Connect to the first port whose name contains `port_name`, or
        /// the first port at all.
        pub fn new(port_name: Option<&str>) -> Result<Self, ReceiverError> {
            let midi =
                MidiOutput::new(CLIENT_NAME).map_err(|e| ReceiverError::Connect(e.to_string()))?;
            let mut receiver = Self {
                port_name: port_name.map(str::to_owned),
                midi: Some(midi),
                connection: None,
            };
            receiver.reopen()?;
            Ok(receiver)
        }

        /// Names of the output ports currently visible
        pub fn port_names() -> Result<Vec<String>, ReceiverError> {
            let midi =
                MidiOutput::new(CLIENT_NAME).map_err(|e| ReceiverError::Connect(e.to_string()))?;
            Ok(midi
                .ports()
                .iter()
                .map(|port| {
                    midi.port_name(port)
                        .unwrap_or("[unnamed output]".to_string())
                })
                .collect())
        }

        fn connect(&mut self) -> Result<(), ReceiverError> {
            let Some(midi) = self.midi.take() else {
                return Err(ReceiverError::NotConnected);
            };
            let ports = midi.ports();
            let wanted = self.port_name.as_deref().unwrap_or_default();
            let Some(port) = ports.iter().find(|port| {
                midi.port_name(port)
                    .is_ok_and(|name| name.contains(wanted))
            }) else {
                self.midi = Some(midi);
                return Err(ReceiverError::NoSuchPort(wanted.to_string()));
            };
            let name = midi.port_name(port).unwrap_or_default();
            match midi.connect(port, CLIENT_NAME) {
                Ok(conn) => {
                    debug!("connected to MIDI output {name}");
                    self.connection = Some(conn);
                    Ok(())
                }
                Err(err) => {
                    let message = err.to_string();
                    self.midi = Some(err.into_inner());
                    Err(ReceiverError::Connect(message))
                }
            }
        }
    }

    impl Receiver for MidirReceiver {
        fn send(&mut self, message: &WireMessage, _at: Timestamp) -> Result<(), ReceiverError> {
            if matches!(message, WireMessage::Meta { .. }) {
                return Ok(());
            }
            let Some(conn) = self.connection.as_mut() else {
                return Err(ReceiverError::NotConnected);
            };
            conn.send(&message.to_bytes())
                .map_err(|e| ReceiverError::Send(e.to_string()))
        }

        fn reopen(&mut self) -> Result<(), ReceiverError> {
            self.close();
            self.connect()
        }

        fn close(&mut self) {
            if let Some(conn) = self.connection.take() {
                self.midi = Some(conn.close());
            } else if self.midi.is_none() {
                warn!("MIDI output lost, creating a new client");
                self.midi = MidiOutput::new(CLIENT_NAME).ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel::Channel, message::ChannelMessage};
    use pretty_assertions::assert_eq;

    #[test]
    fn recording_is_shared_between_clones() {
        let receiver = RecordingReceiver::new();
        let mut boxed: Box<dyn Receiver> = Box::new(receiver.clone());
        let msg = WireMessage::from(ChannelMessage {
            kind: crate::message::VoiceKind::NoteOn,
            channel: Channel::One,
            data1: 60,
            data2: Some(100),
        });
        boxed.send(&msg, Timestamp::Immediate).unwrap();
        boxed.reopen().unwrap();
        boxed.close();
        assert_eq!(
            receiver.recording(),
            Recording {
                messages: vec![msg],
                reopened: 1,
                closed: 1
            }
        );
    }
}

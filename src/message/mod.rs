#![doc = r#"
Messages as they are handed to a [`Receiver`](crate::receiver::Receiver).

Decoded [`Event`]s keep the raw bytes found in the file. Before dispatch they
are converted into a [`WireMessage`], which is what output devices consume.
"#]

mod channel;
pub use channel::*;

use crate::{
    EventError,
    file::{Event, EventKind, MetaKind},
};

/// A message ready to be sent to an output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WireMessage {
    /// A channel voice message
    Channel(ChannelMessage),
    /// A meta event. Hardware outputs ignore these.
    Meta {
        /// The meta type
        kind: MetaKind,
        /// Its payload
        data: Vec<u8>,
    },
    /// A system exclusive message
    Sysex {
        /// `F0` or `F7`
        status: u8,
        /// Bytes following the length prefix
        data: Vec<u8>,
    },
}

impl WireMessage {
    /// Convert a decoded event
    pub fn from_event(event: &Event) -> Result<Self, EventError> {
        Ok(match event.kind() {
            EventKind::Midi(_) => Self::Channel(event.channel_message()?),
            EventKind::Meta(kind) => Self::Meta {
                kind,
                data: event.meta_payload()?.to_vec(),
            },
            EventKind::Sysex => Self::Sysex {
                status: event.status(),
                data: event.sysex_payload()?.to_vec(),
            },
        })
    }

    /// The bytes sent on a MIDI wire.
    ///
    /// Meta events have no wire form and produce `FF <type> <data>`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Channel(msg) => msg.to_bytes(),
            Self::Meta { kind, data } => {
                let mut bytes = vec![0xFF, kind.type_byte()];
                bytes.extend_from_slice(data);
                bytes
            }
            Self::Sysex { status, data } => {
                let mut bytes = Vec::with_capacity(data.len() + 1);
                bytes.push(*status);
                bytes.extend_from_slice(data);
                bytes
            }
        }
    }
}

impl From<ChannelMessage> for WireMessage {
    fn from(value: ChannelMessage) -> Self {
        Self::Channel(value)
    }
}

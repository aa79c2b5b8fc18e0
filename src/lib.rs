#![warn(missing_docs)]
#![doc = r#"
Standard MIDI File decoding and tick-accurate playback.

Files are decoded into a [`MidiFile`](file::MidiFile) of tracks of
[`Event`](file::Event)s that keep their exact bytes, so a file can be
written back or dumped as hex unchanged. The [`Scheduler`](scheduler::Scheduler)
merges every track into batches of simultaneous events and sends them,
at the right wall-clock time, through a [`Controller`](controller::Controller)
to a [`Receiver`](receiver::Receiver) such as a hardware MIDI port.

```rust
use coolmidi::prelude::*;

let bytes = [
    b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 1, 0x01, 0xE0,
    b'M', b'T', b'r', b'k', 0, 0, 0, 8,
    0x00, 0x90, 0x40, 0x7F,
    0x00, 0xFF, 0x2F, 0x00,
];
let file = MidiFile::parse(&bytes).unwrap();

let receiver = RecordingReceiver::new();
let controller = Controller::new(Playlist::new([file]), receiver.clone()).shared();
Scheduler::new(controller).run();

assert_eq!(receiver.messages().len(), 1);
```
"#]

pub mod bytes;
pub mod channel;
pub mod config;
pub mod controller;
pub mod file;
pub mod message;
pub mod micros;
pub mod note;
pub mod reader;
pub mod receiver;
pub mod scheduler;
pub mod tempo;
pub mod varlen;

mod error;
pub use error::*;

/// Commonly used types
pub mod prelude {
    pub use crate::{
        channel::{Channel, ChannelState, Channels},
        config::PlayerConfig,
        controller::{Controller, PlaybackState, Playlist},
        error::*,
        file::{Event, EventKind, EventType, Header, MetaKind, MidiFile, Timing, Track},
        message::{ChannelMessage, VoiceKind, WireMessage},
        micros::UMicros,
        note::Note,
        reader::{ReadResult, Reader, ReaderError},
        receiver::{LoggingReceiver, Receiver, RecordingReceiver, Timestamp},
        scheduler::{EventBatch, Scheduler, WaitStrategy},
        tempo::SharedTempo,
    };
}

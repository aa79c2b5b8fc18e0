use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use crate::file::{DEFAULT_TEMPO, bpm};

/// The tempo of the playing session, in microseconds per quarter note.
///
/// Clones share one value. The scheduler writes it when a Set Tempo event
/// fires and reads it before every delay; the controller resets it when a
/// new file starts.
#[derive(Debug, Clone)]
pub struct SharedTempo(Arc<AtomicU32>);

impl SharedTempo {
    /// A cell holding `tempo`
    pub fn new(tempo: u32) -> Self {
        Self(Arc::new(AtomicU32::new(tempo)))
    }

    /// The current tempo
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    /// Replace the tempo
    pub fn set(&self, tempo: u32) {
        self.0.store(tempo, Ordering::Release);
    }

    /// The current tempo in beats per minute
    pub fn bpm(&self) -> u32 {
        bpm(self.get())
    }
}

impl Default for SharedTempo {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO)
    }
}

#[test]
fn clones_share_the_tempo() {
    let tempo = SharedTempo::default();
    let other = tempo.clone();
    assert_eq!(other.bpm(), 120);
    tempo.set(400_000);
    assert_eq!(other.get(), 400_000);
    assert_eq!(other.bpm(), 150);
}

use crate::scheduler::WaitStrategy;

/// Tunables of a playback session.
///
/// ```rust
/// # use coolmidi::{config::PlayerConfig, scheduler::WaitStrategy};
/// let config = PlayerConfig::default()
///     .with_wait_strategy(WaitStrategy::hybrid())
///     .with_looping(true);
/// assert!(config.start_looping);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// How the dispatcher waits between batches
    pub wait_strategy: WaitStrategy,
    /// Capacity of the queue of injected program and volume changes
    pub event_queue_capacity: usize,
    /// Capacity of the channel notification queue. When full, new
    /// notifications are dropped.
    pub notification_capacity: usize,
    /// Whether the first file loops
    pub start_looping: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            wait_strategy: WaitStrategy::Spin,
            event_queue_capacity: 64,
            notification_capacity: 16,
            start_looping: false,
        }
    }
}

impl PlayerConfig {
    /// Use `strategy` between batches
    pub fn with_wait_strategy(mut self, strategy: WaitStrategy) -> Self {
        self.wait_strategy = strategy;
        self
    }

    /// Size of the injected event queue, at least 1
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity.max(1);
        self
    }

    /// Size of the notification queue, at least 1
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity.max(1);
        self
    }

    /// Start with looping on or off
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.start_looping = looping;
        self
    }
}

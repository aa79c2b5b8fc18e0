use std::{
    hint,
    thread,
    time::{Duration, Instant},
};

/// How the dispatcher waits for the next batch.
///
/// Both strategies return at or just after the deadline. Spinning burns a
/// core for sub-millisecond accuracy; the hybrid strategy sleeps until
/// `spin_window` before the deadline and spins the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaitStrategy {
    /// Busy-wait on the monotonic clock
    #[default]
    Spin,
    /// Coarse sleep, then spin
    Hybrid {
        /// How long before the deadline to stop sleeping
        spin_window: Duration,
    },
}

impl WaitStrategy {
    /// Hybrid waiting with a 2 ms spin window
    pub const fn hybrid() -> Self {
        Self::Hybrid {
            spin_window: Duration::from_millis(2),
        }
    }

    /// Block the current thread until `deadline`
    pub fn wait_until(&self, deadline: Instant) {
        if let Self::Hybrid { spin_window } = self {
            let now = Instant::now();
            if let Some(sleep) = deadline
                .checked_duration_since(now)
                .and_then(|left| left.checked_sub(*spin_window))
            {
                thread::sleep(sleep);
            }
        }
        spin_until(deadline);
    }

    /// Like [`WaitStrategy::wait_until`], but gives up as soon as `stop`
    /// returns true. Returns false if the wait was cut short.
    ///
    /// `stop` is polled about once a millisecond, even while the
    /// hybrid strategy sleeps.
    pub fn wait_until_or(&self, deadline: Instant, mut stop: impl FnMut() -> bool) -> bool {
        loop {
            if stop() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            match self {
                Self::Hybrid { spin_window } if deadline - now > *spin_window => {
                    thread::sleep((deadline - now - *spin_window).min(POLL_SLICE));
                }
                _ => hint::spin_loop(),
            }
        }
    }
}

const POLL_SLICE: Duration = Duration::from_millis(1);

/// Busy-wait until `deadline` has passed.
pub fn spin_until(deadline: Instant) {
    while Instant::now() < deadline {
        hint::spin_loop();
    }
}

#[test]
fn waits_reach_the_deadline() {
    for strategy in [WaitStrategy::Spin, WaitStrategy::hybrid()] {
        let start = Instant::now();
        let deadline = start + Duration::from_millis(5);
        strategy.wait_until(deadline);
        assert!(Instant::now() >= deadline);
    }
    // a deadline in the past returns at once
    WaitStrategy::hybrid().wait_until(Instant::now() - Duration::from_millis(1));
}

#[test]
fn interruptible_wait_stops_early() {
    for strategy in [WaitStrategy::Spin, WaitStrategy::hybrid()] {
        let start = Instant::now();
        let deadline = start + Duration::from_millis(200);
        let stop_at = start + Duration::from_millis(10);
        assert!(!strategy.wait_until_or(deadline, || Instant::now() >= stop_at));
        assert!(Instant::now() < deadline);

        let deadline = Instant::now() + Duration::from_millis(5);
        assert!(strategy.wait_until_or(deadline, || false));
        assert!(Instant::now() >= deadline);
    }
}

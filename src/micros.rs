use core::{
    fmt,
    ops::{Add, AddAssign, Sub},
    time::Duration,
};

/// Unsigned Microseconds
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UMicros(u64);

impl UMicros {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates a new instance of microseconds
    #[inline]
    pub const fn new(microseconds: u64) -> Self {
        Self(microseconds)
    }

    /// Returns the microseconds as a u64
    #[inline]
    pub const fn us(&self) -> u64 {
        self.0
    }

    /// ms -> us
    #[inline]
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms * 1_000)
    }

    /// Round fractional microseconds, clamping negatives to zero
    #[inline]
    pub fn from_f64(micros: f64) -> Self {
        Self(micros.max(0.).round() as u64)
    }

    /// Returns whole milliseconds
    #[inline]
    pub const fn as_ms(&self) -> u64 {
        self.0 / 1_000
    }

    /// Returns seconds
    #[inline]
    pub const fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000.
    }

    /// Returns no time if I am less than other.
    pub const fn saturating_sub(&self, other: Self) -> UMicros {
        UMicros(self.0.saturating_sub(other.0))
    }

    /// Converts into a [`Duration`]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl Add for UMicros {
    type Output = UMicros;
    fn add(self, rhs: Self) -> Self::Output {
        UMicros(self.0 + rhs.0)
    }
}

impl AddAssign for UMicros {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for UMicros {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        UMicros(self.0 - rhs.0)
    }
}

impl From<Duration> for UMicros {
    fn from(value: Duration) -> Self {
        Self(value.as_micros() as u64)
    }
}

impl From<UMicros> for Duration {
    fn from(value: UMicros) -> Self {
        value.as_duration()
    }
}

impl fmt::Display for UMicros {
    /// `hh:mm:ss`, or `mm:ss` under an hour
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / 1_000_000;
        let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
        if hours > 0 {
            write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
        } else {
            write!(f, "{minutes:02}:{seconds:02}")
        }
    }
}

#[test]
fn display_as_clock() {
    assert_eq!(UMicros::new(61_500_000).to_string(), "01:01");
    assert_eq!(UMicros::new(3_723_000_000).to_string(), "01:02:03");
    assert_eq!(UMicros::from_f64(-4.), UMicros::ZERO);
    assert_eq!(UMicros::from_ms(3).saturating_sub(UMicros::from_ms(5)), UMicros::ZERO);
}

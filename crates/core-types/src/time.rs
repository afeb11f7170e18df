use core::fmt;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in wall-clock time, with nanosecond resolution.
///
/// Timestamps are compared across validators, so they denote wall-clock time
/// (nanoseconds elapsed since the UNIX epoch) rather than a monotonic instant.
///
/// Arithmetic with [`Duration`] saturates at the bounds of the representable range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(u64);

impl Timestamp {
    /// The UNIX epoch, ie. `1970-01-01T00:00:00Z`.
    pub const UNIX_EPOCH: Self = Self(0);

    /// Create a timestamp from a number of nanoseconds since the UNIX epoch.
    pub const fn from_unix_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from a number of milliseconds since the UNIX epoch.
    pub const fn from_unix_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Create a timestamp from the time elapsed since the UNIX epoch.
    pub fn from_unix_duration(elapsed: Duration) -> Self {
        Self(duration_as_nanos(elapsed))
    }

    /// Number of nanoseconds elapsed since the UNIX epoch.
    pub const fn as_unix_nanos(&self) -> u64 {
        self.0
    }

    /// Time elapsed since the UNIX epoch.
    pub const fn as_unix_duration(&self) -> Duration {
        Duration::from_nanos(self.0)
    }

    /// Time elapsed from `earlier` to `self`, or zero if `earlier` is later than `self`.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Add the given duration, returning `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        u64::try_from(duration.as_nanos())
            .ok()
            .and_then(|nanos| self.0.checked_add(nanos))
            .map(Self)
    }

    /// Add the given duration, saturating at the maximum representable timestamp.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration_as_nanos(duration)))
    }

    /// Subtract the given duration, saturating at the UNIX epoch.
    pub fn saturating_sub(&self, duration: Duration) -> Self {
        Self(self.0.saturating_sub(duration_as_nanos(duration)))
    }
}

fn duration_as_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / 1_000_000_000;
        let nanos = self.0 % 1_000_000_000;
        write!(f, "{secs}.{nanos:09}")
    }
}

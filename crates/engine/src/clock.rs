//! Wall clocks for the consensus engine.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

pub use chronobft_core_types::{Clock, ManualClock, Timestamp};

fn system_now() -> Timestamp {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);

    Timestamp::from_unix_duration(elapsed)
}

/// The operating system's wall clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        system_now()
    }
}

/// A wall clock which advances with tokio's clock.
///
/// Reads the system time once, then only moves forward by as much as
/// [`tokio::time::Instant`] does. In a runtime with paused time,
/// it follows `tokio::time::advance` and auto-advance exactly.
#[derive(Copy, Clone, Debug)]
pub struct TokioClock {
    base_time: Timestamp,
    base_instant: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(system_now())
    }

    /// A clock which reads the given time right now.
    pub fn starting_at(base_time: Timestamp) -> Self {
        Self {
            base_time,
            base_instant: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        self.base_time + self.base_instant.elapsed()
    }
}

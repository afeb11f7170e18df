use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

use crate::Timestamp;

/// A source of wall-clock time.
///
/// Every component that needs to know the current time is handed a `Clock`
/// explicitly, so that tests can substitute a deterministic source.
pub trait Clock
where
    Self: Send + Sync + 'static,
{
    /// The current time according to this clock.
    fn now(&self) -> Timestamp;
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Timestamp {
        self.as_ref().now()
    }
}

impl<C> Clock for Box<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Timestamp {
        self.as_ref().now()
    }
}

/// A clock whose reading only changes when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading the given time.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now.as_unix_nanos()),
        }
    }

    /// Set the clock to the given time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now.as_unix_nanos(), Ordering::SeqCst);
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&self, by: Duration) {
        let now = self.now() + by;
        self.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_nanos(self.now.load(Ordering::SeqCst))
    }
}

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use ractor::message::Message;
use ractor::ActorRef;
use tokio::task::JoinHandle;
use tracing::trace;

/// Message delivered to the owning actor when a timer fires.
///
/// Only the scheduler can tell whether it still matters, see [`TimerScheduler::intercept_timer_msg`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeoutElapsed<Key> {
    key: Key,
    generation: u64,
}

impl<Key> TimeoutElapsed<Key> {
    pub fn key(&self) -> &Key {
        &self.key
    }
}

#[derive(Debug)]
struct Timer {
    generation: u64,
    task: JoinHandle<()>,
}

/// One-shot, cancellable timers which deliver a [`TimeoutElapsed`] to an actor.
///
/// Starting a timer for a key which already has one replaces it.
/// A timer which was cancelled or replaced before its message was handled
/// is recognized by its generation and ignored.
pub struct TimerScheduler<Key, Msg>
where
    Key: Clone + Debug + Ord + Send + 'static,
    Msg: Message + From<TimeoutElapsed<Key>>,
{
    actor: ActorRef<Msg>,
    timers: BTreeMap<Key, Timer>,
    generation: u64,
}

impl<Key, Msg> TimerScheduler<Key, Msg>
where
    Key: Clone + Debug + Ord + Send + 'static,
    Msg: Message + From<TimeoutElapsed<Key>>,
{
    pub fn new(actor: ActorRef<Msg>) -> Self {
        Self {
            actor,
            timers: BTreeMap::new(),
            generation: 0,
        }
    }

    /// Start a timer that will fire after the given duration.
    pub fn start_timer(&mut self, key: Key, duration: Duration) {
        self.cancel(&key);

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        let actor = self.actor.clone();
        let elapsed = TimeoutElapsed {
            key: key.clone(),
            generation,
        };

        trace!(?key, ?duration, generation, "Starting timer");

        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;

            // The actor is gone, nobody is waiting for this timer anymore
            let _ = actor.cast(Msg::from(elapsed));
        });

        self.timers.insert(key, Timer { generation, task });
    }

    /// Whether there is an active timer for the given key.
    pub fn is_timer_active(&self, key: &Key) -> bool {
        self.timers.contains_key(key)
    }

    /// Cancel the timer for the given key, if any.
    pub fn cancel(&mut self, key: &Key) {
        if let Some(timer) = self.timers.remove(key) {
            trace!(?key, generation = timer.generation, "Cancelling timer");
            timer.task.abort();
        }
    }

    /// Cancel all active timers.
    pub fn cancel_all(&mut self) {
        for (_, timer) in std::mem::take(&mut self.timers) {
            timer.task.abort();
        }
    }

    /// Check whether the elapsed timer is still the active one for its key.
    ///
    /// Returns the key and forgets the timer if so, or `None` if the timer
    /// was cancelled or replaced in the meantime.
    pub fn intercept_timer_msg(&mut self, elapsed: TimeoutElapsed<Key>) -> Option<Key> {
        match self.timers.get(&elapsed.key) {
            Some(timer) if timer.generation == elapsed.generation => {
                self.timers.remove(&elapsed.key);
                Some(elapsed.key)
            }
            _ => {
                trace!(key = ?elapsed.key, generation = elapsed.generation, "Ignoring stale timer");
                None
            }
        }
    }
}

impl<Key, Msg> Drop for TimerScheduler<Key, Msg>
where
    Key: Clone + Debug + Ord + Send + 'static,
    Msg: Message + From<TimeoutElapsed<Key>>,
{
    fn drop(&mut self) {
        self.cancel_all();
    }
}

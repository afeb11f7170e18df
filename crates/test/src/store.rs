use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use chronobft_engine::store::{PersistedState, PersistenceError, StateStore};

use crate::journal::{Entry, Journal};
use crate::TestContext;

/// An in-memory store, shared between its clones so that it survives a node restart.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    state: Arc<Mutex<Option<PersistedState<TestContext>>>>,
    fail_writes: Arc<AtomicBool>,
    journal: Journal,
}

impl MemoryStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            state: Arc::default(),
            fail_writes: Arc::default(),
            journal,
        }
    }

    /// Make every subsequent write fail, or succeed again.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn current(&self) -> Option<PersistedState<TestContext>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StateStore<TestContext> for MemoryStore {
    async fn persist(&self, state: &PersistedState<TestContext>) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write("disk is full".to_string()));
        }

        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.clone());
        self.journal.record(Entry::Persisted(state.clone()));

        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedState<TestContext>>, PersistenceError> {
        Ok(self.current())
    }
}

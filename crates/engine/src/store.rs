//! Durable storage of the consensus state of this validator.

use async_trait::async_trait;
use derive_where::derive_where;

use chronobft_core_state_machine::state::{RoundValue, Step};
use chronobft_core_types::{Context, Round};

/// The part of the consensus state which must survive a restart,
/// so that a validator never signs a message conflicting with one it already sent.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct PersistedState<Ctx: Context> {
    pub height: Ctx::Height,
    pub round: Round,
    pub step: Step,
    pub locked: Option<RoundValue<Ctx::Value>>,
    pub valid: Option<RoundValue<Ctx::Value>>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write state: {0}")]
    Write(String),

    #[error("Failed to read state: {0}")]
    Read(String),
}

/// Durable storage for the consensus state.
///
/// `persist` must only return once the state is durably stored:
/// the engine publishes its own messages right after it returns.
#[async_trait]
pub trait StateStore<Ctx: Context>: Send + Sync + 'static {
    /// Persist the given state, replacing the previous one.
    async fn persist(&self, state: &PersistedState<Ctx>) -> Result<(), PersistenceError>;

    /// Load the last persisted state, if any.
    async fn load(&self) -> Result<Option<PersistedState<Ctx>>, PersistenceError>;
}

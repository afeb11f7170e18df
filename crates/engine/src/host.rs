use std::fmt;
use std::time::Duration;

use derive_where::derive_where;
use ractor::{ActorRef, RpcReplyPort};

use chronobft_core_types::{Context, Round, Timestamp, Validity};

/// A reference to the host actor.
pub type HostRef<Ctx> = ActorRef<HostMsg<Ctx>>;

/// Building a value failed, the validator will not propose in this round.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("Application is unavailable: {0}")]
    Unavailable(String),

    #[error("Value was not built within {0:?}")]
    Timeout(Duration),
}

/// Messages that need to be handled by the host actor.
#[derive_where(Debug)]
pub enum HostMsg<Ctx: Context> {
    /// Consensus has started a new round.
    StartedRound {
        height: Ctx::Height,
        round: Round,
        proposer: Ctx::Address,
    },

    /// Build a value to propose at the given height and round, carrying the given time.
    ///
    /// The engine stops waiting for the reply once `timeout` has elapsed.
    GetValue {
        height: Ctx::Height,
        round: Round,
        time: Timestamp,
        timeout: Duration,
        reply_to: RpcReplyPort<Result<Ctx::Value, BuildError>>,
    },

    /// Check whether a proposed value is valid for the application.
    ValidateValue {
        height: Ctx::Height,
        round: Round,
        value: Ctx::Value,
        reply_to: RpcReplyPort<Validity>,
    },

    /// Consensus has decided on a value.
    Decided {
        height: Ctx::Height,
        round: Round,
        value: Ctx::Value,
    },
}

impl<Ctx: Context> fmt::Display for HostMsg<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartedRound { height, round, .. } => {
                write!(f, "StartedRound(height: {height}, round: {round})")
            }
            Self::GetValue { height, round, .. } => {
                write!(f, "GetValue(height: {height}, round: {round})")
            }
            Self::ValidateValue { height, round, .. } => {
                write!(f, "ValidateValue(height: {height}, round: {round})")
            }
            Self::Decided { height, round, .. } => {
                write!(f, "Decided(height: {height}, round: {round})")
            }
        }
    }
}

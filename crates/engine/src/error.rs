use derive_where::derive_where;

use chronobft_core_driver::Error as DriverError;
use chronobft_core_types::{Context, Round, SigningError, Untimely};

use crate::store::PersistenceError;

/// Errors which can occur while processing a consensus message.
#[derive_where(Debug)]
#[derive(thiserror::Error)]
pub enum ConsensusError<Ctx: Context> {
    /// The signature of a proposal or vote does not match its sender.
    #[error("Invalid signature from {0}")]
    InvalidSignature(Ctx::Address),

    /// The sender of a proposal or vote is not in the validator set.
    #[error("Unknown validator {0}")]
    UnknownValidator(Ctx::Address),

    /// The message is for a height we have already decided.
    #[error("Stale message for height {height}, we are at height {current}")]
    StaleMessage {
        height: Ctx::Height,
        current: Ctx::Height,
    },

    /// The proposal was not sent by the proposer of its round.
    #[error("Proposal for round {round} from {address}, which is not the proposer of that round")]
    UnexpectedProposer { address: Ctx::Address, round: Round },

    /// A validator sent a message conflicting with one it already sent.
    #[error("Equivocation by {0}")]
    Equivocation(Ctx::Address),

    /// The proposal violates the timeliness bounds.
    #[error("Untimely proposal: {0}")]
    UntimelyProposal(Untimely),

    /// We could not sign one of our own messages.
    #[error("Failed to sign message: {0}")]
    Signing(#[from] SigningError),

    /// We could not persist our state before publishing one of our own messages.
    #[error("Failed to persist consensus state: {0}")]
    Persistence(#[from] PersistenceError),

    /// The driver rejected an input.
    #[error("Driver failed to process input: {0}")]
    Driver(#[from] DriverError<Ctx>),

    /// Another actor could not be reached.
    #[error("Failed to reach {actor}: {reason}")]
    Messaging { actor: &'static str, reason: String },
}

impl<Ctx: Context> ConsensusError<Ctx> {
    /// Whether this validator must stop participating after this error.
    ///
    /// A validator which could not sign or persist a message must not carry on
    /// as if it had sent it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Signing(_) | Self::Persistence(_))
    }
}

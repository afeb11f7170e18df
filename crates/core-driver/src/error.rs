use derive_where::derive_where;

use chronobft_core_types::{Context, Round};

/// Why the [`Driver`](crate::Driver) refused an input.
///
/// None of these leave the driver in an inconsistent state, the offending input is simply dropped.
#[derive_where(Clone, Debug, PartialEq, Eq)]
#[derive(thiserror::Error)]
pub enum Error<Ctx>
where
    Ctx: Context,
{
    /// The input arrived before any round was started.
    #[error("no proposer known at height {0}, round {1}")]
    NoProposer(Ctx::Height, Round),

    /// The proposer of the round is not part of the validator set.
    #[error("proposer {0} is not a validator")]
    ProposerNotFound(Ctx::Address),

    /// A vote was cast by someone outside the validator set.
    #[error("vote from {0}, which is not a validator")]
    ValidatorNotFound(Ctx::Address),

    /// A proposal for another height.
    #[error("proposal for height {proposal_height} while deciding height {consensus_height}")]
    InvalidProposalHeight {
        /// Height of the proposal
        proposal_height: Ctx::Height,
        /// Height being decided
        consensus_height: Ctx::Height,
    },

    /// A vote for another height.
    #[error("vote for height {vote_height} while deciding height {consensus_height}")]
    InvalidVoteHeight {
        /// Height of the vote
        vote_height: Ctx::Height,
        /// Height being decided
        consensus_height: Ctx::Height,
    },
}

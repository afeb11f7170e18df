//! Inputs to the round state machine.
//!
//! Line numbers refer to Algorithm 1 of "The latest gossip on BFT consensus"
//! (Buchman, Kwon, Milosevic, 2018).

use derive_where::derive_where;

use chronobft_core_types::{Context, Round};

/// Input to the round state machine.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Input<Ctx>
where
    Ctx: Context,
{
    /// Start a new round, either as proposer or not.
    /// L11/L14/L20
    NewRound(Round),

    /// Propose a value built for the current round.
    /// L18
    ProposeValue(Ctx::Value),

    /// Receive a valid and timely proposal without a POL round.
    /// L22 + L24
    Proposal(Ctx::Proposal),

    /// Receive an invalid or untimely proposal without a POL round.
    /// L22 + L26
    InvalidProposal,

    /// Receive a valid proposal along with a polka for it in its POL round.
    /// L28 + L30
    ProposalAndPolkaPrevious(Ctx::Proposal),

    /// Receive an invalid proposal along with a polka for it in its POL round.
    /// L28 + L32
    InvalidProposalAndPolkaPrevious(Ctx::Proposal),

    /// Receive a quorum of prevotes for anything.
    /// L34
    PolkaAny,

    /// Receive a quorum of prevotes for nil.
    /// L44
    PolkaNil,

    /// Receive a valid proposal and a quorum of prevotes for it in the current round.
    /// L36
    ProposalAndPolkaCurrent(Ctx::Proposal),

    /// Receive a quorum of precommits for anything.
    /// L47
    PrecommitAny,

    /// Receive a valid proposal and a quorum of precommits for it.
    /// L49
    ProposalAndPrecommitValue(Ctx::Proposal),

    /// Receive votes from f+1 validators, or a quorum, for a higher round.
    /// L55
    SkipRound(Round),

    /// Timed out waiting for a proposal.
    /// L57
    TimeoutPropose,

    /// Timed out waiting for a prevote quorum on a single value or nil.
    /// L61
    TimeoutPrevote,

    /// Timed out waiting for a precommit quorum on a single value.
    /// L65
    TimeoutPrecommit,
}

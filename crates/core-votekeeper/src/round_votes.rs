//! The prevotes and precommits of a single round.

use derive_where::derive_where;

use chronobft_core_types::{Context, SignedVote, Vote, VoteType};

use crate::ballot_box::{BallotBox, Insertion};
use crate::Weight;

/// The two ballot boxes of a round.
#[derive_where(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundVotes<Ctx>
where
    Ctx: Context,
{
    prevotes: BallotBox<Ctx>,
    precommits: BallotBox<Ctx>,
}

impl<Ctx> RoundVotes<Ctx>
where
    Ctx: Context,
{
    /// Create empty ballot boxes.
    pub fn new() -> Self {
        Self::default()
    }

    /// The ballot box for the given vote type.
    pub fn ballot_box(&self, vote_type: VoteType) -> &BallotBox<Ctx> {
        match vote_type {
            VoteType::Prevote => &self.prevotes,
            VoteType::Precommit => &self.precommits,
        }
    }

    /// The prevotes of this round.
    pub fn prevotes(&self) -> &BallotBox<Ctx> {
        &self.prevotes
    }

    /// The precommits of this round.
    pub fn precommits(&self) -> &BallotBox<Ctx> {
        &self.precommits
    }

    /// Cast the vote into the ballot box matching its type.
    pub fn insert(&mut self, vote: SignedVote<Ctx>, weight: Weight) -> Insertion<Ctx> {
        match vote.vote_type() {
            VoteType::Prevote => self.prevotes.insert(vote, weight),
            VoteType::Precommit => self.precommits.insert(vote, weight),
        }
    }
}

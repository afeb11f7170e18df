//! A ballot box holds at most one vote per validator, for one vote type in one round.

use alloc::collections::BTreeMap;

use derive_where::derive_where;

use chronobft_core_types::{Context, NilOrVal, SignedVote, ValueId, Vote};

use crate::value_weights::ValuesWeights;
use crate::{Threshold, ThresholdParam, Weight};

/// The outcome of casting a vote into a [`BallotBox`].
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Insertion<Ctx>
where
    Ctx: Context,
{
    /// First vote from this validator, now counted.
    New,

    /// The validator already cast a vote for the same value, nothing changed.
    Duplicate,

    /// The validator already cast a vote for another value.
    /// The new vote is rejected and the existing one is returned.
    Conflicting(SignedVote<Ctx>),
}

/// Votes of a single type cast in a single round, along with their tally.
#[derive_where(Clone, Debug, Default, PartialEq, Eq)]
pub struct BallotBox<Ctx>
where
    Ctx: Context,
{
    votes: BTreeMap<Ctx::Address, SignedVote<Ctx>>,
    tally: ValuesWeights<NilOrVal<ValueId<Ctx>>>,
}

impl<Ctx> BallotBox<Ctx>
where
    Ctx: Context,
{
    /// Create an empty ballot box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cast a vote with the given weight.
    ///
    /// The existing vote of the validator is looked up first, and the vote is only
    /// stored and tallied if there is none. A vote never overwrites another one.
    pub fn insert(&mut self, vote: SignedVote<Ctx>, weight: Weight) -> Insertion<Ctx> {
        if let Some(existing) = self.votes.get(vote.validator_address()) {
            return if existing.value() == vote.value() {
                Insertion::Duplicate
            } else {
                Insertion::Conflicting(existing.clone())
            };
        }

        self.tally.add(vote.value().clone(), weight);
        self.votes.insert(vote.validator_address().clone(), vote);

        Insertion::New
    }

    /// The vote cast by the given validator, if any.
    pub fn get(&self, address: &Ctx::Address) -> Option<&SignedVote<Ctx>> {
        self.votes.get(address)
    }

    /// All votes in this box, ordered by validator address.
    pub fn votes(&self) -> impl Iterator<Item = &SignedVote<Ctx>> {
        self.votes.values()
    }

    /// The number of votes in this box.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// Whether this box holds no vote.
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// The combined weight of the votes for the given value or nil.
    pub fn weight_of(&self, value: &NilOrVal<ValueId<Ctx>>) -> Weight {
        self.tally.get(value)
    }

    /// The combined weight of all votes in this box.
    pub fn weight_sum(&self) -> Weight {
        self.tally.sum()
    }

    /// The values voted for in this box and their combined weight.
    pub fn tally(&self) -> &ValuesWeights<NilOrVal<ValueId<Ctx>>> {
        &self.tally
    }

    /// Whether the votes in this box meet the given threshold.
    pub fn is_threshold_met(
        &self,
        threshold: Threshold<ValueId<Ctx>>,
        param: ThresholdParam,
        total_weight: Weight,
    ) -> bool {
        match threshold {
            Threshold::Value(value) => {
                param.is_met(self.weight_of(&NilOrVal::Val(value)), total_weight)
            }
            Threshold::Nil => param.is_met(self.weight_of(&NilOrVal::Nil), total_weight),
            Threshold::Any => param.is_met(self.weight_sum(), total_weight),
            Threshold::Unreached => false,
        }
    }
}

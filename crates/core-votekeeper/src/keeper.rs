//! For tallying votes and emitting outputs when certain thresholds are reached.

use alloc::collections::{BTreeMap, BTreeSet};

use derive_where::derive_where;

use chronobft_core_types::{
    Context, NilOrVal, Round, SignedVote, Validator, ValidatorSet, ValueId, Vote, VoteType,
};

use crate::ballot_box::{BallotBox, Insertion};
use crate::evidence::EvidenceMap;
use crate::round_votes::RoundVotes;
use crate::{Threshold, ThresholdParams, Weight};

/// A threshold reached by the votes of a round, for the driver to act upon.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Output<Value> {
    /// Quorum of prevotes, spread over different values or nil
    PolkaAny,

    /// Quorum of nil prevotes
    PolkaNil,

    /// Quorum of prevotes for this value
    PolkaValue(Value),

    /// Quorum of precommits which do not agree on a value
    PrecommitAny,

    /// Quorum of precommits for this value
    PrecommitValue(Value),

    /// Validators with more than a third of the power vote in this higher round
    SkipRound(Round),
}

/// The result of adding a vote to the keeper.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AddVote {
    /// The vote was accepted and counted.
    pub added: bool,

    /// The validator already cast a different vote of the same type in the same round.
    /// The new vote was rejected and recorded as evidence.
    pub conflicting: bool,
}

impl AddVote {
    const ADDED: Self = Self {
        added: true,
        conflicting: false,
    };

    const IGNORED: Self = Self {
        added: false,
        conflicting: false,
    };

    const CONFLICTING: Self = Self {
        added: false,
        conflicting: true,
    };
}

/// The votes of a single round, and what was already reported about them.
#[derive_where(Clone, Debug, Default)]
pub struct PerRound<Ctx>
where
    Ctx: Context,
{
    /// The prevotes and precommits of this round.
    votes: RoundVotes<Ctx>,

    /// Validators who voted in this round, with their weight, counted once.
    voters: BTreeMap<Ctx::Address, Weight>,

    /// The outputs already emitted for this round.
    emitted_outputs: BTreeSet<Output<ValueId<Ctx>>>,
}

impl<Ctx> PerRound<Ctx>
where
    Ctx: Context,
{
    /// The prevotes and precommits of this round.
    pub fn votes(&self) -> &RoundVotes<Ctx> {
        &self.votes
    }

    /// The vote of the given type cast by the given validator, if any.
    pub fn get_vote(&self, vote_type: VoteType, address: &Ctx::Address) -> Option<&SignedVote<Ctx>> {
        self.votes.ballot_box(vote_type).get(address)
    }

    /// The combined weight of the validators who voted in this round, whatever the vote.
    pub fn voters_weight(&self) -> Weight {
        self.voters
            .values()
            .fold(0, |sum, weight| sum.saturating_add(*weight))
    }

    /// The outputs already emitted for this round.
    pub fn emitted_outputs(&self) -> &BTreeSet<Output<ValueId<Ctx>>> {
        &self.emitted_outputs
    }

    fn insert(&mut self, vote: SignedVote<Ctx>, weight: Weight) -> Insertion<Ctx> {
        let address = vote.validator_address().clone();
        let insertion = self.votes.insert(vote, weight);

        if matches!(insertion, Insertion::New) {
            self.voters.entry(address).or_insert(weight);
        }

        insertion
    }

    fn emit_once(&mut self, output: Output<ValueId<Ctx>>) -> Option<Output<ValueId<Ctx>>> {
        self.emitted_outputs
            .insert(output.clone())
            .then_some(output)
    }
}

/// Keeps track of the votes of a height and emits outputs when thresholds are reached.
#[derive_where(Clone, Debug)]
pub struct VoteKeeper<Ctx>
where
    Ctx: Context,
{
    validator_set: Ctx::ValidatorSet,

    threshold_params: ThresholdParams,

    per_round: BTreeMap<Round, PerRound<Ctx>>,

    /// Conflicting votes, by validator
    evidence: EvidenceMap<Ctx>,
}

impl<Ctx> VoteKeeper<Ctx>
where
    Ctx: Context,
{
    /// Create a new `VoteKeeper` for the given validator set and threshold parameters.
    pub fn new(validator_set: Ctx::ValidatorSet, threshold_params: ThresholdParams) -> Self {
        Self {
            validator_set,
            threshold_params,
            per_round: BTreeMap::new(),
            evidence: EvidenceMap::new(),
        }
    }

    /// Validators whose votes are counted.
    pub fn validator_set(&self) -> &Ctx::ValidatorSet {
        &self.validator_set
    }

    /// The total weight (ie. voting power) of the validator set.
    pub fn total_weight(&self) -> Weight {
        self.validator_set.total_voting_power()
    }

    /// Votes of `round`, `None` if nobody voted in it yet.
    pub fn per_round(&self, round: Round) -> Option<&PerRound<Ctx>> {
        self.per_round.get(&round)
    }

    /// The highest round we have seen votes for so far.
    pub fn max_round(&self) -> Round {
        self.per_round.keys().max().copied().unwrap_or(Round::Nil)
    }

    /// The evidence of equivocation gathered so far.
    pub fn evidence(&self) -> &EvidenceMap<Ctx> {
        &self.evidence
    }

    /// Whether we already counted this exact vote.
    pub fn has_vote(&self, vote: &SignedVote<Ctx>) -> bool {
        self.per_round(vote.round())
            .and_then(|per_round| per_round.get_vote(vote.vote_type(), vote.validator_address()))
            .is_some_and(|existing| existing == vote)
    }

    /// Add a vote to the ballot box of its round and type.
    ///
    /// Votes from validators outside of the validator set are ignored.
    /// A vote conflicting with one the validator already cast is rejected
    /// and recorded as evidence of equivocation.
    pub fn add_vote(&mut self, vote: SignedVote<Ctx>) -> AddVote {
        let Some(validator) = self.validator_set.get_by_address(vote.validator_address()) else {
            return AddVote::IGNORED;
        };

        let weight = validator.voting_power();
        let per_round = self.per_round.entry(vote.round()).or_default();

        match per_round.insert(vote.clone(), weight) {
            Insertion::New => AddVote::ADDED,
            Insertion::Duplicate => AddVote::IGNORED,
            Insertion::Conflicting(existing) => {
                self.evidence.add(existing, vote);
                AddVote::CONFLICTING
            }
        }
    }

    /// Add a vote and return the threshold it makes us reach, if any,
    /// given that we are at the given round.
    ///
    /// Each output is only ever emitted once per round.
    pub fn apply_vote(&mut self, vote: SignedVote<Ctx>, round: Round) -> Option<Output<ValueId<Ctx>>> {
        let vote_round = vote.round();
        let vote_type = vote.vote_type();
        let value = vote.value().clone();

        if !self.add_vote(vote).added {
            return None;
        }

        let total_weight = self.total_weight();
        let params = self.threshold_params;
        let per_round = self.per_round.get_mut(&vote_round)?;

        if vote_round > round && params.honest.is_met(per_round.voters_weight(), total_weight) {
            return per_round.emit_once(Output::SkipRound(vote_round));
        }

        let ballot_box = per_round.votes.ballot_box(vote_type);
        let threshold = compute_threshold(ballot_box, &value, params, total_weight);

        threshold_to_output(vote_type, threshold).and_then(|output| per_round.emit_once(output))
    }

    /// Whether a threshold is met for the given round and vote type.
    pub fn is_threshold_met(
        &self,
        round: &Round,
        vote_type: VoteType,
        threshold: Threshold<ValueId<Ctx>>,
    ) -> bool {
        self.per_round.get(round).is_some_and(|per_round| {
            per_round.votes.ballot_box(vote_type).is_threshold_met(
                threshold,
                self.threshold_params.quorum,
                self.total_weight(),
            )
        })
    }

    /// Whether there is a quorum of votes of the given type for the given value or nil
    /// in the given round.
    pub fn has_quorum(
        &self,
        round: Round,
        vote_type: VoteType,
        value: &NilOrVal<ValueId<Ctx>>,
    ) -> bool {
        let threshold = match value {
            NilOrVal::Nil => Threshold::Nil,
            NilOrVal::Val(id) => Threshold::Value(id.clone()),
        };

        self.is_threshold_met(&round, vote_type, threshold)
    }

    /// The value that got a quorum of prevotes in the given round, if any.
    pub fn polka_value(&self, round: Round) -> Option<&ValueId<Ctx>> {
        let per_round = self.per_round.get(&round)?;
        let prevotes = per_round.votes.prevotes();
        let total_weight = self.total_weight();

        prevotes.tally().iter().find_map(|(value, weight)| match value {
            NilOrVal::Val(id) if self.threshold_params.quorum.is_met(weight, total_weight) => {
                Some(id)
            }
            _ => None,
        })
    }

    /// The highest round with a quorum of prevotes for a value, `Round::Nil` if there is none.
    pub fn pol_round(&self) -> Round {
        self.per_round
            .keys()
            .rev()
            .copied()
            .find(|round| self.polka_value(*round).is_some())
            .unwrap_or(Round::Nil)
    }

    /// Drop the votes of all rounds below `min_round`.
    pub fn prune_votes(&mut self, min_round: Round) {
        self.per_round.retain(|round, _| *round >= min_round);
    }
}

/// Compute the threshold reached by the votes in the ballot box, given that a vote
/// for `value` was just added to it.
fn compute_threshold<Ctx>(
    ballot_box: &BallotBox<Ctx>,
    value: &NilOrVal<ValueId<Ctx>>,
    thresholds: ThresholdParams,
    total_weight: Weight,
) -> Threshold<ValueId<Ctx>>
where
    Ctx: Context,
{
    let weight = ballot_box.weight_of(value);

    match value {
        NilOrVal::Val(value) if thresholds.quorum.is_met(weight, total_weight) => {
            Threshold::Value(value.clone())
        }

        NilOrVal::Nil if thresholds.quorum.is_met(weight, total_weight) => Threshold::Nil,

        _ if thresholds.quorum.is_met(ballot_box.weight_sum(), total_weight) => Threshold::Any,

        _ => Threshold::Unreached,
    }
}

/// Precommits for nil are reported the same as precommits for anything,
/// both lead to the precommit timeout.
fn threshold_to_output<Value>(typ: VoteType, threshold: Threshold<Value>) -> Option<Output<Value>> {
    match (typ, threshold) {
        (_, Threshold::Unreached) => None,

        (VoteType::Prevote, Threshold::Any) => Some(Output::PolkaAny),
        (VoteType::Prevote, Threshold::Nil) => Some(Output::PolkaNil),
        (VoteType::Prevote, Threshold::Value(v)) => Some(Output::PolkaValue(v)),

        (VoteType::Precommit, Threshold::Any) => Some(Output::PrecommitAny),
        (VoteType::Precommit, Threshold::Nil) => Some(Output::PrecommitAny),
        (VoteType::Precommit, Threshold::Value(v)) => Some(Output::PrecommitValue(v)),
    }
}

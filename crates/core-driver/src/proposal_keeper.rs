//! For storing proposals.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use derive_where::derive_where;
use thiserror::Error;

use chronobft_core_types::{
    Context, DoubleProposal, Proposal, Round, SignedProposal, Timeliness, Validity, Value,
    ValueId,
};

/// A proposal as received by this node, along with the verdicts on its value and its timing.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedProposal<Ctx>
where
    Ctx: Context,
{
    /// The signed proposal
    pub proposal: SignedProposal<Ctx>,

    /// Whether the proposed value is valid
    pub validity: Validity,

    /// Whether the proposal was timely when we first received it
    pub timeliness: Timeliness,
}

impl<Ctx> ReceivedProposal<Ctx>
where
    Ctx: Context,
{
    /// Create a new `ReceivedProposal`.
    pub fn new(proposal: SignedProposal<Ctx>, validity: Validity, timeliness: Timeliness) -> Self {
        Self {
            proposal,
            validity,
            timeliness,
        }
    }
}

/// Errors can that be yielded when recording a proposal.
#[derive_where(Debug)]
#[derive(Error)]
pub enum RecordProposalError<Ctx>
where
    Ctx: Context,
{
    /// Attempted to record a conflicting proposal.
    #[error("Conflicting proposal: existing: {existing:?}, conflicting: {conflicting:?}")]
    ConflictingProposal {
        /// The proposal already recorded for the same round.
        existing: SignedProposal<Ctx>,
        /// The conflicting proposal, from the same validator.
        conflicting: SignedProposal<Ctx>,
    },

    /// Attempted to record a proposal from another validator than the one
    /// whose proposal was already recorded for the round.
    #[error("Proposal from {received} while a proposal from {expected} is already recorded")]
    UnexpectedProposer {
        /// The validator whose proposal is already recorded
        expected: Ctx::Address,
        /// The validator who sent the new proposal
        received: Ctx::Address,
    },
}

/// The proposals received in a given round, if any.
#[derive_where(Clone, Debug, PartialEq, Eq, Default)]
pub struct PerRound<Ctx>
where
    Ctx: Context,
{
    /// The proposals received in a given round (proposal.round) if any.
    proposals: Vec<ReceivedProposal<Ctx>>,
}

impl<Ctx> PerRound<Ctx>
where
    Ctx: Context,
{
    /// Return the first proposal that matches the given value_id, if any.
    fn get_first_for_value(&self, value_id: &ValueId<Ctx>) -> Option<&ReceivedProposal<Ctx>> {
        self.proposals
            .iter()
            .find(|received| &received.proposal.value().id() == value_id)
    }

    /// Returns all proposals received in this round.
    pub fn proposals(&self) -> &[ReceivedProposal<Ctx>] {
        &self.proposals
    }

    /// Add a proposal to this round, checking for conflicts.
    ///
    /// - Stores each unique proposal once, keeping the timeliness of its first receipt.
    /// - A proposal first deemed invalid may later be deemed valid, never the other way around.
    /// - Returns an error if equivocation is detected from the validator,
    ///   in which case the conflicting proposal is stored nonetheless.
    /// - Rejects proposals from any other validator.
    pub fn add(&mut self, received: ReceivedProposal<Ctx>) -> Result<(), RecordProposalError<Ctx>> {
        if let Some(first) = self.proposals.first() {
            let expected = first.proposal.validator_address();
            let sender = received.proposal.validator_address();

            if expected != sender {
                return Err(RecordProposalError::UnexpectedProposer {
                    expected: expected.clone(),
                    received: sender.clone(),
                });
            }
        }

        match self
            .proposals
            .iter_mut()
            .find(|existing| existing.proposal == received.proposal)
        {
            Some(existing) => {
                if existing.validity == Validity::Invalid && received.validity.is_valid() {
                    existing.validity = Validity::Valid;
                }

                Ok(())
            }
            None => {
                let conflicting = received.proposal.clone();
                self.proposals.push(received);

                match self.proposals.first() {
                    Some(first) if self.proposals.len() > 1 => {
                        Err(RecordProposalError::ConflictingProposal {
                            existing: first.proposal.clone(),
                            conflicting,
                        })
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Keeps track of proposals.
#[derive_where(Clone, Debug, Default)]
pub struct ProposalKeeper<Ctx>
where
    Ctx: Context,
{
    /// The proposal for each round.
    per_round: BTreeMap<Round, PerRound<Ctx>>,

    /// Evidence of equivocation.
    evidence: EvidenceMap<Ctx>,
}

impl<Ctx> ProposalKeeper<Ctx>
where
    Ctx: Context,
{
    /// Create a new `ProposalKeeper` instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the proposal for the round matching the value_id, if any.
    pub fn get_for_round_and_value(
        &self,
        round: Round,
        value_id: &ValueId<Ctx>,
    ) -> Option<&ReceivedProposal<Ctx>> {
        self.per_round
            .get(&round)
            .and_then(|per_round| per_round.get_first_for_value(value_id))
    }

    /// Returns all proposals for the round, if any.
    pub fn get_for_round(&self, round: Round) -> &[ReceivedProposal<Ctx>] {
        self.per_round
            .get(&round)
            .map(PerRound::proposals)
            .unwrap_or(&[])
    }

    /// Return the evidence of equivocation.
    pub fn evidence(&self) -> &EvidenceMap<Ctx> {
        &self.evidence
    }

    /// Store a proposal, checking for conflicts and storing evidence of equivocation if necessary.
    ///
    /// Returns `false` if the proposal was rejected and must not be acted upon.
    pub fn store_proposal(&mut self, received: ReceivedProposal<Ctx>) -> bool {
        let per_round = self.per_round.entry(received.proposal.round()).or_default();

        match per_round.add(received) {
            Ok(()) => true,

            Err(RecordProposalError::ConflictingProposal {
                existing,
                conflicting,
            }) => {
                self.evidence.add(existing, conflicting);
                true
            }

            Err(RecordProposalError::UnexpectedProposer { .. }) => false,
        }
    }
}

/// Keeps track of evidence of equivocation.
#[derive_where(Clone, Debug, Default)]
pub struct EvidenceMap<Ctx>
where
    Ctx: Context,
{
    map: BTreeMap<Ctx::Address, Vec<DoubleProposal<Ctx>>>,
}

impl<Ctx> EvidenceMap<Ctx>
where
    Ctx: Context,
{
    /// Create a new `EvidenceMap` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return whether or not there is any evidence of equivocation.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Return the evidence of equivocation for a given address, if any.
    pub fn get(&self, address: &Ctx::Address) -> Option<&[DoubleProposal<Ctx>]> {
        self.map.get(address).map(Vec::as_slice)
    }

    /// Add evidence of equivocating proposals, ie. two proposals submitted by the same validator,
    /// but with different values but for the same height and round.
    pub(crate) fn add(&mut self, existing: SignedProposal<Ctx>, conflicting: SignedProposal<Ctx>) {
        if let Some(evidence) = self.map.get_mut(conflicting.validator_address()) {
            evidence.push((existing, conflicting));
        } else {
            self.map.insert(
                conflicting.validator_address().clone(),
                vec![(existing, conflicting)],
            );
        }
    }
}

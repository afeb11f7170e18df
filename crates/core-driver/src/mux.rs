//! The multiplexer turns what the driver receives into the inputs of the round state machine.
//!
//! Its inputs are:
//! - Proposals from the driver, along with their validity and timeliness.
//! - The outputs of the vote keeper.
//! - The step changes of the round state machine.
//!
//! | Step      | Vote Keeper Threshold | Proposal                  | Input to Round SM               | Algo Clause | Output                |
//! |---------- | --------------------- | ------------------------- | ------------------------------- | ----------- | --------------------- |
//! | any       | PrecommitValue(v)     | Proposal(v)               | ProposalAndPrecommitValue       | L49         | decide(v)             |
//! | any       | PrecommitAny          | \*                        | PrecommitAny                    | L47         | sch\_precommit\_timer |
//! | propose   | none                  | InvalidProposal           | InvalidProposal                 | L22, L26    | prevote\_nil          |
//! | propose   | none                  | Proposal, untimely        | InvalidProposal                 | L22, L26    | prevote\_nil          |
//! | propose   | none                  | Proposal, timely          | Proposal                        | L22, L24    | prevote(v)            |
//! | propose   | PolkaPrevious(v, vr)  | InvalidProposal           | InvalidProposalAndPolkaPrevious | L28, L33    | prevote\_nil          |
//! | propose   | PolkaPrevious(v, vr)  | Proposal(v, vr)           | ProposalAndPolkaPrevious        | L28, L30    | prevote(v)            |
//! | prevote   | PolkaNil              | \*                        | PolkaNil                        | L44         | precommit\_nil        |
//! | prevote   | PolkaValue(v)         | Proposal(v)               | ProposalAndPolkaCurrent         | L36, L37    | precommit(v)          |
//! | prevote   | PolkaAny              | \*                        | PolkaAny                        | L34         | prevote timer         |
//! | precommit | PolkaValue(v)         | Proposal(v)               | ProposalAndPolkaCurrent         | L36, L42    | (set valid)           |
//!
//! Timeliness only matters for a proposal without a proof-of-lock round, at the propose step.
//! A valid value that arrived late is still locked on and decided once enough validators vouch for it.

use alloc::vec::Vec;

use chronobft_core_state_machine::input::Input as RoundInput;
use chronobft_core_state_machine::state::Step;
use chronobft_core_types::{Context, Proposal, Round, Value, ValueId, VoteType};
use chronobft_core_votekeeper::keeper::Output as VKOutput;
use chronobft_core_votekeeper::keeper::VoteKeeper;
use chronobft_core_votekeeper::Threshold;

use crate::proposal_keeper::ReceivedProposal;
use crate::Driver;

impl<Ctx> Driver<Ctx>
where
    Ctx: Context,
{
    /// Process a received proposal relative to the current state of the round, considering
    /// its validity and timeliness to determine the appropriate round input.
    ///
    /// 1. If there is no ongoing round, return `None`.
    ///
    /// 2. If the proposal is invalid:
    ///    a. at propose step, without a POL round, return `InvalidProposal`;
    ///    b. at propose step, with a polka at the POL round, return `InvalidProposalAndPolkaPrevious`;
    ///    c. otherwise return `None`.
    ///
    /// 3. If there is a quorum of precommits for the proposal's value, return `ProposalAndPrecommitValue`.
    ///
    /// 4. If the proposal is for a different round than the current one, return `None`.
    ///
    /// 5. If there is a polka for the value in the current round and we are past the propose step,
    ///    return `ProposalAndPolkaCurrent`.
    ///
    /// 6. If we are at propose step and there is a polka at the proposal's POL round,
    ///    return `ProposalAndPolkaPrevious`.
    ///
    /// 7. If the proposal has no POL round, return `Proposal` if it was timely,
    ///    `InvalidProposal` otherwise.
    pub(crate) fn multiplex_proposal(
        &self,
        received: &ReceivedProposal<Ctx>,
    ) -> Option<RoundInput<Ctx>> {
        let proposal = &received.proposal.message;

        // Should only receive proposals for our height.
        if self.height() != proposal.height() {
            return None;
        }

        // Check that there is an ongoing round
        if self.round_state.round == Round::Nil {
            return None;
        }

        let value_id = proposal.value().id();
        let pol_round = proposal.pol_round();

        let polka_previous = pol_round.is_defined()
            && pol_round < self.round_state.round
            && has_polka_value(&self.vote_keeper, pol_round, &value_id);

        // Handle invalid proposal
        if !received.validity.is_valid() {
            return match self.round_state.step {
                // L26
                Step::Propose if pol_round.is_nil() => Some(RoundInput::InvalidProposal),
                // L32
                Step::Propose if polka_previous => Some(
                    RoundInput::InvalidProposalAndPolkaPrevious(proposal.clone()),
                ),
                _ => None,
            };
        }

        // L49
        if self.round_state.decision.is_none()
            && has_precommit_value(&self.vote_keeper, proposal.round(), &value_id)
        {
            return Some(RoundInput::ProposalAndPrecommitValue(proposal.clone()));
        }

        // This check must be after the L49 check above because a commit quorum
        // from any round should result in a decision.
        if self.round_state.round != proposal.round() {
            return None;
        }

        // L36
        if self.round_state.step >= Step::Prevote
            && has_polka_value(&self.vote_keeper, proposal.round(), &value_id)
        {
            return Some(RoundInput::ProposalAndPolkaCurrent(proposal.clone()));
        }

        // L28
        if self.round_state.step == Step::Propose && polka_previous {
            return Some(RoundInput::ProposalAndPolkaPrevious(proposal.clone()));
        }

        // L22
        if pol_round.is_nil() {
            return if received.timeliness.is_timely() {
                Some(RoundInput::Proposal(proposal.clone()))
            } else {
                Some(RoundInput::InvalidProposal)
            };
        }

        // We have `vr >= 0` without a matching polka from round `vr`,
        // so we wait either for more votes to form that polka,
        // or for the propose timeout to expire.
        None
    }

    pub(crate) fn store_and_multiplex_proposal(
        &mut self,
        received: ReceivedProposal<Ctx>,
    ) -> Option<RoundInput<Ctx>> {
        if !self.proposal_keeper.store_proposal(received.clone()) {
            return None;
        }

        self.multiplex_proposal(&received)
    }

    /// After a vote threshold change for a given round, check if we have a polka for nil, some value or any,
    /// based on the type of threshold and the current proposal.
    pub(crate) fn multiplex_vote_threshold(
        &self,
        new_threshold: VKOutput<ValueId<Ctx>>,
        threshold_round: Round,
    ) -> (Round, RoundInput<Ctx>) {
        match new_threshold {
            VKOutput::PolkaAny => (threshold_round, RoundInput::PolkaAny),
            VKOutput::PolkaNil => (threshold_round, RoundInput::PolkaNil),
            VKOutput::PrecommitAny => (threshold_round, RoundInput::PrecommitAny),
            VKOutput::SkipRound(r) => (threshold_round, RoundInput::SkipRound(r)),

            VKOutput::PrecommitValue(v) => {
                match self.proposal_for_round_and_value(threshold_round, &v) {
                    Some(received) if received.validity.is_valid() => (
                        threshold_round,
                        RoundInput::ProposalAndPrecommitValue(received.proposal.message.clone()),
                    ),
                    _ => (threshold_round, RoundInput::PrecommitAny),
                }
            }

            VKOutput::PolkaValue(v) => {
                let Some(received) = self.proposal_for_round_and_value(self.round(), &v) else {
                    // L34
                    return (threshold_round, RoundInput::PolkaAny);
                };

                // We have a proposal for the same value as the threshold.
                // validity  proposal(v, roundp, pol_round)   threshold(v, threshold_round)  Input                            Line
                // =========================================================================================================
                // invalid   (v, roundp, pol_round)           (v, pol_round)                 InvalidProposalAndPolkaPrevious  L32
                // valid     (v, roundp, pol_round)           (v, pol_round)                 ProposalAndPolkaPrevious         L30
                // valid     (v, roundp, *)                   (v, roundp)                    ProposalAndPolkaCurrent          L36
                // *         *                                (v, threshold_round)           PolkaAny                         L34
                let proposal = &received.proposal.message;
                let valid = received.validity.is_valid();
                let proposal_round = proposal.round();
                let pol_round = proposal.pol_round();

                if pol_round.is_defined() && pol_round == threshold_round {
                    let input = if valid {
                        RoundInput::ProposalAndPolkaPrevious(proposal.clone())
                    } else {
                        RoundInput::InvalidProposalAndPolkaPrevious(proposal.clone())
                    };

                    (proposal_round, input)
                } else if valid && proposal_round == threshold_round {
                    (
                        threshold_round,
                        RoundInput::ProposalAndPolkaCurrent(proposal.clone()),
                    )
                } else {
                    (threshold_round, RoundInput::PolkaAny)
                }
            }
        }
    }

    /// After a step change, check for inputs to be sent to the round state machine.
    pub(crate) fn multiplex_step_change(&self, round: Round) -> Vec<(Round, RoundInput<Ctx>)> {
        let mut result = Vec::new();

        for received in self.proposals_for_round(round) {
            let value_id = received.proposal.value().id();

            match self.round_state.step {
                Step::Propose => {
                    if let Some(input) = self.multiplex_proposal(received) {
                        result.push((self.round(), input))
                    }
                }

                Step::Prevote if has_polka_value(&self.vote_keeper, round, &value_id) => result
                    .push(self.multiplex_vote_threshold(VKOutput::PolkaValue(value_id), round)),

                _ => {}
            }
        }

        if let Some(threshold) = find_non_value_threshold(&self.vote_keeper, round) {
            result.push(self.multiplex_vote_threshold(threshold, round))
        }

        result
    }
}

fn find_non_value_threshold<Ctx>(
    votekeeper: &VoteKeeper<Ctx>,
    round: Round,
) -> Option<VKOutput<ValueId<Ctx>>>
where
    Ctx: Context,
{
    if votekeeper.is_threshold_met(&round, VoteType::Precommit, Threshold::Any) {
        Some(VKOutput::PrecommitAny)
    } else if votekeeper.is_threshold_met(&round, VoteType::Prevote, Threshold::Nil) {
        Some(VKOutput::PolkaNil)
    } else if votekeeper.is_threshold_met(&round, VoteType::Prevote, Threshold::Any) {
        Some(VKOutput::PolkaAny)
    } else {
        None
    }
}

/// Check if we have a polka for a value
fn has_polka_value<Ctx>(votekeeper: &VoteKeeper<Ctx>, round: Round, value_id: &ValueId<Ctx>) -> bool
where
    Ctx: Context,
{
    votekeeper.is_threshold_met(&round, VoteType::Prevote, Threshold::Value(value_id.clone()))
}

/// Check if we have a quorum of precommits for a value
fn has_precommit_value<Ctx>(
    votekeeper: &VoteKeeper<Ctx>,
    round: Round,
    value_id: &ValueId<Ctx>,
) -> bool
where
    Ctx: Context,
{
    votekeeper.is_threshold_met(&round, VoteType::Precommit, Threshold::Value(value_id.clone()))
}

use alloc::vec::Vec;
use core::fmt;
use core::mem;

use chronobft_core_state_machine::input::Input as RoundInput;
use chronobft_core_state_machine::output::Output as RoundOutput;
use chronobft_core_state_machine::state::{RoundValue, State as RoundState, Step};
use chronobft_core_state_machine::state_machine::Info;
use chronobft_core_types::{
    Context, NilOrVal, Proposal, Round, SignedProposal, SignedVote, Timeliness, Timeout,
    TimeoutKind, Validator, ValidatorSet, Validity, Value, ValueId, Vote, VoteType,
};
use chronobft_core_votekeeper::keeper::VoteKeeper;
use derive_where::derive_where;

use crate::input::Input;
use crate::output::Output;
use crate::proposal_keeper::{EvidenceMap, ProposalKeeper, ReceivedProposal};
use crate::Error;
use crate::ThresholdParams;

type RoundResult<Ctx> = Result<Option<RoundOutput<Ctx>>, Error<Ctx>>;

/// Drives the round state machine of a single height.
///
/// The driver owns the proposals and votes received for the height, turns them
/// into inputs for the round state machine, and lifts the outputs of the latter
/// into [`Output`]s for the consensus engine to act upon.
pub struct Driver<Ctx>
where
    Ctx: Context,
{
    address: Ctx::Address,
    threshold_params: ThresholdParams,
    validator_set: Ctx::ValidatorSet,

    /// Proposer of the current round, unknown until the first round starts.
    proposer: Option<Ctx::Address>,

    pub(crate) proposal_keeper: ProposalKeeper<Ctx>,
    pub(crate) vote_keeper: VoteKeeper<Ctx>,
    pub(crate) round_state: RoundState<Ctx>,

    /// Inputs derived from a step change, along with the round they apply to.
    pending_inputs: Vec<(Round, RoundInput<Ctx>)>,

    cast: CastVotes<Ctx>,
}

impl<Ctx> Driver<Ctx>
where
    Ctx: Context,
{
    /// Create a driver for `height`, which starts with no round.
    pub fn new(
        height: Ctx::Height,
        validator_set: Ctx::ValidatorSet,
        address: Ctx::Address,
        threshold_params: ThresholdParams,
    ) -> Self {
        Self {
            vote_keeper: VoteKeeper::new(validator_set.clone(), threshold_params),
            proposal_keeper: ProposalKeeper::new(),
            round_state: RoundState::new(height, Round::Nil),
            address,
            threshold_params,
            validator_set,
            proposer: None,
            pending_inputs: Vec::new(),
            cast: CastVotes::default(),
        }
    }

    /// Forget everything about the current height and get ready for `height`.
    pub fn move_to_height(&mut self, height: Ctx::Height, validator_set: Ctx::ValidatorSet) {
        *self = Self::new(height, validator_set, self.address.clone(), self.threshold_params);
    }

    /// Restore the locked and valid values recovered from storage.
    ///
    /// Must be called before the first round of the height starts.
    pub fn restore(
        &mut self,
        locked: Option<RoundValue<Ctx::Value>>,
        valid: Option<RoundValue<Ctx::Value>>,
    ) {
        self.round_state.locked = locked;
        self.round_state.valid = valid;
    }

    /// Height being decided.
    pub fn height(&self) -> Ctx::Height {
        self.round_state.height
    }

    /// Current round, `Round::Nil` before the first one starts.
    pub fn round(&self) -> Round {
        self.round_state.round
    }

    /// Step within the current round.
    pub fn step(&self) -> Step {
        self.round_state.step
    }

    /// Whether we are still waiting for a proposal, or for our own value to propose.
    pub fn step_is_propose(&self) -> bool {
        self.step() == Step::Propose
    }

    /// Whether the height has been decided.
    pub fn step_is_commit(&self) -> bool {
        self.step() == Step::Commit
    }

    /// Value we precommitted after seeing a polka for it, if any.
    pub fn locked_value(&self) -> Option<&RoundValue<Ctx::Value>> {
        self.round_state.locked.as_ref()
    }

    /// Most recent value with a polka, if any.
    pub fn valid_value(&self) -> Option<&RoundValue<Ctx::Value>> {
        self.round_state.valid.as_ref()
    }

    /// State of the round state machine.
    pub fn round_state(&self) -> &RoundState<Ctx> {
        &self.round_state
    }

    /// The round of the decided proposal and its value, once the height is decided.
    pub fn decided_value(&self) -> Option<(Round, Ctx::Value)> {
        let decision = self.round_state.decision.as_ref()?;
        Some((decision.round, decision.value.clone()))
    }

    /// Validators of this height.
    pub fn validator_set(&self) -> &Ctx::ValidatorSet {
        &self.validator_set
    }

    /// Votes received for this height.
    pub fn votes(&self) -> &VoteKeeper<Ctx> {
        &self.vote_keeper
    }

    /// Highest round of this height with a quorum of prevotes for a value.
    pub fn pol_round(&self) -> Round {
        self.vote_keeper.pol_round()
    }

    /// Proposals seen for the same height and round with a different value.
    pub fn proposal_evidence(&self) -> &EvidenceMap<Ctx> {
        self.proposal_keeper.evidence()
    }

    /// Proposals received for `round`, in arrival order.
    pub fn proposals_for_round(&self, round: Round) -> &[ReceivedProposal<Ctx>] {
        self.proposal_keeper.get_for_round(round)
    }

    /// The proposal received for `round` with the given value, if any.
    pub fn proposal_for_round_and_value(
        &self,
        round: Round,
        value_id: &ValueId<Ctx>,
    ) -> Option<&ReceivedProposal<Ctx>> {
        self.proposal_keeper.get_for_round_and_value(round, value_id)
    }

    /// The proposer of the current round, which must be part of the validator set.
    pub fn get_proposer(&self) -> Result<&Ctx::Validator, Error<Ctx>> {
        let address = self
            .proposer
            .as_ref()
            .ok_or_else(|| Error::NoProposer(self.height(), self.round()))?;

        self.validator_set
            .get_by_address(address)
            .ok_or_else(|| Error::ProposerNotFound(address.clone()))
    }

    /// Feed an input to the driver and collect everything the engine must act upon.
    ///
    /// A single input may trigger several transitions of the round state machine,
    /// as entering a new step can make earlier proposals or votes relevant again.
    pub fn process(&mut self, input: Input<Ctx>) -> Result<Vec<Output<Ctx>>, Error<Ctx>> {
        let mut outputs = Vec::new();

        let Some(output) = self.apply(input)? else {
            return Ok(outputs);
        };

        self.lift_output(output, &mut outputs);

        while !self.pending_inputs.is_empty() {
            for (round, input) in mem::take(&mut self.pending_inputs) {
                if let Some(output) = self.apply_input(round, input)? {
                    self.lift_output(output, &mut outputs);
                }
            }
        }

        Ok(outputs)
    }

    fn lift_output(&mut self, output: RoundOutput<Ctx>, outputs: &mut Vec<Output<Ctx>>) {
        let height = self.height();
        let round = self.round();

        match output {
            RoundOutput::NewRound(round) => outputs.push(Output::NewRound(height, round)),
            RoundOutput::Proposal(proposal) => outputs.push(Output::Propose(proposal)),
            RoundOutput::ScheduleTimeout(timeout) => outputs.push(Output::ScheduleTimeout(timeout)),
            RoundOutput::Decision(round, proposal) => outputs.push(Output::Decide(round, proposal)),

            RoundOutput::GetValueAndScheduleTimeout(height, round, timeout) => {
                outputs.extend([
                    Output::ScheduleTimeout(timeout),
                    Output::GetValue(height, round, timeout),
                ]);
            }

            RoundOutput::Vote(vote) => {
                if vote.validator_address() == &self.address && self.may_cast(&vote) {
                    self.cast.record(&vote, height, round);
                    outputs.push(Output::Vote(vote));
                }
            }
        }
    }

    /// Never sign two different votes of the same type for a round,
    /// nor a precommit for a value other than the one we last saw a polka for.
    fn may_cast(&self, vote: &Ctx::Vote) -> bool {
        if !self.cast.allows(vote) {
            return false;
        }

        match (vote.vote_type(), vote.value(), &self.round_state.valid) {
            (VoteType::Precommit, NilOrVal::Val(id), Some(valid)) => &valid.value.id() == id,
            _ => true,
        }
    }

    fn apply(&mut self, input: Input<Ctx>) -> RoundResult<Ctx> {
        match input {
            Input::NewRound(height, round, proposer) => {
                if self.height() == height {
                    self.round_state.round = round;
                } else {
                    self.round_state = RoundState::new(height, round);
                }

                self.proposer = Some(proposer);
                self.apply_input(round, RoundInput::NewRound(round))
            }

            Input::ProposeValue(round, value) => {
                self.apply_input(round, RoundInput::ProposeValue(value))
            }

            Input::Proposal(proposal, validity, timeliness) => {
                self.apply_proposal(proposal, validity, timeliness)
            }

            Input::Vote(vote) => self.apply_vote(vote),

            Input::TimeoutElapsed(timeout) => self.apply_timeout(timeout),
        }
    }

    fn apply_proposal(
        &mut self,
        proposal: SignedProposal<Ctx>,
        validity: Validity,
        timeliness: Timeliness,
    ) -> RoundResult<Ctx> {
        if proposal.height() != self.height() {
            return Err(Error::InvalidProposalHeight {
                proposal_height: proposal.height(),
                consensus_height: self.height(),
            });
        }

        let round = proposal.round();
        let received = ReceivedProposal::new(proposal, validity, timeliness);

        match self.store_and_multiplex_proposal(received) {
            Some(input) => self.apply_input(round, input),
            None => Ok(None),
        }
    }

    fn apply_vote(&mut self, vote: SignedVote<Ctx>) -> RoundResult<Ctx> {
        if vote.height() != self.height() {
            return Err(Error::InvalidVoteHeight {
                vote_height: vote.height(),
                consensus_height: self.height(),
            });
        }

        let voter = vote.validator_address();
        if self.validator_set.get_by_address(voter).is_none() {
            return Err(Error::ValidatorNotFound(voter.clone()));
        }

        let vote_round = vote.round();
        let current_round = self.round();

        match self.vote_keeper.apply_vote(vote, current_round) {
            Some(threshold) => {
                let (round, input) = self.multiplex_vote_threshold(threshold, vote_round);
                self.apply_input(round, input)
            }
            None => Ok(None),
        }
    }

    fn apply_timeout(&mut self, timeout: Timeout) -> RoundResult<Ctx> {
        let input = match timeout.kind {
            TimeoutKind::Propose => RoundInput::TimeoutPropose,
            TimeoutKind::Prevote => RoundInput::TimeoutPrevote,
            TimeoutKind::Precommit => RoundInput::TimeoutPrecommit,

            // Handled by the engine before it ever builds a value
            TimeoutKind::ProposerWait => return Ok(None),
        };

        self.apply_input(timeout.round, input)
    }

    /// Run one transition of the round state machine.
    fn apply_input(&mut self, input_round: Round, input: RoundInput<Ctx>) -> RoundResult<Ctx> {
        let proposer = self.get_proposer()?.address().clone();
        let info = Info::new(input_round, &self.address, &proposer);

        let before = self.round_state.step;
        let transition = mem::take(&mut self.round_state).apply(&info, input);
        self.round_state = transition.next_state;

        let after = self.round_state.step;
        if after != before && after != Step::Unstarted {
            self.pending_inputs = self.multiplex_step_change(input_round);
        }

        Ok(transition.output)
    }
}

/// The last prevote and precommit we signed.
#[derive_where(Default)]
struct CastVotes<Ctx>
where
    Ctx: Context,
{
    prevote: Option<Ctx::Vote>,
    precommit: Option<Ctx::Vote>,
}

impl<Ctx> CastVotes<Ctx>
where
    Ctx: Context,
{
    fn last(&self, typ: VoteType) -> Option<&Ctx::Vote> {
        match typ {
            VoteType::Prevote => self.prevote.as_ref(),
            VoteType::Precommit => self.precommit.as_ref(),
        }
    }

    /// A vote is allowed when it supersedes the last one of its type, or repeats it exactly.
    fn allows(&self, vote: &Ctx::Vote) -> bool {
        self.last(vote.vote_type()).is_none_or(|last| {
            (last.height(), last.round()) < (vote.height(), vote.round()) || last == vote
        })
    }

    fn record(&mut self, vote: &Ctx::Vote, height: Ctx::Height, round: Round) {
        if vote.height() != height || vote.round() != round {
            return;
        }

        let slot = match vote.vote_type() {
            VoteType::Prevote => &mut self.prevote,
            VoteType::Precommit => &mut self.precommit,
        };

        *slot = Some(vote.clone());
    }
}

impl<Ctx> fmt::Debug for Driver<Ctx>
where
    Ctx: Context,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("address", &self.address)
            .field("proposer", &self.proposer)
            .field("round_state", &self.round_state)
            .field("proposals", &self.proposal_keeper)
            .field("votes", &self.vote_keeper)
            .finish_non_exhaustive()
    }
}

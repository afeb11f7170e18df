//! The round state machine, as a transition table from `(step, input)` to `(state, output)`.
//!
//! Line numbers refer to Algorithm 1 of "The latest gossip on BFT consensus".

use chronobft_core_types::{Context, NilOrVal, Proposal, Round, Timeout, Value, ValueId};

use crate::input::Input;
use crate::output::Output;
use crate::state::{State, Step};
use crate::transition::Transition;

/// Who we are and who proposes, along with the round an input applies to.
pub struct Info<'a, Ctx>
where
    Ctx: Context,
{
    /// May differ from the round we are at, eg. for a round skip
    pub input_round: Round,
    /// Our own address
    pub address: &'a Ctx::Address,
    /// Proposer of the round we are at
    pub proposer: &'a Ctx::Address,
}

impl<'a, Ctx> Info<'a, Ctx>
where
    Ctx: Context,
{
    /// Bundle the round of an input with our address and the proposer.
    pub fn new(input_round: Round, address: &'a Ctx::Address, proposer: &'a Ctx::Address) -> Self {
        Self {
            input_round,
            address,
            proposer,
        }
    }

    /// Whether we are the proposer for the round we are at.
    pub fn is_proposer(&self) -> bool {
        self.address == self.proposer
    }
}

/// A POL round justifies a proposal if it is a defined round below the current one.
fn is_valid_pol_round<Ctx>(state: &State<Ctx>, pol_round: Round) -> bool
where
    Ctx: Context,
{
    pol_round.is_defined() && pol_round < state.round
}

/// Apply an input to the current state.
///
/// Returns the next state and an optional output for the driver to act on.
/// Inputs which do not apply in the current state yield an invalid transition
/// which leaves the state untouched.
pub fn apply<Ctx>(state: State<Ctx>, info: &Info<Ctx>, input: Input<Ctx>) -> Transition<Ctx>
where
    Ctx: Context,
{
    let this_round = state.round == info.input_round;
    let me = info.address;

    match (state.step, input) {
        // L11/L14
        (Step::Unstarted, Input::NewRound(round)) if info.is_proposer() => {
            propose_valid_or_get_value(state.with_round(round), me)
        }

        // L11/L20
        (Step::Unstarted, Input::NewRound(round)) => {
            let next = state.with_round(round).with_step(Step::Propose);
            schedule(next, Timeout::propose(round))
        }

        // The remaining inputs must be for the round we are at,
        // except for round skips and decisions.

        // L18
        (Step::Propose, Input::ProposeValue(value)) if this_round && info.is_proposer() => {
            propose(state, value, me)
        }

        // L22
        (Step::Propose, Input::Proposal(proposal))
            if this_round && proposal.pol_round().is_nil() =>
        {
            let value = fresh_proposal_prevote(&state, &proposal);
            prevote(state, me, value)
        }

        // L28
        (Step::Propose, Input::ProposalAndPolkaPrevious(proposal))
            if this_round && is_valid_pol_round(&state, proposal.pol_round()) =>
        {
            let value = reproposal_prevote(&state, &proposal);
            prevote(state, me, value)
        }

        // L26, L32
        (Step::Propose, Input::InvalidProposalAndPolkaPrevious(proposal))
            if this_round && is_valid_pol_round(&state, proposal.pol_round()) =>
        {
            prevote(state, me, NilOrVal::Nil)
        }

        // L26, L57
        (Step::Propose, Input::InvalidProposal | Input::TimeoutPropose) if this_round => {
            prevote(state, me, NilOrVal::Nil)
        }

        // L34
        (Step::Prevote, Input::PolkaAny) if this_round => {
            let timeout = Timeout::prevote(state.round);
            schedule(state, timeout)
        }

        // L44, L61
        (Step::Prevote, Input::PolkaNil | Input::TimeoutPrevote) if this_round => {
            precommit(state, me, NilOrVal::Nil)
        }

        // L36, the vote keeper emits it once per round
        (Step::Prevote, Input::ProposalAndPolkaCurrent(proposal)) if this_round => {
            lock_and_precommit(state, me, proposal)
        }

        // L42
        (Step::Precommit, Input::ProposalAndPolkaCurrent(proposal)) if this_round => {
            update_valid(state, &proposal)
        }

        (Step::Commit, _) => Transition::invalid(state),

        // L47
        (_, Input::PrecommitAny) if this_round => {
            let timeout = Timeout::precommit(state.round);
            schedule(state, timeout)
        }

        // L65
        (_, Input::TimeoutPrecommit) if this_round => {
            let next_round = info.input_round.increment();
            start_round(state, next_round)
        }

        // L55
        (_, Input::SkipRound(round)) if state.round < round => start_round(state, round),

        // L49
        (_, Input::ProposalAndPrecommitValue(proposal)) => decide(state, proposal),

        _ => Transition::invalid(state),
    }
}

// Propose

/// We are the proposer. Re-propose the valid value if there is one,
/// otherwise ask for a value and wait for it until the propose timeout.
///
/// Ref: L13-L16, L18
fn propose_valid_or_get_value<Ctx>(state: State<Ctx>, address: &Ctx::Address) -> Transition<Ctx>
where
    Ctx: Context,
{
    let output = match &state.valid {
        Some(valid) => Output::proposal(
            state.height,
            state.round,
            valid.value.clone(),
            valid.round,
            address.clone(),
        ),
        None => Output::GetValueAndScheduleTimeout(
            state.height,
            state.round,
            Timeout::propose(state.round),
        ),
    };

    Transition::to(state.with_step(Step::Propose)).with_output(output)
}

/// Ref: L19
fn propose<Ctx>(state: State<Ctx>, value: Ctx::Value, address: &Ctx::Address) -> Transition<Ctx>
where
    Ctx: Context,
{
    let output = Output::proposal(state.height, state.round, value, Round::Nil, address.clone());
    Transition::to(state).with_output(output)
}

// Prevote

/// What we prevote for a fresh proposal: the value, unless we are locked on another one.
///
/// Ref: L22-L27
fn fresh_proposal_prevote<Ctx>(state: &State<Ctx>, proposal: &Ctx::Proposal) -> NilOrVal<ValueId<Ctx>>
where
    Ctx: Context,
{
    debug_assert!(proposal.pol_round().is_nil());

    let proposed = proposal.value().id();
    match &state.locked {
        Some(locked) if locked.value.id() != proposed => NilOrVal::Nil,
        _ => NilOrVal::Val(proposed),
    }
}

/// What we prevote for a re-proposal backed by a polka at its POL round `vr`:
/// the value, unless we are locked on another one since a round after `vr`.
///
/// Ref: L28-L33
fn reproposal_prevote<Ctx>(state: &State<Ctx>, proposal: &Ctx::Proposal) -> NilOrVal<ValueId<Ctx>>
where
    Ctx: Context,
{
    let vr = proposal.pol_round();
    debug_assert!(vr.is_defined() && vr < proposal.round());

    let proposed = proposal.value().id();
    match &state.locked {
        Some(locked) if locked.round > vr && locked.value.id() != proposed => NilOrVal::Nil,
        _ => NilOrVal::Val(proposed),
    }
}

/// Ref: L24, L26, L30, L32, L57
fn prevote<Ctx>(
    state: State<Ctx>,
    address: &Ctx::Address,
    value: NilOrVal<ValueId<Ctx>>,
) -> Transition<Ctx>
where
    Ctx: Context,
{
    let output = Output::prevote(state.height, state.round, value, address.clone());
    Transition::to(state.with_step(Step::Prevote)).with_output(output)
}

// Precommit

/// Received a polka for the proposed value; lock on it and precommit it.
///
/// Ref: L36-L41
fn lock_and_precommit<Ctx>(
    state: State<Ctx>,
    address: &Ctx::Address,
    proposal: Ctx::Proposal,
) -> Transition<Ctx>
where
    Ctx: Context,
{
    let value = proposal.take_value();
    let vote = NilOrVal::Val(value.id());

    let next = state.set_locked(value.clone()).set_valid(value);
    precommit(next, address, vote)
}

/// Ref: L40, L45, L63
fn precommit<Ctx>(
    state: State<Ctx>,
    address: &Ctx::Address,
    value: NilOrVal<ValueId<Ctx>>,
) -> Transition<Ctx>
where
    Ctx: Context,
{
    let output = Output::precommit(state.height, state.round, value, address.clone());
    Transition::to(state.with_step(Step::Precommit)).with_output(output)
}

/// Received a polka for a value after we already precommitted; it becomes the valid value.
///
/// Ref: L36, L42-L43
fn update_valid<Ctx>(state: State<Ctx>, proposal: &Ctx::Proposal) -> Transition<Ctx>
where
    Ctx: Context,
{
    Transition::to(state.set_valid(proposal.value().clone()))
}

// Timeouts

/// Ref: L21, L35, L48
fn schedule<Ctx>(state: State<Ctx>, timeout: Timeout) -> Transition<Ctx>
where
    Ctx: Context,
{
    Transition::to(state).with_output(Output::ScheduleTimeout(timeout))
}

// New round or decision

/// Ref: L55-L56, L65-L67
fn start_round<Ctx>(state: State<Ctx>, round: Round) -> Transition<Ctx>
where
    Ctx: Context,
{
    let next = state.with_round(round).with_step(Step::Unstarted);
    Transition::to(next).with_output(Output::NewRound(round))
}

/// Received a quorum of precommits for a valid value, of any round; decide it.
///
/// Ref: L49-L54
fn decide<Ctx>(state: State<Ctx>, proposal: Ctx::Proposal) -> Transition<Ctx>
where
    Ctx: Context,
{
    let round = proposal.round();
    let next = state
        .set_decision(round, proposal.value().clone())
        .with_step(Step::Commit);

    Transition::to(next).with_output(Output::Decision(round, proposal))
}

//! Outputs of the round state machine.

use derive_where::derive_where;

use chronobft_core_types::{Context, NilOrVal, Round, Timeout, ValueId};

/// What the driver must do after a transition.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum Output<Ctx>
where
    Ctx: Context,
{
    /// Entered the given round.
    NewRound(Round),

    /// Sign and broadcast our proposal.
    Proposal(Ctx::Proposal),

    /// Sign and broadcast our vote.
    Vote(Ctx::Vote),

    /// Start a timer, which fires back as a timeout input.
    ScheduleTimeout(Timeout),

    /// We are the proposer without a valid value: build one, for at most the given timeout.
    GetValueAndScheduleTimeout(Ctx::Height, Round, Timeout),

    /// The proposal of the given round is decided.
    Decision(Round, Ctx::Proposal),
}

impl<Ctx> Output<Ctx>
where
    Ctx: Context,
{
    /// Propose `value`, with its POL round.
    pub fn proposal(
        height: Ctx::Height,
        round: Round,
        value: Ctx::Value,
        pol_round: Round,
        address: Ctx::Address,
    ) -> Self {
        Output::Proposal(Ctx::new_proposal(height, round, value, pol_round, address))
    }

    /// Prevote for a value or nil.
    pub fn prevote(
        height: Ctx::Height,
        round: Round,
        value_id: NilOrVal<ValueId<Ctx>>,
        address: Ctx::Address,
    ) -> Self {
        Output::Vote(Ctx::new_prevote(height, round, value_id, address))
    }

    /// Precommit for a value or nil.
    pub fn precommit(
        height: Ctx::Height,
        round: Round,
        value_id: NilOrVal<ValueId<Ctx>>,
        address: Ctx::Address,
    ) -> Self {
        Output::Vote(Ctx::new_precommit(height, round, value_id, address))
    }
}

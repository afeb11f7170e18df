use crate::{
    Address, Height, NilOrVal, Proposal, Round, SigningScheme, Validator, ValidatorSet, Value,
    ValueId, Vote,
};

/// Ties together the concrete types an application plugs into consensus.
///
/// The core crates are generic over a `Context`, they never see the concrete
/// block, vote or key types of the application.
pub trait Context
where
    Self: Sized + Clone + Send + Sync + 'static,
{
    /// Identifies a validator.
    type Address: Address;

    /// Position of a block in the chain.
    type Height: Height;

    /// A proposal of a value, for a height and round.
    type Proposal: Proposal<Self>;

    /// A member of the validator set.
    type Validator: Validator<Self>;

    /// The validators of a height.
    type ValidatorSet: ValidatorSet<Self>;

    /// What gets decided: a block, which carries its proposal time.
    type Value: Value;

    /// A prevote or precommit.
    type Vote: Vote<Self>;

    /// Keys and signatures of proposals and votes.
    type SigningScheme: SigningScheme;

    /// Proposer of `round` at `height`.
    ///
    /// Must be deterministic, every validator has to agree on it.
    fn select_proposer<'a>(
        &self,
        validator_set: &'a Self::ValidatorSet,
        height: Self::Height,
        round: Round,
    ) -> &'a Self::Validator;

    /// An unsigned proposal of `value`, re-proposed from `pol_round` if that is not nil.
    fn new_proposal(
        height: Self::Height,
        round: Round,
        value: Self::Value,
        pol_round: Round,
        address: Self::Address,
    ) -> Self::Proposal;

    /// An unsigned prevote of `address`.
    fn new_prevote(
        height: Self::Height,
        round: Round,
        value_id: NilOrVal<ValueId<Self>>,
        address: Self::Address,
    ) -> Self::Vote;

    /// An unsigned precommit of `address`.
    fn new_precommit(
        height: Self::Height,
        round: Round,
        value_id: NilOrVal<ValueId<Self>>,
        address: Self::Address,
    ) -> Self::Vote;
}

use core::fmt::{Debug, Display};

use crate::{Context, PublicKey};

/// Weight of a validator in every quorum.
pub type VotingPower = u64;

/// Identifies a validator in votes and proposals.
pub trait Address
where
    Self: Clone + Debug + Display + Eq + Ord + Send + Sync,
{
}

/// A member of the validator set of a height.
pub trait Validator<Ctx>
where
    Self: Clone + Debug + Eq + Send + Sync,
    Ctx: Context,
{
    /// Derived from the public key.
    fn address(&self) -> &Ctx::Address;

    /// Verifies the signatures of this validator.
    fn public_key(&self) -> &PublicKey<Ctx>;

    /// Weight of this validator.
    fn voting_power(&self) -> VotingPower;
}

/// The validators of a height.
///
/// Validators are unique and in the same order on every node, proposer selection indexes into it.
pub trait ValidatorSet<Ctx>
where
    Self: Clone + Debug + Eq + Send + Sync,
    Ctx: Context,
{
    /// Number of validators.
    fn count(&self) -> usize;

    /// Sum of the voting power of all validators, against which quorums are computed.
    fn total_voting_power(&self) -> VotingPower;

    /// Lookup by address, `None` for someone outside the set.
    fn get_by_address(&self, address: &Ctx::Address) -> Option<&Ctx::Validator>;

    /// Lookup by position.
    fn get_by_index(&self, index: usize) -> Option<&Ctx::Validator>;
}

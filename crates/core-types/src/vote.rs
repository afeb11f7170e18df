use core::fmt::Debug;

use crate::{Context, NilOrVal, Round, Timestamp, Value};

/// A type of vote.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoteType {
    /// Votes for values which validators observe are valid for a given round.
    Prevote,

    /// Votes to commit to a particular value for a given round.
    Precommit,
}

/// Defines the requirements for a vote.
///
/// Votes are signed messages from validators for a particular value which
/// include information about the validator signing it.
pub trait Vote<Ctx>
where
    Self: Clone + Debug + Eq + Ord + Send + Sync + 'static,
    Ctx: Context,
{
    /// The height for which the vote is for.
    fn height(&self) -> Ctx::Height;

    /// The round for which the vote is for.
    fn round(&self) -> Round;

    /// Get a reference to the value being voted for.
    fn value(&self) -> &NilOrVal<<Ctx::Value as Value>::Id>;

    /// Take ownership of the value being voted for.
    fn take_value(self) -> NilOrVal<<Ctx::Value as Value>::Id>;

    /// The type of vote.
    fn vote_type(&self) -> VoteType;

    /// Address of the validator who issued this vote
    fn validator_address(&self) -> &Ctx::Address;

    /// Local time of the validator at which the vote was cast.
    fn timestamp(&self) -> Timestamp;

    /// Stamp this vote with the given time, overriding any existing timestamp.
    fn stamp(self, timestamp: Timestamp) -> Self;

    /// Whether this vote and `other` are cast by the same validator for the same
    /// height, round and type, but for a different value.
    ///
    /// Votes which only differ by their timestamp do not conflict.
    fn conflicts_with(&self, other: &Self) -> bool {
        self.height() == other.height()
            && self.round() == other.round()
            && self.vote_type() == other.vote_type()
            && self.validator_address() == other.validator_address()
            && self.value() != other.value()
    }
}

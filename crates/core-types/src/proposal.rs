use core::fmt::Debug;

use crate::{Context, Round};

/// Defines the requirements for a proposal type.
pub trait Proposal<Ctx>
where
    Self: Clone + Debug + Eq + Send + Sync + 'static,
    Ctx: Context,
{
    /// The height for which the proposal is for.
    fn height(&self) -> Ctx::Height;

    /// The round for which the proposal is for.
    fn round(&self) -> Round;

    /// The value that is proposed.
    fn value(&self) -> &Ctx::Value;

    /// Take ownership of the proposed value.
    fn take_value(self) -> Ctx::Value;

    /// The proof-of-lock round of the proposal, `Round::Nil` if there is none.
    fn pol_round(&self) -> Round;

    /// Address of the validator who issued this proposal
    fn validator_address(&self) -> &Ctx::Address;
}

/// Whether or not a proposed value is valid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Validity {
    /// The value is valid.
    Valid,
    /// The value is invalid.
    Invalid,
}

impl Validity {
    /// Returns `true` if the value is valid.
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }

    /// Returns `Valid` if given true, `Invalid` if given false.
    pub fn from_bool(valid: bool) -> Self {
        if valid {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

/// Whether or not a proposal was received within the synchrony bounds of the network.
///
/// Timeliness only gates the prevote a validator casts upon first seeing a proposal
/// without a proof-of-lock round. A value that is valid but arrived late can still
/// be locked on and decided once a quorum of validators vouch for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Timeliness {
    /// The proposal satisfies the timeliness bounds.
    Timely,
    /// The proposal violates the timeliness bounds.
    Untimely,
}

impl Timeliness {
    /// Returns `true` if the proposal was timely.
    pub fn is_timely(self) -> bool {
        self == Timeliness::Timely
    }

    /// Returns `Timely` if given true, `Untimely` if given false.
    pub fn from_bool(timely: bool) -> Self {
        if timely {
            Timeliness::Timely
        } else {
            Timeliness::Untimely
        }
    }
}

use core::fmt::{Debug, Display};

use crate::Timestamp;

/// Represents either `Nil` or a value of type `Value`.
///
/// This type is isomorphic to `Option<Value>` but is more explicit about its intent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NilOrVal<Value> {
    /// The value is `nil`.
    #[default]
    Nil,

    /// The value is a value of type `Value`.
    Val(Value),
}

impl<Value> NilOrVal<Value> {
    /// Whether this is `nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Whether this is an actual value.
    pub fn is_val(&self) -> bool {
        matches!(self, Self::Val(_))
    }

    /// Apply the given function to the value if it is not `nil`.
    pub fn map<NewValue, F: FnOnce(Value) -> NewValue>(self, f: F) -> NilOrVal<NewValue> {
        match self {
            NilOrVal::Nil => NilOrVal::Nil,
            NilOrVal::Val(value) => NilOrVal::Val(f(value)),
        }
    }

    /// Convert this into an `NilOrVal<&Value>`, allowing to borrow the value.
    pub fn as_ref(&self) -> NilOrVal<&Value> {
        match self {
            NilOrVal::Nil => NilOrVal::Nil,
            NilOrVal::Val(value) => NilOrVal::Val(value),
        }
    }

    /// Convert into an `Option`, mapping `nil` to `None`.
    pub fn into_option(self) -> Option<Value> {
        match self {
            NilOrVal::Nil => None,
            NilOrVal::Val(value) => Some(value),
        }
    }
}

impl<Value> NilOrVal<&Value> {
    /// Clone the underlying value
    #[must_use = "`self` will be dropped if the result is not used"]
    pub fn cloned(self) -> NilOrVal<Value>
    where
        Value: Clone,
    {
        match self {
            NilOrVal::Nil => NilOrVal::Nil,
            NilOrVal::Val(value) => NilOrVal::Val(value.clone()),
        }
    }
}

/// The value `v` carried by a proposal, typically a block.
///
/// Every value carries the time assigned to it by its proposer, which
/// validators check against their own clock before prevoting for it.
pub trait Value
where
    Self: Clone + Debug + PartialEq + Eq + PartialOrd + Ord + Send + Sync,
{
    /// A unique representation of the `Value` with a lower memory footprint, denoted `id(v)`.
    /// It is carried by votes and therefore is typically set to be a hash of the value `v`.
    type Id: Clone + Debug + Display + Eq + Ord + Send + Sync;

    /// The ID of the value.
    fn id(&self) -> Self::Id;

    /// The time assigned to this value by its proposer.
    fn time(&self) -> Timestamp;
}

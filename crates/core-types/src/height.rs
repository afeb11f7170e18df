use core::fmt::{Debug, Display};

/// Defines the requirements for a height type.
///
/// A height denotes the number of blocks committed since the chain began.
pub trait Height
where
    Self:
        Default + Copy + Clone + Debug + Display + PartialEq + Eq + PartialOrd + Ord + Send + Sync,
{
    /// The height at which the chain starts producing blocks.
    const INITIAL: Self;

    /// The next height.
    fn increment(&self) -> Self;

    /// Convert the height to a `u64`.
    fn as_u64(&self) -> u64;
}

use core::{cmp, fmt};

/// A round number.
///
/// Either `Round::Nil`, standing for `-1`, or `Round::Some(r)` with `r >= 0`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Round {
    /// No round, ie. `-1`
    Nil,

    /// Some round `r` where `r >= 0`
    Some(u32),
}

impl Round {
    /// The initial round of every height.
    pub const ZERO: Self = Self::Some(0);

    /// Create a new non-nil round.
    pub const fn new(round: u32) -> Self {
        Self::Some(round)
    }

    /// The round number, `None` for `Round::Nil`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Round::Nil => None,
            Round::Some(r) => Some(*r),
        }
    }

    /// The round number, `-1` for `Round::Nil`.
    pub fn as_i64(&self) -> i64 {
        match self {
            Round::Nil => -1,
            Round::Some(r) => i64::from(*r),
        }
    }

    /// Whether the round is defined, ie. `r >= 0`.
    pub fn is_defined(&self) -> bool {
        matches!(self, Round::Some(_))
    }

    /// Whether the round is nil, ie. `r == -1`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Round::Nil)
    }

    /// The next round; the next round of `Round::Nil` is round zero.
    pub fn increment(&self) -> Round {
        match self {
            Round::Nil => Round::ZERO,
            Round::Some(r) => Round::new(r.saturating_add(1)),
        }
    }
}

impl From<u32> for Round {
    fn from(round: u32) -> Self {
        Round::new(round)
    }
}

impl PartialOrd for Round {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Round {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.as_i64().cmp(&other.as_i64())
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_i64().fmt(f)
    }
}

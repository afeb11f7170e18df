use crate::VotingPower;

/// The kind of quorum reached by a set of votes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Threshold<ValueId> {
    /// No quorum has been reached yet
    Unreached,

    /// Quorum of votes but not for the same value
    Any,

    /// Quorum of votes for nil
    Nil,

    /// Quorum of votes for a value
    Value(ValueId),
}

/// The thresholds used to aggregate votes.
///
/// - The quorum threshold is the voting power needed for a quorum, `2f+1`.
/// - The honest threshold is the voting power needed to be sure that at least
///   one correct validator is involved, `f+1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThresholdParams {
    /// Threshold for a quorum (default: 2f+1)
    pub quorum: ThresholdParam,

    /// Threshold for the minimum number of honest nodes (default: f+1)
    pub honest: ThresholdParam,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            quorum: ThresholdParam::TWO_F_PLUS_ONE,
            honest: ThresholdParam::F_PLUS_ONE,
        }
    }
}

/// A threshold expressed as the fraction of the total voting power
/// that must be strictly exceeded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThresholdParam {
    /// Numerator of the threshold
    pub numerator: u64,

    /// Denominator of the threshold
    pub denominator: u64,
}

impl ThresholdParam {
    /// 2f+1, ie. more than two thirds of the total weight
    pub const TWO_F_PLUS_ONE: Self = Self::new(2, 3);

    /// f+1, ie. more than one third of the total weight
    pub const F_PLUS_ONE: Self = Self::new(1, 3);

    /// Create a new threshold parameter with the given numerator and denominator.
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Check whether the threshold is met, ie. `weight / total > numerator / denominator`.
    pub fn is_met(&self, weight: VotingPower, total: VotingPower) -> bool {
        let lhs = u128::from(weight) * u128::from(self.denominator);
        let rhs = u128::from(total) * u128::from(self.numerator);

        lhs > rhs
    }

    /// The minimum weight needed to meet the threshold for the given total.
    pub fn min_expected(&self, total: VotingPower) -> VotingPower {
        let denominator = u128::from(self.denominator.max(1));
        let floor = u128::from(total) * u128::from(self.numerator) / denominator;

        VotingPower::try_from(floor + 1).unwrap_or(VotingPower::MAX)
    }
}

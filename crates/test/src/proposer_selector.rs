use chronobft_core_types::{Context, Round, ValidatorSet as _};

use crate::{Address, Height, TestContext, Validator, ValidatorSet};

/// Defines how to select a proposer amongst a validator set for a given round.
pub trait ProposerSelector<Ctx>
where
    Self: Send + Sync,
    Ctx: Context,
{
    /// Select a proposer from the given validator set for the given round.
    ///
    /// # Important
    /// This function must be deterministic!
    /// For a given height, round and validator set, it must always return the same proposer.
    fn select_proposer<'a>(
        &self,
        height: Ctx::Height,
        round: Round,
        validator_set: &'a Ctx::ValidatorSet,
    ) -> &'a Ctx::Validator;
}

/// Rotates through the validator set, one step per round and one per height.
#[derive(Copy, Clone, Debug, Default)]
pub struct RotateProposer;

impl ProposerSelector<TestContext> for RotateProposer {
    fn select_proposer<'a>(
        &self,
        height: Height,
        round: Round,
        validator_set: &'a ValidatorSet,
    ) -> &'a Validator {
        let height = height.as_u64().saturating_sub(1) as usize;
        let round = round.as_u32().unwrap_or(0) as usize;

        validator_set.nth_wrapping(height.wrapping_add(round))
    }
}

/// Always selects the same validator, or the first one if it is not in the set.
#[derive(Copy, Clone, Debug)]
pub struct FixedProposer {
    proposer: Address,
}

impl FixedProposer {
    pub fn new(proposer: Address) -> Self {
        Self { proposer }
    }
}

impl ProposerSelector<TestContext> for FixedProposer {
    fn select_proposer<'a>(
        &self,
        _height: Height,
        _round: Round,
        validator_set: &'a ValidatorSet,
    ) -> &'a Validator {
        validator_set
            .get_by_address(&self.proposer)
            .unwrap_or_else(|| validator_set.nth_wrapping(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validators::make_validators;

    #[test]
    fn rotate_by_height_and_round() {
        let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
        let vs = ValidatorSet::new([v0.clone(), v1.clone(), v2.clone(), v3.clone()]);

        let at = |h: u64, r: u32| RotateProposer.select_proposer(Height::new(h), Round::new(r), &vs);

        assert_eq!(at(1, 0), &v0);
        assert_eq!(at(2, 0), &v1);
        assert_eq!(at(4, 0), &v3);
        assert_eq!(at(5, 0), &v0);
        assert_eq!(at(1, 2), &v2);
        assert_eq!(at(3, 3), &v1);
    }
}

//! Evidence of equivocation.

use alloc::collections::btree_map::BTreeMap;
use alloc::vec::Vec;

use derive_where::derive_where;

use chronobft_core_types::{Context, DoubleVote, SignedVote, Vote};

/// Conflicting votes received from each validator, in order of arrival.
#[derive_where(Clone, Debug, Default)]
pub struct EvidenceMap<Ctx>
where
    Ctx: Context,
{
    map: BTreeMap<Ctx::Address, Vec<DoubleVote<Ctx>>>,
}

impl<Ctx> EvidenceMap<Ctx>
where
    Ctx: Context,
{
    /// Create an empty `EvidenceMap`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there is any evidence of equivocation.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The number of pairs of conflicting votes recorded.
    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// The evidence of equivocation for the given validator, if any.
    pub fn get(&self, address: &Ctx::Address) -> Option<&[DoubleVote<Ctx>]> {
        self.map.get(address).map(Vec::as_slice)
    }

    /// Record that `conflicting` contradicts the vote `existing` we already had.
    pub fn add(&mut self, existing: SignedVote<Ctx>, conflicting: SignedVote<Ctx>) {
        debug_assert_eq!(existing.validator_address(), conflicting.validator_address());

        self.map
            .entry(conflicting.validator_address().clone())
            .or_default()
            .push((existing, conflicting));
    }
}

//! Values and the weight of the votes cast for them.

use alloc::collections::BTreeMap;

use crate::Weight;

/// Values and the weight of the votes cast for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValuesWeights<Value> {
    value_weights: BTreeMap<Value, Weight>,
}

impl<Value> ValuesWeights<Value> {
    /// Create a new, empty tally.
    pub fn new() -> ValuesWeights<Value> {
        ValuesWeights {
            value_weights: BTreeMap::new(),
        }
    }

    /// Add weight to the value and return its new weight.
    ///
    /// Weights saturate at `Weight::MAX`.
    pub fn add(&mut self, value: Value, weight: Weight) -> Weight
    where
        Value: Ord,
    {
        let entry = self.value_weights.entry(value).or_insert(0);
        *entry = entry.saturating_add(weight);
        *entry
    }

    /// The weight of the value, or 0 if nobody voted for it.
    pub fn get(&self, value: &Value) -> Weight
    where
        Value: Ord,
    {
        self.value_weights.get(value).copied().unwrap_or(0)
    }

    /// The sum of the weights of all values.
    pub fn sum(&self) -> Weight {
        self.value_weights
            .values()
            .fold(0, |sum, weight| sum.saturating_add(*weight))
    }

    /// Iterate over the values and their weights, in ascending order of values.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, Weight)> {
        self.value_weights.iter().map(|(value, weight)| (value, *weight))
    }
}

impl<Value> Default for ValuesWeights<Value> {
    fn default() -> Self {
        Self::new()
    }
}

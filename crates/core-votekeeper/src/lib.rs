//! Aggregation of votes into quorums, per height and round.

#![no_std]
#![forbid(unsafe_code)]
#![deny(trivial_casts, trivial_numeric_casts)]
#![warn(
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    variant_size_differences
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::panic))]

extern crate alloc;

pub mod ballot_box;
pub mod evidence;
pub mod keeper;
pub mod round_votes;
pub mod value_weights;

pub use evidence::EvidenceMap;

/// The weight of a vote, ie. the voting power of the validator that cast it.
pub type Weight = chronobft_core_types::VotingPower;

pub use chronobft_core_types::{Threshold, ThresholdParam, ThresholdParams};

//! Driver for the round state machine of the chronobft consensus engine

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

mod driver;
mod error;
mod input;
mod mux;
mod output;
mod proposal_keeper;

pub use driver::Driver;
pub use error::Error;
pub use input::Input;
pub use output::Output;
pub use proposal_keeper::{
    EvidenceMap as ProposalEvidenceMap, ProposalKeeper, ReceivedProposal, RecordProposalError,
};

pub use chronobft_core_votekeeper::ThresholdParams;

//! Common data types and abstractions for the consensus engine.

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

mod clock;
mod context;
mod height;
mod proposal;
mod round;
mod signed_message;
mod signing;
mod threshold;
mod time;
mod timeout;
mod timing;
mod validator_set;
mod value;
mod vote;

/// Type alias to make it easier to refer the `ValueId` type.
pub type ValueId<Ctx> = <<Ctx as Context>::Value as Value>::Id;

/// Type alias to make it easier to refer the `PublicKey` type.
pub type PublicKey<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::PublicKey;

/// Type alias to make it easier to refer the `PrivateKey` type.
pub type PrivateKey<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::PrivateKey;

/// Type alias to make it easier to refer the `Signature` type.
pub type Signature<Ctx> = <<Ctx as Context>::SigningScheme as SigningScheme>::Signature;

/// A signed vote.
pub type SignedVote<Ctx> = SignedMessage<Ctx, <Ctx as Context>::Vote>;

/// Two conflicting votes signed by the same validator.
pub type DoubleVote<Ctx> = (SignedVote<Ctx>, SignedVote<Ctx>);

/// A signed proposal.
pub type SignedProposal<Ctx> = SignedMessage<Ctx, <Ctx as Context>::Proposal>;

/// Two conflicting proposals signed by the same validator.
pub type DoubleProposal<Ctx> = (SignedProposal<Ctx>, SignedProposal<Ctx>);

pub use clock::{Clock, ManualClock};
pub use context::Context;
pub use height::Height;
pub use proposal::{Proposal, Timeliness, Validity};
pub use round::Round;
pub use signed_message::SignedMessage;
pub use signing::{SigningError, SigningProvider, SigningScheme};
pub use threshold::{Threshold, ThresholdParam, ThresholdParams};
pub use time::Timestamp;
pub use timeout::{Timeout, TimeoutKind};
pub use timing::{proposal_step_waiting_time, proposer_wait_time, TimingParams, Untimely};
pub use validator_set::{Address, Validator, ValidatorSet, VotingPower};
pub use value::{NilOrVal, Value};
pub use vote::{Vote, VoteType};

use alloc::string::String;
use core::fmt::Debug;

use crate::{Context, PublicKey, Signature, SignedProposal, SignedVote};

/// A signing scheme that can be used to sign votes and verify such signatures.
///
/// An example of a signing scheme is the Ed25519 signature scheme,
/// eg. as implemented in the [`ed25519-consensus`][ed25519-consensus] crate.
///
/// [ed25519-consensus]: https://crates.io/crates/ed25519-consensus
pub trait SigningScheme
where
    Self: Clone + Debug + Eq,
{
    /// The type of signatures produced by this signing scheme.
    type Signature: Clone + Debug + Eq + Ord + Send + Sync;

    /// The type of public keys produced by this signing scheme.
    type PublicKey: Clone + Debug + Eq + Send + Sync;

    /// The type of private keys produced by this signing scheme.
    type PrivateKey: Clone + Send + Sync;
}

/// Signing a consensus message failed.
///
/// A validator that cannot sign must not go on as if it had voted,
/// so this error halts the consensus engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    /// The private key of the validator is not available.
    #[error("signing key is unavailable")]
    KeyUnavailable,

    /// The signer failed for another reason.
    #[error("signer failed: {0}")]
    Failed(String),
}

/// Signs consensus messages with the key of this validator,
/// and verifies the signatures of messages from other validators.
pub trait SigningProvider<Ctx>
where
    Ctx: Context,
    Self: Send + Sync + 'static,
{
    /// Sign the given vote with our private key.
    fn sign_vote(&self, vote: Ctx::Vote) -> Result<SignedVote<Ctx>, SigningError>;

    /// Verify the given vote's signature using the given public key.
    fn verify_signed_vote(
        &self,
        vote: &Ctx::Vote,
        signature: &Signature<Ctx>,
        public_key: &PublicKey<Ctx>,
    ) -> bool;

    /// Sign the given proposal with our private key.
    fn sign_proposal(&self, proposal: Ctx::Proposal) -> Result<SignedProposal<Ctx>, SigningError>;

    /// Verify the given proposal's signature using the given public key.
    fn verify_signed_proposal(
        &self,
        proposal: &Ctx::Proposal,
        signature: &Signature<Ctx>,
        public_key: &PublicKey<Ctx>,
    ) -> bool;
}

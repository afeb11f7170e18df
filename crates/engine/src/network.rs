use derive_where::derive_where;
use ractor::ActorRef;

use chronobft_core_types::{Context, SignedProposal, SignedVote};

/// A reference to the network actor.
pub type NetworkRef<Ctx> = ActorRef<NetworkMsg<Ctx>>;

/// A signed consensus message.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub enum SignedConsensusMsg<Ctx: Context> {
    Vote(SignedVote<Ctx>),
    Proposal(SignedProposal<Ctx>),
}

impl<Ctx: Context> SignedConsensusMsg<Ctx> {
    pub fn height(&self) -> Ctx::Height {
        use chronobft_core_types::{Proposal, Vote};

        match self {
            Self::Vote(vote) => vote.height(),
            Self::Proposal(proposal) => proposal.height(),
        }
    }
}

/// Messages handled by the network actor.
#[derive_where(Debug)]
pub enum NetworkMsg<Ctx: Context> {
    /// Broadcast a message to the other validators, on a best-effort basis.
    Publish(SignedConsensusMsg<Ctx>),
}

use core::fmt;

use crate::Round;

/// The kind of timeout.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeoutKind {
    /// Waiting for a proposal in the propose step.
    Propose,

    /// Waiting for a prevote quorum for a single value or nil.
    Prevote,

    /// Waiting for a precommit quorum for a single value.
    Precommit,

    /// The proposer of the round waiting for the previous block time to pass
    /// before it builds its proposal.
    ///
    /// Handled by the consensus engine only, never fed to the round state machine.
    ProposerWait,
}

/// A timeout for a round step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout {
    /// The timeout kind.
    pub kind: TimeoutKind,

    /// The round for which the timeout is for.
    pub round: Round,
}

impl Timeout {
    /// Create a new timeout for the given round and step.
    pub const fn new(round: Round, kind: TimeoutKind) -> Self {
        Self { round, kind }
    }

    /// Create a new timeout for the propose step of the given round.
    pub const fn propose(round: Round) -> Self {
        Self::new(round, TimeoutKind::Propose)
    }

    /// Create a new timeout for the prevote step of the given round.
    pub const fn prevote(round: Round) -> Self {
        Self::new(round, TimeoutKind::Prevote)
    }

    /// Create a new timeout for the precommit step of the given round.
    pub const fn precommit(round: Round) -> Self {
        Self::new(round, TimeoutKind::Precommit)
    }

    /// Create a new timeout for the proposer of the given round to wait
    /// for the previous block time to pass.
    pub const fn proposer_wait(round: Round) -> Self {
        Self::new(round, TimeoutKind::ProposerWait)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}Timeout({})", self.kind, self.round)
    }
}

use core::fmt;

use derive_where::derive_where;
use tokio::sync::broadcast;

use chronobft_core_types::{
    Context, DoubleProposal, DoubleVote, Round, SignedVote, Timeout, Timestamp, Untimely, ValueId,
};

pub type RxEvent<Ctx> = broadcast::Receiver<Event<Ctx>>;

#[derive_where(Clone)]
pub struct TxEvent<Ctx: Context> {
    tx: broadcast::Sender<Event<Ctx>>,
}

impl<Ctx: Context> TxEvent<Ctx> {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(128);
        Self { tx }
    }

    pub fn subscribe(&self) -> RxEvent<Ctx> {
        self.tx.subscribe()
    }

    pub fn send(&self, event: impl FnOnce() -> Event<Ctx>) {
        if self.tx.receiver_count() > 0 {
            let _ = self.tx.send(event());
        }
    }
}

impl<Ctx: Context> Default for TxEvent<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications emitted by the consensus engine, in the order it processed them.
#[derive_where(Clone, Debug)]
pub enum Event<Ctx: Context> {
    /// Started the given height, `true` if it was resumed from persisted state
    StartedHeight(Ctx::Height, bool),

    /// Entered the given round
    NewRound(Ctx::Height, Round),

    /// Received a proposal for the given value, at the given local time
    CompleteProposal(Ctx::Height, Round, ValueId<Ctx>, Timestamp),

    /// Published one of our own votes
    Vote(SignedVote<Ctx>),

    /// Decided the given value, carrying the given block time
    NewBlock(Ctx::Height, ValueId<Ctx>, Timestamp),

    /// A validator cast two conflicting votes
    EquivocatingVote(DoubleVote<Ctx>),

    /// A validator sent two conflicting proposals
    EquivocatingProposal(DoubleProposal<Ctx>),

    /// Received a proposal which violates the timeliness bounds
    UntimelyProposal(Ctx::Height, Round, Untimely),

    /// A round step timeout elapsed
    TimeoutElapsed(Ctx::Height, Timeout),
}

impl<Ctx: Context> fmt::Display for Event<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::StartedHeight(height, restart) => {
                write!(f, "StartedHeight(height: {height}, restart: {restart})")
            }
            Event::NewRound(height, round) => {
                write!(f, "NewRound(height: {height}, round: {round})")
            }
            Event::CompleteProposal(height, round, value_id, receipt_time) => {
                write!(
                    f,
                    "CompleteProposal(height: {height}, round: {round}, value: {value_id}, receipt_time: {receipt_time})"
                )
            }
            Event::Vote(vote) => write!(f, "Vote(vote: {:?})", vote.message),
            Event::NewBlock(height, value_id, time) => {
                write!(f, "NewBlock(height: {height}, value: {value_id}, time: {time})")
            }
            Event::EquivocatingVote((existing, conflicting)) => write!(
                f,
                "EquivocatingVote(existing: {:?}, conflicting: {:?})",
                existing.message, conflicting.message
            ),
            Event::EquivocatingProposal((existing, conflicting)) => write!(
                f,
                "EquivocatingProposal(existing: {:?}, conflicting: {:?})",
                existing.message, conflicting.message
            ),
            Event::UntimelyProposal(height, round, reason) => {
                write!(f, "UntimelyProposal(height: {height}, round: {round}, reason: {reason})")
            }
            Event::TimeoutElapsed(height, timeout) => {
                write!(f, "TimeoutElapsed(height: {height}, timeout: {timeout})")
            }
        }
    }
}

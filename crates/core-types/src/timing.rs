//! Proposer-based timestamps: synchrony parameters, proposal timing and timeliness.

use core::time::Duration;

use crate::Timestamp;

/// Synchrony parameters of the network, fixed for the whole chain.
///
/// Both parameters must be strictly positive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingParams {
    /// Maximum difference between the clocks of any two correct validators.
    pub precision: Duration,

    /// Maximum end-to-end delay for a proposal to reach a correct validator.
    pub message_delay: Duration,
}

impl TimingParams {
    /// Create a new set of timing parameters.
    pub const fn new(precision: Duration, message_delay: Duration) -> Self {
        Self {
            precision,
            message_delay,
        }
    }

    /// `Precision + MessageDelay`, ie. how late after its block time
    /// a proposal can be received and still be considered timely.
    pub fn max_receipt_delay(&self) -> Duration {
        self.precision.saturating_add(self.message_delay)
    }

    /// Check whether a proposal for a block with the given time,
    /// received at the given local time, is timely.
    ///
    /// A block time must never be earlier than the time of the block before it,
    /// must not be more than `Precision + MessageDelay` behind the receipt time,
    /// and must not be more than `Precision` ahead of it.
    pub fn check_timeliness(
        &self,
        block_time: Timestamp,
        receipt_time: Timestamp,
        previous_block_time: Timestamp,
    ) -> Result<(), Untimely> {
        if block_time < previous_block_time {
            return Err(Untimely::BeforePreviousBlock {
                block_time,
                previous_block_time,
            });
        }

        let bound = self.max_receipt_delay();
        if receipt_time.saturating_duration_since(block_time) > bound {
            return Err(Untimely::TooLate {
                block_time,
                receipt_time,
                bound,
            });
        }

        if block_time.saturating_duration_since(receipt_time) > self.precision {
            return Err(Untimely::TooEarly {
                block_time,
                receipt_time,
                precision: self.precision,
            });
        }

        Ok(())
    }

    /// Latest local time at which a fresh proposal of the first round of a height
    /// can be received: `previous_block_time + Precision + MessageDelay`.
    pub fn proposal_deadline(&self, previous_block_time: Timestamp) -> Timestamp {
        previous_block_time.saturating_add(self.max_receipt_delay())
    }

    /// Same as [`check_timeliness`](Self::check_timeliness), for a proposal of the first round
    /// without a proof-of-lock round, which must also be received by the
    /// [`proposal_deadline`](Self::proposal_deadline).
    ///
    /// Any correct proposer of the first round gets its proposal through by then,
    /// whatever the propose timeout.
    pub fn check_first_round_timeliness(
        &self,
        block_time: Timestamp,
        receipt_time: Timestamp,
        previous_block_time: Timestamp,
    ) -> Result<(), Untimely> {
        self.check_timeliness(block_time, receipt_time, previous_block_time)?;

        let deadline = self.proposal_deadline(previous_block_time);
        if receipt_time > deadline {
            return Err(Untimely::PastDeadline {
                receipt_time,
                deadline,
            });
        }

        Ok(())
    }
}

/// How long a proposer must wait before it may propose a block on top of a block
/// with the given time: `max(0, previous_block_time - now)`.
///
/// At the first height, the genesis time plays the role of the previous block time.
pub fn proposer_wait_time(now: Timestamp, previous_block_time: Timestamp) -> Duration {
    previous_block_time.saturating_duration_since(now)
}

/// How long a validator waits, after entering the propose step, for a timely proposal
/// to arrive: `max(0, previous_block_time + Precision + MessageDelay - now)`.
pub fn proposal_step_waiting_time(
    now: Timestamp,
    previous_block_time: Timestamp,
    params: &TimingParams,
) -> Duration {
    params
        .proposal_deadline(previous_block_time)
        .saturating_duration_since(now)
}

/// Why a proposal was not timely.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Untimely {
    /// The block time is earlier than the time of the previous block.
    #[error("block time {block_time} is before previous block time {previous_block_time}")]
    BeforePreviousBlock {
        /// Time of the proposed block
        block_time: Timestamp,
        /// Time of the previous block
        previous_block_time: Timestamp,
    },

    /// The proposal was received too long after its block time.
    #[error("received at {receipt_time}, more than {bound:?} after block time {block_time}")]
    TooLate {
        /// Time of the proposed block
        block_time: Timestamp,
        /// Local time at which the proposal was received
        receipt_time: Timestamp,
        /// `Precision + MessageDelay`
        bound: Duration,
    },

    /// The block time is too far ahead of the local clock.
    #[error("block time {block_time} is more than {precision:?} ahead of receipt time {receipt_time}")]
    TooEarly {
        /// Time of the proposed block
        block_time: Timestamp,
        /// Local time at which the proposal was received
        receipt_time: Timestamp,
        /// `Precision`
        precision: Duration,
    },

    /// A proposal of the first round was received after the propose step
    /// should have given up on it.
    #[error("received at {receipt_time}, after the first round deadline {deadline}")]
    PastDeadline {
        /// Local time at which the proposal was received
        receipt_time: Timestamp,
        /// `previous_block_time + Precision + MessageDelay`
        deadline: Timestamp,
    },
}

use std::time::Duration;

use chronobft_config::{ProposeTimeoutPolicy, TimeoutConfig};
use chronobft_core_types::{
    proposal_step_waiting_time, proposer_wait_time, Timeout, TimeoutKind, TimingParams, Timestamp,
};

/// Computes how long to wait for each timeout of a round.
#[derive(Copy, Clone, Debug)]
pub struct Timeouts {
    config: TimeoutConfig,
    policy: ProposeTimeoutPolicy,
    timing: TimingParams,
}

impl Timeouts {
    pub fn new(config: TimeoutConfig, policy: ProposeTimeoutPolicy, timing: TimingParams) -> Self {
        Self {
            config,
            policy,
            timing,
        }
    }

    /// The duration of the given timeout, for a step entered at `now`,
    /// on top of a block with the given time.
    pub fn duration_for(
        &self,
        timeout: Timeout,
        now: Timestamp,
        previous_block_time: Timestamp,
    ) -> Duration {
        let rounds = timeout.round.as_u32().unwrap_or(0);

        match timeout.kind {
            TimeoutKind::Propose => {
                let linear = self.linear(TimeoutKind::Propose, rounds);
                let pbts = proposal_step_waiting_time(now, previous_block_time, &self.timing);
                self.policy.select(linear, pbts)
            }

            TimeoutKind::Prevote | TimeoutKind::Precommit => self.linear(timeout.kind, rounds),

            TimeoutKind::ProposerWait => proposer_wait_time(now, previous_block_time),
        }
    }

    fn linear(&self, kind: TimeoutKind, rounds: u32) -> Duration {
        self.config
            .linear_duration(kind, rounds)
            .unwrap_or(Duration::ZERO)
    }
}

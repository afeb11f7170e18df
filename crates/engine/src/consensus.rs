use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derive_where::derive_where;
use eyre::eyre;
use ractor::rpc::CallResult;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use chronobft_config::{ProposeTimeoutPolicy, TimeoutConfig};
use chronobft_core_driver::{Driver, Input, Output, ThresholdParams};
use chronobft_core_state_machine::state::Step;
use chronobft_core_types::{
    proposer_wait_time, Clock, Context, Height, Proposal, Round, SignedProposal, SignedVote,
    SigningProvider, Timeliness, Timeout, TimeoutKind, TimingParams, Timestamp, Validator,
    ValidatorSet, Validity, Value, Vote,
};
use chronobft_metrics::Metrics;

use crate::error::ConsensusError;
use crate::host::{BuildError, HostMsg, HostRef};
use crate::network::{NetworkMsg, NetworkRef, SignedConsensusMsg};
use crate::store::{PersistedState, StateStore};
use crate::timeouts::Timeouts;
use crate::util::events::{Event, TxEvent};
use crate::util::msg_buffer::MessageBuffer;
use crate::util::timers::{TimeoutElapsed, TimerScheduler};

pub type ConsensusRef<Ctx> = ActorRef<Msg<Ctx>>;

/// Static parameters of the consensus engine of a validator.
#[derive_where(Clone, Debug)]
pub struct ConsensusParams<Ctx: Context> {
    /// The address of this validator
    pub address: Ctx::Address,

    /// The height the driver is created at, before the first `StartHeight`
    pub initial_height: Ctx::Height,

    /// The validator set the driver is created with, before the first `StartHeight`
    pub initial_validator_set: Ctx::ValidatorSet,

    /// Quorum thresholds
    pub threshold_params: ThresholdParams,

    /// Synchrony bounds used to check proposal timeliness
    pub timing: TimingParams,

    /// How the propose timeout is derived from the linear and the PBTS timeouts
    pub propose_timeout_policy: ProposeTimeoutPolicy,
}

/// The consensus actor of a validator.
///
/// Every state transition of the validator happens in [`Actor::handle`],
/// one message at a time.
pub struct Consensus<Ctx>
where
    Ctx: Context,
{
    ctx: Ctx,
    params: ConsensusParams<Ctx>,
    timeout_config: TimeoutConfig,
    clock: Arc<dyn Clock>,
    signing_provider: Box<dyn SigningProvider<Ctx>>,
    network: NetworkRef<Ctx>,
    host: HostRef<Ctx>,
    store: Box<dyn StateStore<Ctx>>,
    metrics: Metrics,
    tx_event: TxEvent<Ctx>,
    span: tracing::Span,
}

pub type ConsensusMsg<Ctx> = Msg<Ctx>;

#[derive_where(Debug)]
pub enum Msg<Ctx: Context> {
    /// Start consensus for the given height with the given validator set,
    /// on top of a block with the given time.
    StartHeight(Ctx::Height, Ctx::ValidatorSet, Timestamp),

    /// Received a proposal from the network
    ReceivedProposal(SignedProposal<Ctx>),

    /// Received a vote from the network
    ReceivedVote(SignedVote<Ctx>),

    /// A timeout has elapsed
    TimeoutElapsed(TimeoutElapsed<TimerKey<Ctx>>),

    /// The host has built a value to propose, or failed to
    ProposeValue(Ctx::Height, Round, Result<Ctx::Value, BuildError>),
}

impl<Ctx: Context> From<TimeoutElapsed<TimerKey<Ctx>>> for Msg<Ctx> {
    fn from(msg: TimeoutElapsed<TimerKey<Ctx>>) -> Self {
        Msg::TimeoutElapsed(msg)
    }
}

/// Timers are keyed by height as well as by round and step,
/// so that a timer left over from a previous height never matches.
pub type TimerKey<Ctx> = (<Ctx as Context>::Height, Timeout);

type Timers<Ctx> = TimerScheduler<TimerKey<Ctx>, Msg<Ctx>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Unstarted,
    Running,
}

/// Maximum number of messages to buffer while consensus is `Unstarted`,
/// or which are for a height we have not reached yet
const MAX_BUFFER_SIZE: usize = 1024;

pub struct State<Ctx: Context> {
    /// Scheduler for timers
    timers: Timers<Ctx>,

    /// Timeout durations
    timeouts: Timeouts,

    /// The driver of the round state machine
    driver: Driver<Ctx>,

    /// The current phase
    phase: Phase,

    /// The time of the last decided block, or the genesis time at the first height
    previous_block_time: Timestamp,

    /// Messages received for a height we have not started yet
    msg_buffer: MessageBuffer<Ctx>,
}

impl<Ctx> State<Ctx>
where
    Ctx: Context,
{
    pub fn height(&self) -> Ctx::Height {
        self.driver.height()
    }

    pub fn round(&self) -> Round {
        self.driver.round()
    }
}

impl<Ctx> Consensus<Ctx>
where
    Ctx: Context,
{
    #[allow(clippy::too_many_arguments)]
    pub async fn spawn(
        ctx: Ctx,
        params: ConsensusParams<Ctx>,
        timeout_config: TimeoutConfig,
        clock: Arc<dyn Clock>,
        signing_provider: Box<dyn SigningProvider<Ctx>>,
        network: NetworkRef<Ctx>,
        host: HostRef<Ctx>,
        store: Box<dyn StateStore<Ctx>>,
        metrics: Metrics,
        tx_event: TxEvent<Ctx>,
        span: tracing::Span,
    ) -> Result<ConsensusRef<Ctx>, ractor::SpawnErr> {
        let node = Self {
            ctx,
            params,
            timeout_config,
            clock,
            signing_provider,
            network,
            host,
            store,
            metrics,
            tx_event,
            span,
        };

        let (actor_ref, _) = Actor::spawn(None, node, ()).await?;
        Ok(actor_ref)
    }

    async fn handle_msg(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        msg: Msg<Ctx>,
    ) -> Result<(), ConsensusError<Ctx>> {
        match msg {
            Msg::StartHeight(height, validator_set, previous_block_time) => {
                self.start_height(myself, state, height, validator_set, previous_block_time)
                    .await
            }

            Msg::ReceivedProposal(proposal) => {
                self.received_proposal(myself, state, proposal).await
            }

            Msg::ReceivedVote(vote) => self.received_vote(myself, state, vote).await,

            Msg::TimeoutElapsed(elapsed) => {
                let Some((height, timeout)) = state.timers.intercept_timer_msg(elapsed) else {
                    // Timer was cancelled or already processed, ignore
                    return Ok(());
                };

                self.timeout_elapsed(myself, state, height, timeout).await
            }

            Msg::ProposeValue(height, round, result) => {
                if height != state.height()
                    || round != state.round()
                    || !state.driver.step_is_propose()
                {
                    debug!(%height, %round, "Ignoring value built for a round we already left");
                    return Ok(());
                }

                match result {
                    Ok(value) => {
                        debug!(%height, %round, value = %value.id(), time = %value.time(), "Proposing value");

                        self.process_input(myself, state, Input::ProposeValue(round, value))
                            .await
                    }
                    Err(e) => {
                        warn!(%height, %round, "Not proposing in this round, failed to build a value: {e}");
                        Ok(())
                    }
                }
            }
        }
    }

    async fn start_height(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        height: Ctx::Height,
        validator_set: Ctx::ValidatorSet,
        previous_block_time: Timestamp,
    ) -> Result<(), ConsensusError<Ctx>> {
        if state.phase == Phase::Running && height <= state.height() {
            warn!(%height, current = %state.height(), "Ignoring request to start a height we already started");
            return Ok(());
        }

        state.timers.cancel_all();
        state.driver.move_to_height(height, validator_set);
        state.previous_block_time = previous_block_time;

        let round = match self.store.load().await? {
            Some(persisted) if persisted.height == height => {
                info!(
                    %height,
                    round = %persisted.round,
                    step = ?persisted.step,
                    "Restoring persisted consensus state"
                );

                state.driver.restore(persisted.locked, persisted.valid);

                // We may have signed a message in that round already,
                // resume in the next one so that we never sign a conflicting one.
                Some(persisted.round.increment())
            }
            _ => None,
        };

        state.phase = Phase::Running;

        let restart = round.is_some();
        let round = round.unwrap_or(Round::ZERO);

        info!(%height, %previous_block_time, restart, "Started new height");

        self.metrics.block_start();
        self.metrics.height.set(height.as_u64() as i64);
        self.tx_event.send(|| Event::StartedHeight(height, restart));

        let input = self.start_round(state, height, round);
        self.process_input(myself, state, input).await
    }

    /// Notify everyone that a new round starts and produce the input which starts it.
    fn start_round(&self, state: &mut State<Ctx>, height: Ctx::Height, round: Round) -> Input<Ctx> {
        state.timers.cancel_all();

        let proposer = self
            .ctx
            .select_proposer(state.driver.validator_set(), height, round)
            .address()
            .clone();

        info!(%height, %round, %proposer, "Starting new round");

        self.metrics.round.set(round.as_i64());
        self.tx_event.send(|| Event::NewRound(height, round));

        let started = HostMsg::StartedRound {
            height,
            round,
            proposer: proposer.clone(),
        };

        if let Err(e) = self.host.cast(started) {
            warn!(%height, %round, "Failed to notify host of new round: {e}");
        }

        Input::NewRound(height, round, proposer)
    }

    async fn received_proposal(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        proposal: SignedProposal<Ctx>,
    ) -> Result<(), ConsensusError<Ctx>> {
        let (height, round) = (proposal.height(), proposal.round());
        let address = proposal.validator_address().clone();

        if height < state.height() {
            return Err(ConsensusError::StaleMessage {
                height,
                current: state.height(),
            });
        }

        if height > state.height() {
            state.msg_buffer.buffer(Msg::ReceivedProposal(proposal));
            return Ok(());
        }

        let validator_set = state.driver.validator_set();

        let Some(validator) = validator_set.get_by_address(&address) else {
            return Err(ConsensusError::UnknownValidator(address));
        };

        if !self.signing_provider.verify_signed_proposal(
            &proposal.message,
            &proposal.signature,
            validator.public_key(),
        ) {
            return Err(ConsensusError::InvalidSignature(address));
        }

        let proposer = self.ctx.select_proposer(validator_set, height, round);
        if proposer.address() != &address {
            return Err(ConsensusError::UnexpectedProposer { address, round });
        }

        let receipt_time = self.clock.now();
        let value = proposal.value().clone();
        let value_id = value.id();

        // A block is never older than the one before it
        let validity = match self.validate_value(height, round, value.clone()).await {
            Validity::Valid if value.time() >= state.previous_block_time => Validity::Valid,
            _ => Validity::Invalid,
        };

        let (timing, previous) = (&self.params.timing, state.previous_block_time);
        let check = if round == Round::new(0) && proposal.pol_round().is_nil() {
            timing.check_first_round_timeliness(value.time(), receipt_time, previous)
        } else {
            timing.check_timeliness(value.time(), receipt_time, previous)
        };

        let timeliness = match check {
            Ok(()) => Timeliness::Timely,
            Err(reason) => {
                // Not an error for us, we just prevote nil
                let error = ConsensusError::<Ctx>::UntimelyProposal(reason);
                warn!(%height, %round, %address, value = %value_id, "{error}");

                self.metrics.untimely_proposals.inc();
                self.tx_event
                    .send(|| Event::UntimelyProposal(height, round, reason));

                Timeliness::Untimely
            }
        };

        debug!(
            %height, %round, %address, value = %value_id, %receipt_time, ?validity, ?timeliness,
            "Received proposal"
        );

        self.tx_event
            .send(|| Event::CompleteProposal(height, round, value_id, receipt_time));

        let evidence_before = proposal_evidence_count(state, &address);

        self.process_input(myself, state, Input::Proposal(proposal, validity, timeliness))
            .await?;

        if proposal_evidence_count(state, &address) > evidence_before {
            if let Some(double) = state
                .driver
                .proposal_evidence()
                .get(&address)
                .and_then(|evidence| evidence.last())
            {
                self.metrics.equivocations.inc();
                self.tx_event
                    .send(|| Event::EquivocatingProposal(double.clone()));
            }

            return Err(ConsensusError::Equivocation(address));
        }

        Ok(())
    }

    async fn received_vote(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        vote: SignedVote<Ctx>,
    ) -> Result<(), ConsensusError<Ctx>> {
        let height = vote.height();
        let address = vote.validator_address().clone();

        if height < state.height() {
            return Err(ConsensusError::StaleMessage {
                height,
                current: state.height(),
            });
        }

        if height > state.height() {
            state.msg_buffer.buffer(Msg::ReceivedVote(vote));
            return Ok(());
        }

        let Some(validator) = state.driver.validator_set().get_by_address(&address) else {
            return Err(ConsensusError::UnknownValidator(address));
        };

        if !self.signing_provider.verify_signed_vote(
            &vote.message,
            &vote.signature,
            validator.public_key(),
        ) {
            return Err(ConsensusError::InvalidSignature(address));
        }

        debug!(
            %height, round = %vote.round(), %address, kind = ?vote.vote_type(), value = ?vote.value(),
            "Received vote"
        );

        let evidence_before = vote_evidence_count(state, &address);

        self.process_input(myself, state, Input::Vote(vote)).await?;

        if vote_evidence_count(state, &address) > evidence_before {
            if let Some(double) = state
                .driver
                .votes()
                .evidence()
                .get(&address)
                .and_then(|evidence| evidence.last())
            {
                self.metrics.equivocations.inc();
                self.tx_event.send(|| Event::EquivocatingVote(double.clone()));
            }

            return Err(ConsensusError::Equivocation(address));
        }

        Ok(())
    }

    async fn timeout_elapsed(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        height: Ctx::Height,
        timeout: Timeout,
    ) -> Result<(), ConsensusError<Ctx>> {
        if height != state.height() || timeout.round != state.round() {
            debug!(%height, %timeout, "Ignoring timeout for a round we already left");
            return Ok(());
        }

        if timeout.kind == TimeoutKind::ProposerWait {
            if !state.driver.step_is_propose() {
                return Ok(());
            }

            return self.get_value(myself, state, height, timeout.round);
        }

        if state.driver.step_is_commit() {
            return Ok(());
        }

        info!(%height, round = %timeout.round, step = ?timeout.kind, "Timeout elapsed");

        self.metrics.timeouts_elapsed.inc();
        self.tx_event.send(|| Event::TimeoutElapsed(height, timeout));

        self.process_input(myself, state, Input::TimeoutElapsed(timeout))
            .await
    }

    /// Feed an input to the driver, then act on its outputs,
    /// feeding back the inputs they produce until there are none left.
    async fn process_input(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        input: Input<Ctx>,
    ) -> Result<(), ConsensusError<Ctx>> {
        let mut inputs = VecDeque::from([input]);

        while let Some(input) = inputs.pop_front() {
            let step = state.driver.step();

            let outputs = state.driver.process(input)?;

            self.track_step(step, state.driver.step());

            for output in outputs {
                if let Some(input) = self.handle_output(myself, state, output).await? {
                    inputs.push_back(input);
                }
            }
        }

        if !state.driver.step_is_propose() {
            let height = state.height();
            let round = state.round();

            state.timers.cancel(&(height, Timeout::propose(round)));
            state.timers.cancel(&(height, Timeout::proposer_wait(round)));
        }

        Ok(())
    }

    fn track_step(&self, before: Step, after: Step) {
        if before != after {
            self.metrics.step_end(before);
            self.metrics.step_start(after);
        }
    }

    async fn handle_output(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        output: Output<Ctx>,
    ) -> Result<Option<Input<Ctx>>, ConsensusError<Ctx>> {
        match output {
            Output::NewRound(height, round) => Ok(Some(self.start_round(state, height, round))),

            Output::Propose(proposal) => {
                let (height, round) = (proposal.height(), proposal.round());

                let start = Instant::now();
                let signed = self.signing_provider.sign_proposal(proposal)?;
                self.metrics
                    .signature_signing_time
                    .observe(start.elapsed().as_secs_f64());

                self.persist(state).await?;
                self.publish(SignedConsensusMsg::Proposal(signed.clone()));

                let value_id = signed.value().id();
                let now = self.clock.now();

                info!(%height, %round, value = %value_id, time = %signed.value().time(), "Proposed value");

                self.tx_event
                    .send(|| Event::CompleteProposal(height, round, value_id, now));

                Ok(Some(Input::Proposal(
                    signed,
                    Validity::Valid,
                    Timeliness::Timely,
                )))
            }

            Output::Vote(vote) => {
                let vote = vote.stamp(self.clock.now());

                let start = Instant::now();
                let signed = self.signing_provider.sign_vote(vote)?;
                self.metrics
                    .signature_signing_time
                    .observe(start.elapsed().as_secs_f64());

                self.persist(state).await?;
                self.publish(SignedConsensusMsg::Vote(signed.clone()));

                debug!(
                    height = %signed.height(), round = %signed.round(), kind = ?signed.vote_type(),
                    value = ?signed.value(), time = %signed.timestamp(),
                    "Voted"
                );

                self.tx_event.send(|| Event::Vote(signed.clone()));

                Ok(Some(Input::Vote(signed)))
            }

            Output::Decide(round, proposal) => {
                self.decide(myself, state, round, proposal)?;
                Ok(None)
            }

            Output::ScheduleTimeout(timeout) => {
                let height = state.height();
                let duration = state.timeouts.duration_for(
                    timeout,
                    self.clock.now(),
                    state.previous_block_time,
                );

                debug!(%height, %timeout, ?duration, "Scheduling timeout");

                state.timers.start_timer((height, timeout), duration);
                Ok(None)
            }

            Output::GetValue(height, round, _timeout) => {
                self.get_value(myself, state, height, round)?;
                Ok(None)
            }
        }
    }

    /// Ask the host for a value to propose, once local time has passed the previous block time.
    fn get_value(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        height: Ctx::Height,
        round: Round,
    ) -> Result<(), ConsensusError<Ctx>> {
        let now = self.clock.now();
        let wait = proposer_wait_time(now, state.previous_block_time);

        if wait > Duration::ZERO {
            debug!(%height, %round, ?wait, "Waiting for the previous block time to pass before proposing");

            self.metrics.proposer_waited(wait);
            state
                .timers
                .start_timer((height, Timeout::proposer_wait(round)), wait);

            return Ok(());
        }

        let timeout =
            state
                .timeouts
                .duration_for(Timeout::propose(round), now, state.previous_block_time);

        let host = self.host.clone();
        let myself = myself.clone();

        // Building a value can take a while, do not hold up the consensus loop
        tokio::spawn(async move {
            let result = host
                .call(
                    |reply_to| HostMsg::GetValue {
                        height,
                        round,
                        time: now,
                        timeout,
                        reply_to,
                    },
                    Some(timeout),
                )
                .await;

            let value = match result {
                Ok(CallResult::Success(value)) => value,
                Ok(CallResult::Timeout) => Err(BuildError::Timeout(timeout)),
                Ok(CallResult::SenderError) => {
                    Err(BuildError::Unavailable("host dropped the request".to_string()))
                }
                Err(e) => Err(BuildError::Unavailable(e.to_string())),
            };

            if let Err(e) = myself.cast(Msg::ProposeValue(height, round, value)) {
                error!(%height, %round, "Failed to send built value to consensus: {e}");
            }
        });

        Ok(())
    }

    async fn validate_value(&self, height: Ctx::Height, round: Round, value: Ctx::Value) -> Validity {
        let timeout = self.timeout_config.timeout_propose;

        let result = self
            .host
            .call(
                |reply_to| HostMsg::ValidateValue {
                    height,
                    round,
                    value,
                    reply_to,
                },
                Some(timeout),
            )
            .await;

        match result {
            Ok(CallResult::Success(validity)) => validity,
            Ok(CallResult::Timeout) => {
                warn!(%height, %round, "Host did not validate the proposed value in time");
                Validity::Invalid
            }
            Ok(CallResult::SenderError) => {
                warn!(%height, %round, "Host dropped the validation request");
                Validity::Invalid
            }
            Err(e) => {
                warn!(%height, %round, "Failed to ask host to validate the proposed value: {e}");
                Validity::Invalid
            }
        }
    }

    fn decide(
        &self,
        myself: &ActorRef<Msg<Ctx>>,
        state: &mut State<Ctx>,
        round: Round,
        proposal: Ctx::Proposal,
    ) -> Result<(), ConsensusError<Ctx>> {
        let height = state.height();
        let value = proposal.take_value();
        let (value_id, time) = (value.id(), value.time());

        state.timers.cancel_all();

        info!(%height, %round, value = %value_id, %time, "Decided");

        self.metrics.decisions.inc();
        self.metrics.decision_round.observe(round.as_i64() as f64);
        self.metrics.block_end();

        self.tx_event.send(|| Event::NewBlock(height, value_id, time));

        if let Err(e) = self.host.cast(HostMsg::Decided {
            height,
            round,
            value,
        }) {
            warn!(%height, %round, "Failed to notify host of decision: {e}");
        }

        let validator_set = state.driver.validator_set().clone();

        myself
            .cast(Msg::StartHeight(height.increment(), validator_set, time))
            .map_err(|e| ConsensusError::Messaging {
                actor: "consensus",
                reason: e.to_string(),
            })
    }

    /// Durably store our state before any message is published.
    async fn persist(&self, state: &State<Ctx>) -> Result<(), ConsensusError<Ctx>> {
        let persisted = PersistedState {
            height: state.height(),
            round: state.round(),
            step: state.driver.step(),
            locked: state.driver.locked_value().cloned(),
            valid: state.driver.valid_value().cloned(),
        };

        self.store.persist(&persisted).await?;
        Ok(())
    }

    fn publish(&self, msg: SignedConsensusMsg<Ctx>) {
        let height = msg.height();

        if let Err(e) = self.network.cast(NetworkMsg::Publish(msg)) {
            warn!(%height, "Failed to publish message: {e}");
        }
    }

    /// Log an error, and turn it into an actor failure if it is fatal.
    fn handle_error(&self, error: ConsensusError<Ctx>) -> Result<(), ActorProcessingErr> {
        match &error {
            e if e.is_fatal() => {
                error!("Halting consensus: {e}");
                return Err(eyre!("Consensus halted: {e}").into());
            }
            ConsensusError::StaleMessage { .. } => debug!("Dropping message: {error}"),
            ConsensusError::Driver(_) | ConsensusError::Messaging { .. } => error!("{error}"),
            _ => warn!("{error}"),
        }

        Ok(())
    }
}

fn proposal_evidence_count<Ctx: Context>(state: &State<Ctx>, address: &Ctx::Address) -> usize {
    state
        .driver
        .proposal_evidence()
        .get(address)
        .map_or(0, |evidence| evidence.len())
}

fn vote_evidence_count<Ctx: Context>(state: &State<Ctx>, address: &Ctx::Address) -> usize {
    state
        .driver
        .votes()
        .evidence()
        .get(address)
        .map_or(0, |evidence| evidence.len())
}

#[async_trait]
impl<Ctx> Actor for Consensus<Ctx>
where
    Ctx: Context,
{
    type Msg = Msg<Ctx>;
    type State = State<Ctx>;
    type Arguments = ();

    #[tracing::instrument(
        name = "consensus",
        parent = &self.span,
        skip_all,
    )]
    async fn pre_start(
        &self,
        myself: ActorRef<Msg<Ctx>>,
        _args: (),
    ) -> Result<State<Ctx>, ActorProcessingErr> {
        info!("Consensus is starting");

        let driver = Driver::new(
            self.params.initial_height,
            self.params.initial_validator_set.clone(),
            self.params.address.clone(),
            self.params.threshold_params,
        );

        let timeouts = Timeouts::new(
            self.timeout_config,
            self.params.propose_timeout_policy,
            self.params.timing,
        );

        Ok(State {
            timers: Timers::new(myself),
            timeouts,
            driver,
            phase: Phase::Unstarted,
            previous_block_time: Timestamp::UNIX_EPOCH,
            msg_buffer: MessageBuffer::new(MAX_BUFFER_SIZE),
        })
    }

    #[tracing::instrument(
        name = "consensus",
        parent = &self.span,
        skip_all,
        fields(
            height = %span_position(state, &msg).0,
            round = %span_position(state, &msg).1
        )
    )]
    async fn handle(
        &self,
        myself: ActorRef<Msg<Ctx>>,
        msg: Msg<Ctx>,
        state: &mut State<Ctx>,
    ) -> Result<(), ActorProcessingErr> {
        if state.phase != Phase::Running && should_buffer(&msg) {
            state.msg_buffer.buffer(msg);
            return Ok(());
        }

        let started_height = matches!(msg, Msg::StartHeight(..));

        if let Err(e) = self.handle_msg(&myself, state, msg).await {
            self.handle_error(e)?;
        }

        if started_height && state.phase == Phase::Running && !state.msg_buffer.is_empty() {
            let buffered = state.msg_buffer.drain();

            info!(count = %buffered.len(), "Replaying buffered messages");

            for msg in buffered {
                if let Err(e) = self.handle_msg(&myself, state, msg).await {
                    self.handle_error(e)?;
                }
            }
        }

        Ok(())
    }

    #[tracing::instrument(
        name = "consensus",
        parent = &self.span,
        skip_all,
        fields(
            height = %state.height(),
            round = %state.round()
        )
    )]
    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut State<Ctx>,
    ) -> Result<(), ActorProcessingErr> {
        info!("Consensus has stopped");
        state.timers.cancel_all();
        Ok(())
    }
}

fn should_buffer<Ctx: Context>(msg: &Msg<Ctx>) -> bool {
    matches!(msg, Msg::ReceivedProposal(..) | Msg::ReceivedVote(..))
}

/// Height and round to record in the span of a message.
///
/// A `StartHeight` message belongs to the height it starts, at round 0.
fn span_position<Ctx: Context>(state: &State<Ctx>, msg: &Msg<Ctx>) -> (Ctx::Height, Round) {
    match msg {
        Msg::StartHeight(height, _, _) => (*height, Round::ZERO),
        _ => (state.height(), state.round()),
    }
}

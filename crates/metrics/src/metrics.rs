use std::fmt::{self, Write};
use std::ops::Deref;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, linear_buckets, Histogram};

use chronobft_core_state_machine::state::Step;

use crate::SharedRegistry;

/// Consensus metrics of one node, cheap to clone and share with its actors.
#[derive(Clone, Debug)]
pub struct Metrics(Arc<Instruments>);

impl Deref for Metrics {
    type Target = Instruments;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Labels of the per step histogram.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StepLabel {
    step: StepName,
}

impl StepLabel {
    pub fn new(step: Step) -> Self {
        Self {
            step: StepName(step),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct StepName(Step);

impl EncodeLabelValue for StepName {
    fn encode(&self, encoder: &mut LabelValueEncoder) -> Result<(), fmt::Error> {
        write!(encoder, "{:?}", self.0)
    }
}

/// Registers every listed instrument under the consensus prefix, with its help text.
macro_rules! register_all {
    ($registry:expr, $metrics:expr, { $($field:ident => $help:literal),+ $(,)? }) => {
        $registry.with_prefix("chronobft_consensus", |registry| {
            $(registry.register(stringify!($field), $help, $metrics.$field.clone());)+
        })
    };
}

#[derive(Debug)]
pub struct Instruments {
    pub height: Gauge,
    pub round: Gauge,
    pub decisions: Counter,

    /// From the start of a height to its decision, in seconds
    pub time_per_block: Histogram,
    pub time_per_step: Family<StepLabel, Histogram>,
    pub decision_round: Histogram,

    /// How long a proposer held back to respect the previous block time, in seconds
    pub proposer_wait_time: Histogram,
    pub untimely_proposals: Counter,
    pub equivocations: Counter,
    pub timeouts_elapsed: Counter,
    pub signature_signing_time: Histogram,

    block_started: Mutex<Option<Instant>>,
    step_started: Mutex<Option<(Step, Instant)>>,
}

impl Metrics {
    pub fn new() -> Self {
        let seconds = || Histogram::new(linear_buckets(0.0, 0.1, 20));
        let short_seconds = |count| Histogram::new(exponential_buckets(0.001, 2.0, count));

        Self(Arc::new(Instruments {
            height: Gauge::default(),
            round: Gauge::default(),
            decisions: Counter::default(),
            time_per_block: seconds(),
            time_per_step: Family::new_with_constructor(seconds),
            decision_round: Histogram::new(linear_buckets(0.0, 1.0, 20)),
            proposer_wait_time: short_seconds(14),
            untimely_proposals: Counter::default(),
            equivocations: Counter::default(),
            timeouts_elapsed: Counter::default(),
            signature_signing_time: short_seconds(10),
            block_started: Mutex::new(None),
            step_started: Mutex::new(None),
        }))
    }

    /// Create the metrics of a node and register them in its registry.
    pub fn register(registry: &SharedRegistry) -> Self {
        let metrics = Self::new();

        register_all!(registry, metrics, {
            height => "Current height",
            round => "Current round",
            decisions => "Number of decided blocks",
            time_per_block => "Time taken to decide a block, in seconds",
            time_per_step => "Time spent in each step of a round, in seconds",
            decision_round => "Round at which each block was decided",
            proposer_wait_time => "Time the proposer waited for the previous block time to pass, in seconds",
            untimely_proposals => "Number of proposals received outside of the timeliness bounds",
            equivocations => "Number of conflicting votes or proposals received",
            timeouts_elapsed => "Number of round step timeouts which elapsed",
            signature_signing_time => "Time taken to sign a proposal or vote, in seconds",
        });

        metrics
    }

    pub fn block_start(&self) {
        *lock(&self.block_started) = Some(Instant::now());
    }

    pub fn block_end(&self) {
        if let Some(started) = lock(&self.block_started).take() {
            self.time_per_block.observe(started.elapsed().as_secs_f64());
        }
    }

    pub fn step_start(&self, step: Step) {
        *lock(&self.step_started) = Some((step, Instant::now()));
    }

    /// Observe the time spent in `step`, if it is the last one started.
    pub fn step_end(&self, step: Step) {
        let mut started = lock(&self.step_started);

        if let Some((_, at)) = started.take_if(|(current, _)| *current == step) {
            self.time_per_step
                .get_or_create(&StepLabel::new(step))
                .observe(at.elapsed().as_secs_f64());
        }
    }

    pub fn proposer_waited(&self, wait: Duration) {
        self.proposer_wait_time.observe(wait.as_secs_f64());
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

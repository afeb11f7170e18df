use core::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chronobft_core_types::{TimeoutKind, TimingParams};
use serde::{Deserialize, Serialize};

/// Lowercase names, as accepted in the configuration file and in `RUST_LOG` directives.
macro_rules! named_variants {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", $what)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Errors raised when loading or validating the configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid timing parameters: {0}")]
    InvalidTiming(&'static str),
}

/// Node configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Consensus configuration options
    pub consensus: ConsensusConfig,

    /// Log configuration options
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration options
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load the configuration from the given TOML file,
    /// with overrides from `CHRONOBFT__*` environment variables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("CHRONOBFT").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.timing.validate()
    }
}

/// Consensus configuration options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Synchrony parameters of the network
    pub timing: TimingConfig,

    /// Timeouts
    #[serde(flatten)]
    pub timeouts: TimeoutConfig,

    /// Which bound governs the propose step timeout
    #[serde(default)]
    pub propose_timeout_policy: ProposeTimeoutPolicy,
}

/// Synchrony parameters, shared by all validators of the chain
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Maximum clock difference between two correct validators
    #[serde(with = "humantime_serde")]
    pub precision: Duration,

    /// Maximum delay for a proposal to reach a correct validator
    #[serde(with = "humantime_serde")]
    pub message_delay: Duration,
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision.is_zero() {
            return Err(ConfigError::InvalidTiming("precision must be positive"));
        }

        if self.message_delay.is_zero() {
            return Err(ConfigError::InvalidTiming("message delay must be positive"));
        }

        Ok(())
    }

    pub fn params(&self) -> TimingParams {
        TimingParams::new(self.precision, self.message_delay)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            precision: Duration::from_millis(500),
            message_delay: Duration::from_secs(2),
        }
    }
}

impl From<TimingConfig> for TimingParams {
    fn from(config: TimingConfig) -> Self {
        config.params()
    }
}

/// How the duration of the propose step timeout is computed for a round.
///
/// - `Linear`: `timeout_propose + round * timeout_propose_delta`
/// - `Pbts`: time left until `previous_block_time + precision + message_delay`
/// - `Max`: the larger of the two
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposeTimeoutPolicy {
    #[default]
    Max,
    Linear,
    Pbts,
}

impl ProposeTimeoutPolicy {
    pub fn select(&self, linear: Duration, pbts: Duration) -> Duration {
        match self {
            Self::Max => linear.max(pbts),
            Self::Linear => linear,
            Self::Pbts => pbts,
        }
    }
}

named_variants!(ProposeTimeoutPolicy, "propose timeout policy", {
    Max => "max",
    Linear => "linear",
    Pbts => "pbts",
});

/// Per step timeouts. Each one grows by its `_delta` with every round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Wait for a proposal before prevoting nil
    #[serde(with = "humantime_serde")]
    pub timeout_propose: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout_propose_delta: Duration,

    /// Wait after a quorum of prevotes for different values before precommitting nil
    #[serde(with = "humantime_serde")]
    pub timeout_prevote: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout_prevote_delta: Duration,

    /// Wait after a quorum of precommits for different values before moving to the next round
    #[serde(with = "humantime_serde")]
    pub timeout_precommit: Duration,

    #[serde(with = "humantime_serde")]
    pub timeout_precommit_delta: Duration,
}

impl TimeoutConfig {
    /// Base and per round increment of a step timeout.
    ///
    /// The proposer wait has neither, it lasts until the previous block time is reached.
    fn step(&self, kind: TimeoutKind) -> Option<(Duration, Duration)> {
        match kind {
            TimeoutKind::Propose => Some((self.timeout_propose, self.timeout_propose_delta)),
            TimeoutKind::Prevote => Some((self.timeout_prevote, self.timeout_prevote_delta)),
            TimeoutKind::Precommit => Some((self.timeout_precommit, self.timeout_precommit_delta)),
            TimeoutKind::ProposerWait => None,
        }
    }

    pub fn timeout_duration(&self, kind: TimeoutKind) -> Option<Duration> {
        self.step(kind).map(|(base, _)| base)
    }

    pub fn delta_duration(&self, kind: TimeoutKind) -> Option<Duration> {
        self.step(kind).map(|(_, delta)| delta)
    }

    /// `timeout + rounds * delta`, saturating.
    pub fn linear_duration(&self, kind: TimeoutKind, rounds: u32) -> Option<Duration> {
        let (base, delta) = self.step(kind)?;
        Some(base.saturating_add(delta.saturating_mul(rounds)))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        let half_second = Duration::from_millis(500);

        Self {
            timeout_propose: Duration::from_secs(3),
            timeout_propose_delta: half_second,
            timeout_prevote: Duration::from_secs(1),
            timeout_prevote_delta: half_second,
            timeout_precommit: Duration::from_secs(1),
            timeout_precommit_delta: half_second,
        }
    }
}

/// Where an embedding node should expose the Prometheus registry.
///
/// Nothing in this workspace serves it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 9000),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

named_variants!(LogLevel, "log level", {
    Trace => "trace",
    Debug => "debug",
    Info => "info",
    Warn => "warn",
    Error => "error",
});

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plaintext,
    Json,
}

named_variants!(LogFormat, "log format", {
    Plaintext => "plaintext",
    Json => "json",
});

mod metrics;
mod registry;

pub use metrics::{Instruments, Metrics, StepLabel};
pub use registry::{export, SharedRegistry};

pub use prometheus_client::metrics::counter::Counter;
pub use prometheus_client::metrics::gauge::Gauge;
pub use prometheus_client::metrics::histogram::{exponential_buckets, linear_buckets, Histogram};
pub use prometheus_client::registry::Registry;

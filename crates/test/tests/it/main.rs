
use std::time::Duration;

use chronobft_config::{LogFormat, LogLevel};

pub fn init_logging() {
    chronobft_test::logging::init(LogLevel::Debug, LogFormat::Plaintext);
}

pub const fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

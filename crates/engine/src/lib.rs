// For coverage on nightly
#![allow(unexpected_cfgs)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod clock;
pub mod consensus;
pub mod error;
pub mod host;
pub mod network;
pub mod store;
pub mod timeouts;
pub mod util;

// Library for tests to access modules

pub mod config;
pub mod error;
pub mod listener;
pub mod models;
pub mod rate;
pub mod render;
pub mod scheduler;
pub mod setup;
pub mod units;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core configuration and utilities for the Skillexa client sync engine.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_API_URL, DEFAULT_LOG_LEVEL, DEFAULT_POLL_INTERVAL_SECS};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;

//! Shared utilities for tomo.
//!
//! - Logging setup with tracing
//! - Layered configuration (defaults, config files, environment)

pub mod config;
pub mod error;
pub mod log;

pub use config::{AuthConfig, Config, ServerConfig};
pub use error::{ConfigError, ConfigResult};
pub use log::{LogConfig, LogLevel};

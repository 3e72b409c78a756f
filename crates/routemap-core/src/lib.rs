//! # routemap-core
//!
//! Configuration foundation shared by the routemap crates: the configuration
//! trait implemented by every component config, where each value came from,
//! and the errors raised while loading and validating it.

pub mod config;

pub use config::validation::{parse_bool_flag, ConfigError};
pub use config::{env_or_default, AppConfigTrait, ConfigSource, Environment};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! # Logging setup
//!
//! `tracing-subscriber` configuration for binaries and demos that build a
//! mapping table. Library code only emits `tracing` events; nothing here runs
//! unless the application calls [`init_logging`].

use routemap_core::Environment;
use serde_json::{json, Value};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Enable pretty printing for development
    pub pretty_print: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Custom fields logged with the initialization event
    pub global_fields: serde_json::Map<String, Value>,
    /// Environment filter (e.g. "routemap=debug,axum=info")
    pub env_filter: Option<String>,
    /// Service name logged with the initialization event
    pub service_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: true,
            include_location: false,
            global_fields: serde_json::Map::new(),
            env_filter: None,
            service_name: None,
        }
    }
}

impl LoggingConfig {
    /// Create production logging configuration
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            pretty_print: false,
            include_location: false,
            global_fields: env_field("production"),
            env_filter: Some("routemap=info,axum=warn".to_string()),
            service_name: None,
        }
    }

    /// Create development logging configuration
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            pretty_print: true,
            include_location: true,
            global_fields: env_field("development"),
            env_filter: Some("routemap=debug,axum=debug".to_string()),
            service_name: None,
        }
    }

    /// Create test logging configuration (minimal output)
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            global_fields: env_field("test"),
            env_filter: Some("routemap=error".to_string()),
            service_name: None,
        }
    }

    /// Preset matching the application environment
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => Self::development(),
            Environment::Testing => Self::test(),
            Environment::Production => Self::production(),
        }
    }

    /// Add a global field to include with the initialization event
    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_service(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

fn env_field(environment: &str) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("env".to_string(), json!(environment));
    fields
}

/// Install the global subscriber.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.filter_directive()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()?;
    } else if config.pretty_print {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stdout)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .pretty(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stdout))
            .try_init()?;
    }

    let mut init_msg = json!({
        "message": "Logging initialized",
        "level": config.level,
        "format": if config.json_format { "json" } else { "text" },
    });
    if let Some(name) = config.service_name {
        init_msg["service_name"] = json!(name);
    }
    for (key, value) in config.global_fields {
        init_msg[key] = value;
    }
    tracing::info!(target: "routemap::logging", "{}", init_msg);

    Ok(())
}

use std::env;

/// Where a configuration value came from, reported for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
    /// Value provided programmatically
    Programmatic,
}

impl ConfigSource {
    /// Report `EnvVar(var)` when the variable is set, otherwise `Default(default)`
    pub fn detect(var: &str, default: impl Into<String>) -> Self {
        if env::var_os(var).is_some() {
            ConfigSource::EnvVar(var.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }

    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::Programmatic => "Programmatically set".to_string(),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_detect_env_var_source() {
        env::set_var("ROUTEMAP_CORE_SOURCE_TEST", "1");
        let source = ConfigSource::detect("ROUTEMAP_CORE_SOURCE_TEST", "0");
        assert_eq!(source, ConfigSource::EnvVar("ROUTEMAP_CORE_SOURCE_TEST".to_string()));
        assert!(source.is_env_var());
        env::remove_var("ROUTEMAP_CORE_SOURCE_TEST");

        let source = ConfigSource::detect("ROUTEMAP_CORE_SOURCE_TEST", "0");
        assert!(source.is_default());
        assert_eq!(source.to_string(), "Default value: 0");
    }
}

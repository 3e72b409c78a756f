//! Request mapping configuration
//!
//! Provides the settings of the handler mapping, integrating with the
//! routemap-core configuration system.

use super::defaults::MappingDefaults;
use crate::mapping::predicate::HandlerTypePredicate;
use crate::routing::MatchOptions;
use routemap_core::{env_or_default, parse_bool_flag, AppConfigTrait, ConfigError, ConfigSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TRAILING_SLASH_MATCH_VAR: &str = "ROUTEMAP_TRAILING_SLASH_MATCH";
pub const CASE_SENSITIVE_MATCH_VAR: &str = "ROUTEMAP_CASE_SENSITIVE_MATCH";
pub const PATH_PREFIXES_VAR: &str = "ROUTEMAP_PATH_PREFIXES";

/// A path prefix applied to every handler type in a base module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPrefixConfig {
    /// Prefix template, may contain placeholders
    pub prefix: String,
    /// Module path the handler types must live in
    pub base_module: String,
}

impl PathPrefixConfig {
    pub fn new(prefix: impl Into<String>, base_module: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            base_module: base_module.into(),
        }
    }

    /// Parse `prefix=module` entries separated by `;`
    pub fn parse_list(value: &str) -> Result<Vec<Self>, ConfigError> {
        value
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (prefix, base_module) =
                    entry.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
                        field: "path_prefixes".to_string(),
                        value: entry.to_string(),
                        expected: "entries of the form prefix=base::module".to_string(),
                    })?;
                Ok(Self::new(prefix.trim(), base_module.trim()))
            })
            .collect()
    }

    /// Predicate selecting the handler types this prefix applies to
    pub fn predicate(&self) -> HandlerTypePredicate {
        HandlerTypePredicate::for_base_module([self.base_module.clone()])
    }
}

/// Handler mapping configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Match `/users/` against a pattern declared as `/users`
    pub trailing_slash_match: bool,
    /// Compare static path segments case-sensitively
    pub case_sensitive_match: bool,
    /// Prefixes selected by base module, applied after programmatic prefixes
    pub path_prefixes: Vec<PathPrefixConfig>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            trailing_slash_match: MappingDefaults::TRAILING_SLASH_MATCH,
            case_sensitive_match: MappingDefaults::CASE_SENSITIVE_MATCH,
            path_prefixes: Vec::new(),
        }
    }
}

impl AppConfigTrait for MappingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let trailing_slash_match = parse_bool_flag(
            "trailing_slash_match",
            &env_or_default(
                TRAILING_SLASH_MATCH_VAR,
                &MappingDefaults::TRAILING_SLASH_MATCH.to_string(),
            ),
        )?;

        let case_sensitive_match = parse_bool_flag(
            "case_sensitive_match",
            &env_or_default(
                CASE_SENSITIVE_MATCH_VAR,
                &MappingDefaults::CASE_SENSITIVE_MATCH.to_string(),
            ),
        )?;

        let path_prefixes = PathPrefixConfig::parse_list(&env_or_default(
            PATH_PREFIXES_VAR,
            MappingDefaults::PATH_PREFIXES,
        ))?;

        let config = MappingConfig {
            trailing_slash_match,
            case_sensitive_match,
            path_prefixes,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for prefix in &self.path_prefixes {
            if prefix.prefix.is_empty()
                || !(prefix.prefix.starts_with('/') || prefix.prefix.starts_with("${"))
            {
                return Err(ConfigError::validation_failed(format!(
                    "Path prefix '{}' must start with '/' or a placeholder",
                    prefix.prefix
                )));
            }

            if prefix.base_module.is_empty() {
                return Err(ConfigError::validation_failed(format!(
                    "Path prefix '{}' must name a base module",
                    prefix.prefix
                )));
            }
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "trailing_slash_match".to_string(),
            ConfigSource::detect(
                TRAILING_SLASH_MATCH_VAR,
                MappingDefaults::TRAILING_SLASH_MATCH.to_string(),
            ),
        );
        sources.insert(
            "case_sensitive_match".to_string(),
            ConfigSource::detect(
                CASE_SENSITIVE_MATCH_VAR,
                MappingDefaults::CASE_SENSITIVE_MATCH.to_string(),
            ),
        );
        sources.insert(
            "path_prefixes".to_string(),
            ConfigSource::detect(PATH_PREFIXES_VAR, MappingDefaults::PATH_PREFIXES),
        );
        sources
    }
}

impl MappingConfig {
    /// Options used when matching request paths against patterns
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            trailing_slash_match: self.trailing_slash_match,
            case_sensitive: self.case_sensitive_match,
        }
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>, base_module: impl Into<String>) -> Self {
        self.path_prefixes.push(PathPrefixConfig::new(prefix, base_module));
        self
    }
}

//! Embedded value resolution for `${...}` placeholders in path patterns

use crate::errors::{MappingError, MappingResult};
use std::collections::HashMap;

const PLACEHOLDER_PREFIX: &str = "${";
const PLACEHOLDER_SUFFIX: char = '}';
const VALUE_SEPARATOR: char = ':';

/// Resolves placeholders embedded in annotation values
pub trait EmbeddedValueResolver: Send + Sync {
    fn resolve_string_value(&self, value: &str) -> MappingResult<String>;
}

impl<F> EmbeddedValueResolver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn resolve_string_value(&self, value: &str) -> MappingResult<String> {
        Ok(self(value))
    }
}

/// Resolves `${key}` and `${key:default}` against a property map.
///
/// Placeholders may be nested (`${${env}.prefix}`) and property values may
/// contain placeholders themselves. A property that refers back to itself is
/// reported as [`MappingError::CircularPlaceholder`].
#[derive(Debug, Clone, Default)]
pub struct PropertyPlaceholderResolver {
    properties: HashMap<String, String>,
    ignore_unresolvable: bool,
}

impl PropertyPlaceholderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver backed by the process environment
    pub fn from_env() -> Self {
        Self::default().with_properties(std::env::vars())
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties<K, V>(mut self, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Leave unresolvable placeholders in place instead of failing
    pub fn ignore_unresolvable(mut self, ignore: bool) -> Self {
        self.ignore_unresolvable = ignore;
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    fn parse(&self, value: &str, visiting: &mut Vec<String>) -> MappingResult<String> {
        let mut result = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
            result.push_str(&rest[..start]);
            let body_start = start + PLACEHOLDER_PREFIX.len();
            let Some(end) = find_placeholder_end(&rest[body_start..]) else {
                // Unterminated placeholder stays literal
                result.push_str(&rest[start..]);
                return Ok(result);
            };
            let raw = &rest[body_start..body_start + end];
            let placeholder = self.parse(raw, visiting)?;

            if visiting.contains(&placeholder) {
                return Err(MappingError::CircularPlaceholder { placeholder });
            }

            match self.lookup(&placeholder) {
                Some(found) => {
                    visiting.push(placeholder.clone());
                    let resolved = self.parse(&found, visiting)?;
                    visiting.pop();
                    tracing::trace!(
                        target: "routemap::mapping",
                        "Resolved placeholder '{}' to \"{}\"",
                        placeholder,
                        resolved
                    );
                    result.push_str(&resolved);
                }
                None if self.ignore_unresolvable => {
                    result.push_str(&rest[start..body_start + end + 1]);
                }
                None => return Err(MappingError::unresolvable(placeholder, value)),
            }

            rest = &rest[body_start + end + 1..];
        }

        result.push_str(rest);
        Ok(result)
    }

    fn lookup(&self, placeholder: &str) -> Option<String> {
        if let Some(value) = self.properties.get(placeholder) {
            return Some(value.clone());
        }
        let (key, default) = placeholder.split_once(VALUE_SEPARATOR)?;
        Some(
            self.properties
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string()),
        )
    }
}

/// Index of the suffix closing a placeholder body, honoring nested placeholders
fn find_placeholder_end(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = 0;
    while index < body.len() {
        let tail = &body[index..];
        if tail.starts_with(PLACEHOLDER_PREFIX) {
            depth += 1;
            index += PLACEHOLDER_PREFIX.len();
            continue;
        }
        if tail.starts_with(PLACEHOLDER_SUFFIX) {
            if depth == 0 {
                return Some(index);
            }
            depth -= 1;
        }
        index += tail.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    None
}

impl EmbeddedValueResolver for PropertyPlaceholderResolver {
    fn resolve_string_value(&self, value: &str) -> MappingResult<String> {
        if !value.contains(PLACEHOLDER_PREFIX) {
            return Ok(value.to_string());
        }
        self.parse(value, &mut Vec::new())
    }
}

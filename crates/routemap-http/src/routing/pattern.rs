//! Route pattern parsing and matching for routemap
//!
//! A [`RoutePattern`] is the immutable parsed form of a URL template. Patterns
//! compare, hash and order by their canonical string: a leading slash is
//! prepended when missing and repeated slashes are collapsed.
//!
//! Supported segment syntax:
//! - `users` static text
//! - `{id}` / `{id:int}` variable with optional constraint (`int`, `uuid`,
//!   `alpha`, `slug` or a regex)
//! - `*` exactly one segment
//! - `**`, `*rest` or `{*rest}` the remaining segments (last segment only)

use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during route pattern operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutePatternError {
    #[error("Invalid pattern syntax: {0}")]
    InvalidSyntax(String),
    #[error("Multiple catch-all segments not allowed")]
    MultipleCatchAll,
    #[error("Catch-all must be the last segment")]
    CatchAllNotLast,
    #[error("Invalid constraint syntax: {0}")]
    InvalidConstraint(String),
    #[error("Duplicate parameter name: {0}")]
    DuplicateParameter(String),
}

/// Parameter constraints for validation
#[derive(Debug, Clone)]
pub enum ParamConstraint {
    /// No constraint - any non-empty string
    None,
    /// Must be a valid integer
    Int,
    /// Must be a valid UUID
    Uuid,
    /// Must contain only alphabetic characters
    Alpha,
    /// Must be a valid slug (alphanumeric + hyphens/underscores)
    Slug,
    /// Custom regex pattern, anchored to the whole segment
    Custom(Regex),
}

impl PartialEq for ParamConstraint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamConstraint::None, ParamConstraint::None) => true,
            (ParamConstraint::Int, ParamConstraint::Int) => true,
            (ParamConstraint::Uuid, ParamConstraint::Uuid) => true,
            (ParamConstraint::Alpha, ParamConstraint::Alpha) => true,
            (ParamConstraint::Slug, ParamConstraint::Slug) => true,
            (ParamConstraint::Custom(regex1), ParamConstraint::Custom(regex2)) => {
                regex1.as_str() == regex2.as_str()
            }
            _ => false,
        }
    }
}

impl ParamConstraint {
    /// Parse constraint from string (e.g., "int", "uuid", "alpha")
    pub fn parse(s: &str) -> Result<Self, RoutePatternError> {
        match s {
            "int" => Ok(ParamConstraint::Int),
            "uuid" => Ok(ParamConstraint::Uuid),
            "alpha" => Ok(ParamConstraint::Alpha),
            "slug" => Ok(ParamConstraint::Slug),
            _ => match Regex::new(&format!("^(?:{})$", s)) {
                Ok(regex) => Ok(ParamConstraint::Custom(regex)),
                Err(e) => Err(RoutePatternError::InvalidConstraint(format!(
                    "Invalid regex pattern '{}': {}",
                    s, e
                ))),
            },
        }
    }

    /// Validate a parameter value against this constraint
    pub fn validate(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }

        match self {
            ParamConstraint::None => true,
            ParamConstraint::Int => value.parse::<i64>().is_ok(),
            ParamConstraint::Uuid => uuid::Uuid::parse_str(value).is_ok(),
            ParamConstraint::Alpha => value.chars().all(|c| c.is_alphabetic()),
            ParamConstraint::Slug => value
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_'),
            ParamConstraint::Custom(regex) => regex.is_match(value),
        }
    }
}

/// A single path segment in a route pattern
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Static text segment
    Static(String),
    /// Parameter segment with optional constraint
    Parameter {
        name: String,
        constraint: ParamConstraint,
    },
    /// Any single segment
    Wildcard,
    /// Remaining segments (must be last), captured when named
    CatchAll { name: Option<String> },
}

/// Options applied when matching a request path against a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// `/users/` also matches a pattern declared as `/users`
    pub trailing_slash_match: bool,
    /// Static segments compare case-sensitively
    pub case_sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            trailing_slash_match: true,
            case_sensitive: true,
        }
    }
}

/// Parsed route pattern with compiled segments
#[derive(Debug, Clone)]
pub struct RoutePattern {
    /// Canonical pattern string
    canonical: String,
    /// Parsed path segments
    pub segments: Vec<PathSegment>,
    /// Parameter names in order
    pub param_names: Vec<String>,
    /// Whether this pattern has a catch-all segment
    pub has_catch_all: bool,
    /// Number of static segments (for priority calculation)
    pub static_segments: usize,
    /// Whether the pattern ends with a slash
    pub trailing_slash: bool,
}

/// Canonical form of a pattern string: leading slash, no repeated slashes.
/// The empty string stays empty.
fn normalize(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        return String::new();
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        normalized.push('/');
    }
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c);
    }
    normalized
}

/// Join two path templates without producing double slashes.
///
/// An empty side yields the other side unchanged.
pub fn join_paths(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => String::new(),
        (true, false) => normalize(path),
        (false, true) => normalize(prefix),
        (false, false) => {
            let prefix = prefix.trim_end_matches('/');
            let path = path.trim_start_matches('/');
            if path.is_empty() {
                normalize(prefix)
            } else {
                normalize(&format!("{}/{}", prefix, path))
            }
        }
    }
}

impl RoutePattern {
    /// The empty pattern, used when a mapping declares no path
    pub fn empty() -> Self {
        Self {
            canonical: String::new(),
            segments: Vec::new(),
            param_names: Vec::new(),
            has_catch_all: false,
            static_segments: 0,
            trailing_slash: false,
        }
    }

    /// Parse a route pattern from a path string
    pub fn parse(path: &str) -> Result<Self, RoutePatternError> {
        let canonical = normalize(path);
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut has_catch_all = false;
        let mut static_segments = 0;
        let mut seen_params = HashSet::new();

        let path_segments: Vec<&str> = canonical.split('/').filter(|s| !s.is_empty()).collect();

        for (index, segment) in path_segments.iter().enumerate() {
            let catch_all_name = if *segment == "**" {
                Some(None)
            } else if segment.starts_with("{*") && segment.ends_with('}') {
                Some(Some(&segment[2..segment.len() - 1]))
            } else if segment.starts_with('*') && *segment != "*" {
                Some(Some(&segment[1..]))
            } else {
                None
            };

            if let Some(name) = catch_all_name {
                if has_catch_all {
                    return Err(RoutePatternError::MultipleCatchAll);
                }
                if index != path_segments.len() - 1 {
                    return Err(RoutePatternError::CatchAllNotLast);
                }

                let name = match name {
                    Some(name) if name.is_empty() => {
                        return Err(RoutePatternError::InvalidSyntax(
                            "Catch-all segment must have a name".to_string(),
                        ));
                    }
                    Some(name) => {
                        if !seen_params.insert(name.to_string()) {
                            return Err(RoutePatternError::DuplicateParameter(name.to_string()));
                        }
                        param_names.push(name.to_string());
                        Some(name.to_string())
                    }
                    None => None,
                };

                segments.push(PathSegment::CatchAll { name });
                has_catch_all = true;
            } else if *segment == "*" {
                segments.push(PathSegment::Wildcard);
            } else if segment.starts_with('{') && segment.ends_with('}') {
                // Parameter segment: {name} or {name:constraint}
                let param_def = &segment[1..segment.len() - 1];
                let (name, constraint) = Self::parse_parameter_definition(param_def)?;

                if !seen_params.insert(name.clone()) {
                    return Err(RoutePatternError::DuplicateParameter(name));
                }

                param_names.push(name.clone());
                segments.push(PathSegment::Parameter { name, constraint });
            } else if segment.contains("${") {
                return Err(RoutePatternError::InvalidSyntax(format!(
                    "Unresolved placeholder in segment '{}'",
                    segment
                )));
            } else if segment.contains('{') || segment.contains('}') {
                return Err(RoutePatternError::InvalidSyntax(format!(
                    "Variables must span a whole segment: '{}'",
                    segment
                )));
            } else {
                segments.push(PathSegment::Static(segment.to_string()));
                static_segments += 1;
            }
        }

        let trailing_slash = canonical.len() > 1 && canonical.ends_with('/');

        Ok(RoutePattern {
            canonical,
            segments,
            param_names,
            has_catch_all,
            static_segments,
            trailing_slash,
        })
    }

    /// Parse parameter definition (e.g., "id", "id:int", "slug:alpha")
    fn parse_parameter_definition(
        param_def: &str,
    ) -> Result<(String, ParamConstraint), RoutePatternError> {
        let (name, constraint) = match param_def.split_once(':') {
            Some((name, constraint)) => (name.trim(), Some(constraint.trim())),
            None => (param_def.trim(), None),
        };

        if name.is_empty() {
            return Err(RoutePatternError::InvalidSyntax(
                "Parameter name cannot be empty".to_string(),
            ));
        }

        let constraint = match constraint {
            Some(constraint) => ParamConstraint::parse(constraint)?,
            None => ParamConstraint::None,
        };
        Ok((name.to_string(), constraint))
    }

    /// The canonical pattern string
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Whether this is the empty pattern (no path declared)
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Join `other` behind this pattern
    pub fn combine(&self, other: &RoutePattern) -> Result<RoutePattern, RoutePatternError> {
        RoutePattern::parse(&join_paths(&self.canonical, &other.canonical))
    }

    /// Check if this pattern matches a given path with default options
    pub fn matches(&self, path: &str) -> bool {
        self.matches_with(path, &MatchOptions::default())
    }

    /// Check if this pattern matches a given path
    pub fn matches_with(&self, path: &str, options: &MatchOptions) -> bool {
        self.capture(path, options).is_some()
    }

    /// Extract parameter values from a path that matches this pattern
    pub fn extract_params(&self, path: &str) -> HashMap<String, String> {
        self.capture(path, &MatchOptions::default())
            .unwrap_or_default()
    }

    /// Match `path` and collect the variables, or `None` when it does not match
    pub fn capture(&self, path: &str, options: &MatchOptions) -> Option<HashMap<String, String>> {
        let path_has_trailing_slash = path.len() > 1 && path.ends_with('/');
        if path_has_trailing_slash
            && !self.trailing_slash
            && !self.has_catch_all
            && !options.trailing_slash_match
        {
            return None;
        }
        if self.trailing_slash && !path_has_trailing_slash {
            return None;
        }

        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = HashMap::new();
        let mut path_idx = 0;

        for segment in &self.segments {
            let value = match segment {
                PathSegment::CatchAll { name } => {
                    if let Some(name) = name {
                        params.insert(name.clone(), path_segments[path_idx..].join("/"));
                    }
                    return Some(params);
                }
                _ => path_segments.get(path_idx)?,
            };
            match segment {
                PathSegment::Static(expected) => {
                    let equal = if options.case_sensitive {
                        expected == value
                    } else {
                        expected.eq_ignore_ascii_case(value)
                    };
                    if !equal {
                        return None;
                    }
                }
                PathSegment::Parameter { name, constraint } => {
                    if !constraint.validate(value) {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                }
                PathSegment::Wildcard | PathSegment::CatchAll { .. } => {}
            }
            path_idx += 1;
        }

        (path_idx == path_segments.len()).then_some(params)
    }

    /// Calculate priority for route matching (lower = more specific)
    ///
    /// - Static segment: 1
    /// - Parameter with specific constraint (Int, Uuid): 5
    /// - Parameter with custom regex constraint: 6
    /// - Parameter with general constraint (Alpha, Slug): 8
    /// - Parameter with no constraint: 10
    /// - Single-segment wildcard: 12
    /// - Catch-all segment: 100
    pub fn priority(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Static(_) => 1,
                PathSegment::Parameter { constraint, .. } => match constraint {
                    ParamConstraint::Int | ParamConstraint::Uuid => 5,
                    ParamConstraint::Custom(_) => 6,
                    ParamConstraint::Alpha | ParamConstraint::Slug => 8,
                    ParamConstraint::None => 10,
                },
                PathSegment::Wildcard => 12,
                PathSegment::CatchAll { .. } => 100,
            })
            .sum()
    }

    /// Order two patterns by specificity, most specific first
    pub fn compare_specificity(&self, other: &RoutePattern) -> Ordering {
        self.priority()
            .cmp(&other.priority())
            .then_with(|| other.static_segments.cmp(&self.static_segments))
            .then_with(|| other.canonical.len().cmp(&self.canonical.len()))
    }

    /// Check if this is a static route (no parameters or wildcards)
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|seg| matches!(seg, PathSegment::Static(_)))
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for RoutePattern {}

impl Hash for RoutePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for RoutePattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoutePattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Serialize for RoutePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}

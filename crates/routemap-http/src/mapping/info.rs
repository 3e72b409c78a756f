//! Request mapping information
//!
//! [`RequestMappingInfo`] bundles the six request conditions of one mapping.
//! Infos are immutable values: combining, narrowing and changing the
//! body-required flag always produce a new info.

use super::condition::{
    ConsumesCondition, HeadersCondition, ParamsCondition, PatternsCondition, ProducesCondition,
    RequestCondition, RequestMethodsCondition,
};
use super::request::MatchContext;
use crate::errors::MappingResult;
use crate::routing::HttpMethod;
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Conditions a request must satisfy to be routed to a handler method
#[derive(Debug, Clone, Serialize)]
pub struct RequestMappingInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    patterns: PatternsCondition,
    methods: RequestMethodsCondition,
    params: ParamsCondition,
    headers: HeadersCondition,
    consumes: ConsumesCondition,
    produces: ProducesCondition,
}

impl RequestMappingInfo {
    /// Start building an info for the given path patterns
    pub fn paths<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> RequestMappingInfoBuilder {
        RequestMappingInfoBuilder {
            paths: paths.into_iter().map(Into::into).collect(),
            ..RequestMappingInfoBuilder::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn patterns_condition(&self) -> &PatternsCondition {
        &self.patterns
    }

    pub fn methods_condition(&self) -> &RequestMethodsCondition {
        &self.methods
    }

    pub fn params_condition(&self) -> &ParamsCondition {
        &self.params
    }

    pub fn headers_condition(&self) -> &HeadersCondition {
        &self.headers
    }

    pub fn consumes_condition(&self) -> &ConsumesCondition {
        &self.consumes
    }

    pub fn produces_condition(&self) -> &ProducesCondition {
        &self.produces
    }

    /// Pattern strings of this mapping
    pub fn pattern_strings(&self) -> Vec<String> {
        self.patterns.pattern_strings()
    }

    pub fn is_body_required(&self) -> bool {
        self.consumes.is_body_required()
    }

    /// Same mapping with a different body-required flag
    pub fn with_body_required(&self, body_required: bool) -> Self {
        let mut info = self.clone();
        info.consumes.set_body_required(body_required);
        info
    }

    /// Same mapping with a different name
    pub fn with_name(&self, name: Option<String>) -> Self {
        let mut info = self.clone();
        info.name = name;
        info
    }

    /// Same mapping with every pattern placed behind `prefix`
    pub fn with_prefix(&self, prefix: &str) -> MappingResult<Self> {
        let prefix = PatternsCondition::parse(&[prefix])?;
        let mut info = self.clone();
        info.patterns = prefix.combine(&self.patterns)?;
        Ok(info)
    }

    /// Combine this (type level) info with a method level info
    pub fn combine(&self, other: &RequestMappingInfo) -> MappingResult<Self> {
        let name = match (&self.name, &other.name) {
            (Some(mine), Some(theirs)) => Some(format!("{}#{}", mine, theirs)),
            (mine, theirs) => theirs.clone().or_else(|| mine.clone()),
        };
        Ok(Self {
            name,
            patterns: self.patterns.combine(&other.patterns)?,
            methods: self.methods.combine(&other.methods)?,
            params: self.params.combine(&other.params)?,
            headers: self.headers.combine(&other.headers)?,
            consumes: self.consumes.combine(&other.consumes)?,
            produces: self.produces.combine(&other.produces)?,
        })
    }

    /// Narrow every condition to the request, or `None` if any of them fails
    pub fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        let methods = self.methods.matching_condition(ctx)?;
        let params = self.params.matching_condition(ctx)?;
        let headers = self.headers.matching_condition(ctx)?;
        let consumes = self.consumes.matching_condition(ctx)?;
        let produces = self.produces.matching_condition(ctx)?;
        let patterns = self.patterns.matching_condition(ctx)?;

        Some(Self {
            name: self.name.clone(),
            patterns,
            methods,
            params,
            headers,
            consumes,
            produces,
        })
    }

    /// Order two infos narrowed to the same request; `Less` is the better match
    pub fn compare_to(&self, other: &RequestMappingInfo, ctx: &MatchContext<'_>) -> Ordering {
        // HEAD requests are decided by explicit method declarations first
        if ctx.request.method() == HttpMethod::HEAD {
            let ordering = self.methods.compare_to(&other.methods, ctx);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.patterns
            .compare_to(&other.patterns, ctx)
            .then_with(|| self.params.compare_to(&other.params, ctx))
            .then_with(|| self.headers.compare_to(&other.headers, ctx))
            .then_with(|| self.consumes.compare_to(&other.consumes, ctx))
            .then_with(|| self.produces.compare_to(&other.produces, ctx))
            .then_with(|| self.methods.compare_to(&other.methods, ctx))
    }

    /// JSON rendering for diagnostics
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "patterns": self.patterns,
            "methods": self.methods,
            "params": self.params,
            "headers": self.headers,
            "consumes": self.consumes,
            "produces": self.produces,
            "bodyRequired": self.is_body_required(),
        })
    }
}

impl PartialEq for RequestMappingInfo {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
            && self.methods == other.methods
            && self.params == other.params
            && self.headers == other.headers
            && self.consumes == other.consumes
            && self.produces == other.produces
    }
}

impl Eq for RequestMappingInfo {}

impl Hash for RequestMappingInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.patterns.hash(state);
        self.methods.hash(state);
        self.params.hash(state);
        self.headers.hash(state);
        self.consumes.hash(state);
        self.produces.hash(state);
    }
}

impl std::fmt::Display for RequestMappingInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        if !self.methods.is_empty() {
            write!(f, "{} ", self.methods)?;
        }
        write!(f, "{}", self.patterns)?;
        if !self.params.is_empty() {
            write!(f, ", params {}", self.params)?;
        }
        if !self.headers.is_empty() {
            write!(f, ", headers {}", self.headers)?;
        }
        if !self.consumes.is_empty() {
            write!(f, ", consumes {}", self.consumes)?;
        }
        if !self.produces.is_empty() {
            write!(f, ", produces {}", self.produces)?;
        }
        write!(f, "}}")
    }
}

/// Builder for [`RequestMappingInfo`]
#[derive(Debug, Clone, Default)]
pub struct RequestMappingInfoBuilder {
    paths: Vec<String>,
    methods: Vec<HttpMethod>,
    params: Vec<String>,
    headers: Vec<String>,
    consumes: Vec<String>,
    produces: Vec<String>,
    name: Option<String>,
}

impl RequestMappingInfoBuilder {
    pub fn methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn headers<S: Into<String>>(mut self, headers: impl IntoIterator<Item = S>) -> Self {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn consumes<S: Into<String>>(mut self, consumes: impl IntoIterator<Item = S>) -> Self {
        self.consumes = consumes.into_iter().map(Into::into).collect();
        self
    }

    pub fn produces<S: Into<String>>(mut self, produces: impl IntoIterator<Item = S>) -> Self {
        self.produces = produces.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.is_empty()).then_some(name);
        self
    }

    /// Parse every attribute into its condition
    pub fn build(self) -> MappingResult<RequestMappingInfo> {
        Ok(RequestMappingInfo {
            name: self.name,
            patterns: PatternsCondition::parse(&self.paths)?,
            methods: RequestMethodsCondition::new(self.methods),
            params: ParamsCondition::parse(&self.params)?,
            headers: HeadersCondition::parse(&self.headers)?,
            consumes: ConsumesCondition::parse(&self.consumes, &self.headers)?,
            produces: ProducesCondition::parse(&self.produces, &self.headers)?,
        })
    }
}

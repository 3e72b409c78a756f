//! Route primitives for routemap
//!
//! This module provides the building blocks shared by mapping resolution and
//! request lookup:
//! - HTTP method enumeration with axum interop
//! - Framework-independent route pattern parsing and matching
//! - Path joining used for type-level paths and prefixes

pub mod pattern;

pub use pattern::{join_paths, MatchOptions, ParamConstraint, PathSegment, RoutePattern, RoutePatternError};

use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// HTTP methods a request mapping can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
    OPTIONS,
    TRACE,
}

/// Error returned when a method name is not one of [`HttpMethod`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl HttpMethod {
    /// All methods in declaration order
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::GET,
        HttpMethod::HEAD,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::OPTIONS,
        HttpMethod::TRACE,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .iter()
            .find(|method| method.as_str() == upper)
            .copied()
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

impl TryFrom<&Method> for HttpMethod {
    type Error = UnknownMethod;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(HttpMethod::GET),
            Method::HEAD => Ok(HttpMethod::HEAD),
            Method::POST => Ok(HttpMethod::POST),
            Method::PUT => Ok(HttpMethod::PUT),
            Method::PATCH => Ok(HttpMethod::PATCH),
            Method::DELETE => Ok(HttpMethod::DELETE),
            Method::OPTIONS => Ok(HttpMethod::OPTIONS),
            Method::TRACE => Ok(HttpMethod::TRACE),
            _ => Err(UnknownMethod(method.to_string())),
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => Method::GET,
            HttpMethod::HEAD => Method::HEAD,
            HttpMethod::POST => Method::POST,
            HttpMethod::PUT => Method::PUT,
            HttpMethod::PATCH => Method::PATCH,
            HttpMethod::DELETE => Method::DELETE,
            HttpMethod::OPTIONS => Method::OPTIONS,
            HttpMethod::TRACE => Method::TRACE,
        }
    }
}

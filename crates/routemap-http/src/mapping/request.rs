//! Request view used for mapping lookup

use super::handler::HandlerMethod;
use super::info::RequestMappingInfo;
use super::media_type::{MediaType, MediaTypeError};
use crate::routing::{HttpMethod, MatchOptions, UnknownMethod};
use axum::http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use std::collections::HashMap;

/// The parts of an HTTP request that request conditions look at
#[derive(Debug, Clone)]
pub struct MappingRequest {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
}

impl MappingRequest {
    /// Create a request; a query string after `?` is split off the path
    pub fn new(method: HttpMethod, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (uri, Vec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
        }
    }

    /// Build from an axum request, ignoring the body
    pub fn from_http<B>(request: &Request<B>) -> Result<Self, UnknownMethod> {
        let method = HttpMethod::try_from(request.method())?;
        let uri = request.uri();
        Ok(Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(parse_query).unwrap_or_default(),
            headers: request.headers().clone(),
        })
    }

    /// Add a header; invalid names or values are skipped
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                tracing::warn!(target: "routemap::lookup", "Skipping invalid header {}: {}", name, value);
            }
        }
        self
    }

    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values of a repeated query parameter
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.iter().any(|(key, _)| key == name)
    }

    /// Parsed `Content-Type`, `None` when the header is absent
    pub fn content_type(&self) -> Option<Result<MediaType, MediaTypeError>> {
        self.headers.get(CONTENT_TYPE).map(|value| {
            value
                .to_str()
                .map_err(|_| MediaTypeError {
                    value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    reason: "not valid UTF-8".to_string(),
                })
                .and_then(MediaType::parse)
        })
    }

    /// Accepted media types ordered by quality and specificity.
    ///
    /// A missing or empty `Accept` header means `*/*`.
    pub fn accepted_media_types(&self) -> Result<Vec<MediaType>, MediaTypeError> {
        let mut accepted = Vec::new();
        for value in self.headers.get_all(ACCEPT) {
            let value = value.to_str().map_err(|_| MediaTypeError {
                value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                reason: "not valid UTF-8".to_string(),
            })?;
            accepted.extend(MediaType::parse_list(value)?);
        }
        if accepted.is_empty() {
            accepted.push(MediaType::all());
        }
        accepted.sort_by(|a, b| a.compare_quality_and_specificity(b));
        Ok(accepted)
    }

    /// Whether the request declares a body
    pub fn has_body(&self) -> bool {
        let declared_length = self
            .header(CONTENT_LENGTH.as_str())
            .and_then(|length| length.trim().parse::<u64>().ok())
            .map(|length| length > 0)
            .unwrap_or(false);
        declared_length || self.has_header(TRANSFER_ENCODING.as_str())
    }
}

/// Percent-decoding is lossy, so only a decoder failure drops the query
fn parse_query(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_else(|error| {
        tracing::warn!(target: "routemap::lookup", "Ignoring malformed query '{}': {}", query, error);
        Vec::new()
    })
}

/// Request plus the match options conditions evaluate it with
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub request: &'a MappingRequest,
    pub options: MatchOptions,
}

impl<'a> MatchContext<'a> {
    pub fn new(request: &'a MappingRequest, options: MatchOptions) -> Self {
        Self { request, options }
    }
}

/// Result of a successful lookup
#[derive(Debug, Clone)]
pub struct HandlerMatch {
    /// The registered mapping
    pub mapping: RequestMappingInfo,
    /// The mapping narrowed to what matched this request
    pub matched: RequestMappingInfo,
    pub handler: HandlerMethod,
    /// Path variables of the best matching pattern
    pub path_params: HashMap<String, String>,
    /// The best matching pattern
    pub best_pattern: String,
}

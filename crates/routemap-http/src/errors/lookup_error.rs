//! Request-time lookup outcomes that are not a plain "no handler"

use crate::routing::HttpMethod;
use axum::http::StatusCode;
use thiserror::Error;

/// Errors returned when a request partially matches the mapping table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Request method '{method}' not supported, allowed: {allowed:?}")]
    MethodNotAllowed {
        method: HttpMethod,
        allowed: Vec<HttpMethod>,
    },

    #[error("Content type '{content_type}' not supported, supported: {supported:?}")]
    UnsupportedMediaType {
        content_type: String,
        supported: Vec<String>,
    },

    #[error("Could not find acceptable representation, producible: {producible:?}")]
    NotAcceptable { producible: Vec<String> },

    #[error("Request parameter conditions not met: {conditions:?}")]
    UnsatisfiedParameters { conditions: Vec<String> },

    #[error("Ambiguous handler methods mapped for '{path}': {{{first}, {second}}}")]
    AmbiguousHandler {
        path: String,
        first: String,
        second: String,
    },
}

impl LookupError {
    /// HTTP status a dispatcher should answer with
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            LookupError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            LookupError::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            LookupError::UnsatisfiedParameters { .. } => StatusCode::BAD_REQUEST,
            LookupError::AmbiguousHandler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for consistent API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            LookupError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            LookupError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            LookupError::NotAcceptable { .. } => "NOT_ACCEPTABLE",
            LookupError::UnsatisfiedParameters { .. } => "UNSATISFIED_PARAMETERS",
            LookupError::AmbiguousHandler { .. } => "AMBIGUOUS_HANDLER",
        }
    }
}

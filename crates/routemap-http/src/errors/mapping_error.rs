//! Startup error types
//!
//! Every failure while building the mapping table is a [`MappingError`]. They
//! surface from `build()` so that the table is fully valid before any request
//! is served.

use crate::mapping::media_type::MediaTypeError;
use crate::routing::RoutePatternError;
use routemap_core::ConfigError;
use thiserror::Error;

/// Result type for mapping resolution
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors raised while resolving and registering request mappings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("Could not resolve placeholder '{placeholder}' in value \"{value}\"")]
    UnresolvablePlaceholder { placeholder: String, value: String },

    #[error("Circular placeholder reference '{placeholder}' in property definitions")]
    CircularPlaceholder { placeholder: String },

    #[error("Invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: RoutePatternError,
    },

    #[error(transparent)]
    InvalidMediaType(#[from] MediaTypeError),

    #[error("Invalid {kind} expression '{expression}'")]
    InvalidExpression { kind: &'static str, expression: String },

    #[error("Attribute '{attribute}' and its alias '{alias}' are declared with different values on @{annotation}")]
    AliasConflict {
        annotation: String,
        attribute: String,
        alias: String,
    },

    #[error("Multiple routing annotations found on {element}: {annotations:?}")]
    MultipleMappingAnnotations {
        element: String,
        annotations: Vec<String>,
    },

    #[error("Invalid definition of annotation @{annotation}: {message}")]
    InvalidAnnotationDefinition { annotation: String, message: String },

    #[error("Invalid value for attribute '{attribute}' of @{annotation}: expected {expected}")]
    InvalidAttribute {
        annotation: String,
        attribute: String,
        expected: String,
    },

    #[error("Ambiguous mapping. Cannot map '{new_handler}' method\n{mapping}: There is already '{existing_handler}' method mapped.")]
    AmbiguousMapping {
        mapping: String,
        existing_handler: String,
        new_handler: String,
    },

    #[error("Handler type predicate failed for '{handler_type}': {message}")]
    PredicateFailed { handler_type: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MappingError {
    /// Create an unresolvable placeholder error
    pub fn unresolvable(placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        MappingError::UnresolvablePlaceholder {
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: RoutePatternError) -> Self {
        MappingError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a predicate failure
    pub fn predicate_failed(handler_type: impl Into<String>, message: impl Into<String>) -> Self {
        MappingError::PredicateFailed {
            handler_type: handler_type.into(),
            message: message.into(),
        }
    }

    /// Get error code for diagnostics output
    pub fn error_code(&self) -> &'static str {
        match self {
            MappingError::UnresolvablePlaceholder { .. } => "UNRESOLVABLE_PLACEHOLDER",
            MappingError::CircularPlaceholder { .. } => "CIRCULAR_PLACEHOLDER",
            MappingError::InvalidPattern { .. } => "INVALID_PATTERN",
            MappingError::InvalidMediaType(_) => "INVALID_MEDIA_TYPE",
            MappingError::InvalidExpression { .. } => "INVALID_EXPRESSION",
            MappingError::AliasConflict { .. } => "ALIAS_CONFLICT",
            MappingError::MultipleMappingAnnotations { .. } => "MULTIPLE_MAPPING_ANNOTATIONS",
            MappingError::InvalidAnnotationDefinition { .. } => "INVALID_ANNOTATION_DEFINITION",
            MappingError::InvalidAttribute { .. } => "INVALID_ATTRIBUTE",
            MappingError::AmbiguousMapping { .. } => "AMBIGUOUS_MAPPING",
            MappingError::PredicateFailed { .. } => "PREDICATE_FAILED",
            MappingError::Config(_) => "CONFIGURATION_ERROR",
        }
    }
}

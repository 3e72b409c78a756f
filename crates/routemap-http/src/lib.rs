//! # routemap-http
//!
//! Annotation-driven request-mapping resolution.
//!
//! Handler types are described as data and carry annotations such as
//! `@RestController`, `@RequestMapping("/users")` or `@GetMapping("/{id}")`.
//! [`RequestMappingHandlerMapping`] resolves `${...}` placeholders in their
//! patterns, applies path prefixes selected by [`HandlerTypePredicate`]s,
//! merges type and method level metadata into [`RequestMappingInfo`]s and
//! builds an immutable [`MappingRegistry`] that request handlers share
//! through an `Arc`.

pub mod config;
pub mod errors;
pub mod logging;
pub mod mapping;
pub mod routing;

pub use config::{MappingConfig, MappingDefaults, PathPrefixConfig};
pub use errors::{LookupError, MappingError, MappingResult};
pub use logging::{init_logging, LoggingConfig};
pub use mapping::{
    Annotation, AnnotationRegistry, AnnotationType, EmbeddedValueResolver, HandlerMatch, HandlerMethod,
    HandlerMethodDef, HandlerType, HandlerTypePredicate, MappingRegistry, MappingRequest, MediaType,
    MethodParameter, PropertyPlaceholderResolver, RequestMappingHandlerMapping, RequestMappingInfo,
};
pub use routing::{HttpMethod, MatchOptions, RoutePattern};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

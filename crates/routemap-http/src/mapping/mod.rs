//! Annotation-driven request mapping
//!
//! - [`annotation`]: annotation types, aliases and attribute resolution
//! - [`builtin`]: `@RequestMapping`, the method shorthands and the stereotypes
//! - [`condition`]: the request conditions a mapping is made of
//! - [`handler_mapping`]: merging annotations into mappings and building the table
//! - [`registry`]: the immutable mapping table and request lookup

pub mod annotation;
pub mod builtin;
pub mod condition;
pub mod handler;
pub mod handler_mapping;
pub mod info;
pub mod media_type;
pub mod predicate;
pub mod registry;
pub mod request;
pub mod resolver;

pub use annotation::{AliasFor, Annotation, AnnotationRegistry, AnnotationType, AttributeMap, AttributeValue};
pub use condition::RequestCondition;
pub use handler::{HandlerMethod, HandlerMethodDef, HandlerType, MethodParameter};
pub use handler_mapping::{PathPrefix, RequestMappingHandlerMapping};
pub use info::{RequestMappingInfo, RequestMappingInfoBuilder};
pub use media_type::{MediaType, MediaTypeError};
pub use predicate::HandlerTypePredicate;
pub use registry::{default_mapping_name, MappingRegistration, MappingRegistry, MappingRegistryBuilder};
pub use request::{HandlerMatch, MappingRequest, MatchContext};
pub use resolver::{EmbeddedValueResolver, PropertyPlaceholderResolver};

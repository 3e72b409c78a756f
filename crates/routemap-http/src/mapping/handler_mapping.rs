//! # Request mapping handler mapping
//!
//! Turns annotated handler descriptors into [`RequestMappingInfo`]s and builds
//! the immutable [`MappingRegistry`] from them.
//!
//! Building happens in one explicit phase:
//!
//! 1. handler types are registered with [`RequestMappingHandlerMapping::register_handler_type`];
//! 2. [`RequestMappingHandlerMapping::build`] walks them in registration order,
//!    merges the type level and method level routing annotations of every
//!    method, applies the first matching path prefix and registers the result.
//!
//! ```rust
//! use routemap_http::mapping::builtin::{get_mapping, request_mapping, rest_controller};
//! use routemap_http::mapping::{HandlerMethodDef, HandlerType, RequestMappingHandlerMapping};
//!
//! let mut handler_mapping = RequestMappingHandlerMapping::new();
//! handler_mapping.register_handler_type(
//!     HandlerType::new("UserController")
//!         .annotated(rest_controller())
//!         .annotated(request_mapping().with_value("/users"))
//!         .method(HandlerMethodDef::new("show").annotated(get_mapping("/{id}"))),
//! );
//!
//! let registry = handler_mapping.build().unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

use super::annotation::{AnnotationRegistry, AnnotationType, AttributeMap};
use super::builtin::{CONTROLLER, REQUEST_BODY, REQUEST_MAPPING};
use super::handler::{HandlerMethod, HandlerMethodDef, HandlerType};
use super::info::RequestMappingInfo;
use super::predicate::HandlerTypePredicate;
use super::registry::MappingRegistry;
use super::resolver::EmbeddedValueResolver;
use crate::config::MappingConfig;
use crate::errors::MappingResult;
use crate::logging::structured::log_registry_built;
use std::sync::Arc;
use std::time::Instant;

/// A prefix template and the handler types it applies to
#[derive(Debug, Clone)]
pub struct PathPrefix {
    template: String,
    predicate: HandlerTypePredicate,
}

impl PathPrefix {
    pub fn new(template: impl Into<String>, predicate: HandlerTypePredicate) -> Self {
        Self {
            template: template.into(),
            predicate,
        }
    }

    /// Unresolved prefix template, e.g. `/${api.prefix}`
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn predicate(&self) -> &HandlerTypePredicate {
        &self.predicate
    }
}

/// Builds request mappings from annotated handler types
pub struct RequestMappingHandlerMapping {
    config: MappingConfig,
    annotations: AnnotationRegistry,
    embedded_value_resolver: Option<Arc<dyn EmbeddedValueResolver>>,
    path_prefixes: Vec<PathPrefix>,
    handler_types: Vec<Arc<HandlerType>>,
}

impl Default for RequestMappingHandlerMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestMappingHandlerMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMappingHandlerMapping")
            .field("config", &self.config)
            .field("embedded_value_resolver", &self.embedded_value_resolver.is_some())
            .field("path_prefixes", &self.path_prefixes)
            .field("handler_types", &self.handler_types.len())
            .finish()
    }
}

impl RequestMappingHandlerMapping {
    /// Handler mapping with default configuration and the built-in annotations
    pub fn new() -> Self {
        Self::with_config(MappingConfig::default())
    }

    pub fn with_config(config: MappingConfig) -> Self {
        Self {
            config,
            annotations: AnnotationRegistry::with_builtin(),
            embedded_value_resolver: None,
            path_prefixes: Vec::new(),
            handler_types: Vec::new(),
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn set_embedded_value_resolver(&mut self, resolver: impl EmbeddedValueResolver + 'static) {
        self.embedded_value_resolver = Some(Arc::new(resolver));
    }

    /// Replace the programmatic path prefixes; order is preserved
    pub fn set_path_prefixes(&mut self, prefixes: Vec<(String, HandlerTypePredicate)>) {
        self.path_prefixes = prefixes
            .into_iter()
            .map(|(template, predicate)| PathPrefix::new(template, predicate))
            .collect();
    }

    pub fn add_path_prefix(&mut self, template: impl Into<String>, predicate: HandlerTypePredicate) {
        self.path_prefixes.push(PathPrefix::new(template, predicate));
    }

    /// Programmatic prefixes followed by the configured ones
    pub fn path_prefixes(&self) -> Vec<PathPrefix> {
        self.path_prefixes
            .iter()
            .cloned()
            .chain(
                self.config
                    .path_prefixes
                    .iter()
                    .map(|prefix| PathPrefix::new(prefix.prefix.clone(), prefix.predicate())),
            )
            .collect()
    }

    pub fn annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationRegistry {
        &mut self.annotations
    }

    /// Register a custom (usually composed) annotation type
    pub fn register_annotation_type(&mut self, annotation_type: AnnotationType) -> MappingResult<()> {
        self.annotations.register(annotation_type)
    }

    pub fn register_handler_type(&mut self, handler_type: HandlerType) {
        self.handler_types.push(Arc::new(handler_type));
    }

    pub fn handler_types(&self) -> &[Arc<HandlerType>] {
        &self.handler_types
    }

    /// A type is a handler when it is a controller or carries a type level mapping
    pub fn is_handler(&self, handler_type: &HandlerType) -> bool {
        self.annotations
            .is_annotation_present(&handler_type.annotations, CONTROLLER)
            || self
                .annotations
                .is_annotation_present(&handler_type.annotations, REQUEST_MAPPING)
    }

    /// Resolve placeholders in every pattern, one resolver call per pattern
    pub fn resolve_embedded_values_in_patterns(&self, patterns: &[String]) -> MappingResult<Vec<String>> {
        match &self.embedded_value_resolver {
            None => Ok(patterns.to_vec()),
            Some(resolver) => patterns
                .iter()
                .map(|pattern| resolver.resolve_string_value(pattern))
                .collect(),
        }
    }

    /// Merge the routing annotations of `method` and its declaring type.
    ///
    /// Returns `Ok(None)` when the method carries no routing annotation.
    pub fn get_mapping_for_method(
        &self,
        method: &HandlerMethodDef,
        handler_type: &HandlerType,
    ) -> MappingResult<Option<RequestMappingInfo>> {
        let element = format!("{}#{}", handler_type.qualified_name(), method.name);
        let Some(method_attributes) =
            self.annotations
                .find_merged(&element, &method.annotations, REQUEST_MAPPING)?
        else {
            return Ok(None);
        };
        let method_info = self.create_request_mapping_info(&method_attributes)?;

        let type_attributes = self.annotations.find_merged(
            &handler_type.qualified_name(),
            &handler_type.annotations,
            REQUEST_MAPPING,
        )?;
        let mut info = match type_attributes {
            Some(type_attributes) => self
                .create_request_mapping_info(&type_attributes)?
                .combine(&method_info)?,
            None => method_info.clone(),
        };

        info = info
            .with_name(method_info.name().map(str::to_string))
            .with_body_required(self.is_body_required(method)?);

        if let Some(prefix) = self.path_prefix_for(handler_type)? {
            info = info.with_prefix(&prefix)?;
        }

        Ok(Some(info))
    }

    /// Build the immutable mapping registry from every registered handler type
    pub fn build(&self) -> MappingResult<MappingRegistry> {
        let started = Instant::now();
        let mut builder = MappingRegistry::builder(self.config.match_options());
        let mut handler_count = 0;

        for handler_type in &self.handler_types {
            if !self.is_handler(handler_type) {
                tracing::warn!(
                    target: "routemap::mapping",
                    "Skipping {}: not a controller and no type level request mapping",
                    handler_type.qualified_name()
                );
                continue;
            }
            handler_count += 1;

            for method in &handler_type.methods {
                if let Some(info) = self.get_mapping_for_method(method, handler_type)? {
                    let handler = HandlerMethod::new(Arc::clone(handler_type), Arc::new(method.clone()));
                    builder.register(info, handler)?;
                }
            }
        }

        let registry = builder.build();
        log_registry_built(handler_count, registry.len(), started.elapsed());
        Ok(registry)
    }

    fn create_request_mapping_info(&self, attributes: &AttributeMap) -> MappingResult<RequestMappingInfo> {
        let mut paths = attributes.strings("path")?;
        if paths.is_empty() {
            paths = attributes.strings("value")?;
        }
        let paths = self.resolve_embedded_values_in_patterns(&paths)?;

        let mut builder = RequestMappingInfo::paths(paths)
            .methods(attributes.methods("method")?)
            .params(attributes.strings("params")?)
            .headers(attributes.strings("headers")?)
            .consumes(attributes.strings("consumes")?)
            .produces(attributes.strings("produces")?);
        if let Some(name) = attributes.string("name")? {
            builder = builder.name(name);
        }
        builder.build()
    }

    /// The first parameter carrying `@RequestBody` decides whether a body is required
    fn is_body_required(&self, method: &HandlerMethodDef) -> MappingResult<bool> {
        for parameter in &method.parameters {
            for annotation in &parameter.annotations {
                if let Some(attributes) = self.annotations.merged_attributes(annotation, REQUEST_BODY)? {
                    let required = attributes.boolean("required")?.unwrap_or(true);
                    return Ok(required && !parameter.optional);
                }
            }
        }
        Ok(true)
    }

    /// Resolved template of the first prefix whose predicate accepts the type
    fn path_prefix_for(&self, handler_type: &HandlerType) -> MappingResult<Option<String>> {
        for prefix in self.path_prefixes() {
            if !prefix.predicate.test(handler_type, &self.annotations)? {
                continue;
            }
            let resolved = self.resolve_embedded_values_in_patterns(&[prefix.template.clone()])?;
            let resolved = resolved.into_iter().next().unwrap_or_default();
            tracing::debug!(
                target: "routemap::mapping",
                "Applying path prefix '{}' (from '{}') to {}",
                resolved,
                prefix.template,
                handler_type.qualified_name()
            );
            return Ok(Some(resolved));
        }
        Ok(None)
    }
}

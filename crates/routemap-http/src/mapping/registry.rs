//! Mapping registry
//!
//! The immutable route table produced by
//! [`RequestMappingHandlerMapping::build`](super::RequestMappingHandlerMapping::build).
//! Lookups never mutate it, so one registry can be shared through an `Arc`
//! by any number of request handlers.

use super::condition::RequestCondition;
use super::handler::HandlerMethod;
use super::info::RequestMappingInfo;
use super::request::{HandlerMatch, MappingRequest, MatchContext};
use crate::errors::{LookupError, MappingError, MappingResult};
use crate::mapping::media_type::APPLICATION_OCTET_STREAM_VALUE;
use crate::routing::{HttpMethod, MatchOptions};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// A mapping and the handler method it routes to
#[derive(Debug, Clone)]
pub struct MappingRegistration {
    info: RequestMappingInfo,
    handler: HandlerMethod,
    mapping_name: String,
}

impl MappingRegistration {
    pub fn info(&self) -> &RequestMappingInfo {
        &self.info
    }

    pub fn handler(&self) -> &HandlerMethod {
        &self.handler
    }

    /// Explicit mapping name, or the derived `<type initials>#<method>`
    pub fn mapping_name(&self) -> &str {
        &self.mapping_name
    }
}

/// Immutable table of request mappings
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    options: MatchOptions,
    /// Registrations in registration order
    registrations: Vec<MappingRegistration>,
    by_info: HashMap<RequestMappingInfo, usize>,
    /// Static pattern -> registrations, for the direct lookup fast path
    direct_paths: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

/// Derive a mapping name from the uppercase letters of the type name
pub fn default_mapping_name(handler: &HandlerMethod) -> String {
    let initials: String = handler
        .handler_type()
        .name
        .chars()
        .filter(|c| c.is_uppercase())
        .collect();
    format!("{}#{}", initials, handler.method().name)
}

impl MappingRegistry {
    pub fn builder(options: MatchOptions) -> MappingRegistryBuilder {
        MappingRegistryBuilder {
            registry: MappingRegistry {
                options,
                registrations: Vec::new(),
                by_info: HashMap::new(),
                direct_paths: HashMap::new(),
                by_name: HashMap::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn match_options(&self) -> MatchOptions {
        self.options
    }

    /// All registrations in registration order
    pub fn registrations(&self) -> &[MappingRegistration] {
        &self.registrations
    }

    /// Mappings and their handler methods in registration order
    pub fn handler_methods(&self) -> impl Iterator<Item = (&RequestMappingInfo, &HandlerMethod)> {
        self.registrations.iter().map(|r| (&r.info, &r.handler))
    }

    /// Handler method registered for an equal mapping
    pub fn get(&self, info: &RequestMappingInfo) -> Option<&HandlerMethod> {
        self.by_info
            .get(info)
            .map(|&index| &self.registrations[index].handler)
    }

    /// The registered mapping equal to `info`, with its stored body-required flag
    pub fn get_mapping(&self, info: &RequestMappingInfo) -> Option<&RequestMappingInfo> {
        self.by_info
            .get(info)
            .map(|&index| &self.registrations[index].info)
    }

    /// Handler methods registered under a mapping name
    pub fn handler_methods_for_mapping_name(&self, name: &str) -> Vec<&HandlerMethod> {
        self.by_name
            .get(name)
            .map(|indexes| indexes.iter().map(|&i| &self.registrations[i].handler).collect())
            .unwrap_or_default()
    }

    /// Registrations whose patterns include the static path
    pub fn mappings_by_direct_path(&self, path: &str) -> Vec<&RequestMappingInfo> {
        self.direct_paths
            .get(path)
            .map(|indexes| indexes.iter().map(|&i| &self.registrations[i].info).collect())
            .unwrap_or_default()
    }

    /// Find the best handler for a request.
    ///
    /// `Ok(None)` when nothing matches the path. Requests matching the path
    /// but not the other conditions produce the matching [`LookupError`].
    pub fn lookup(&self, request: &MappingRequest) -> Result<Option<HandlerMatch>, LookupError> {
        let ctx = MatchContext::new(request, self.options);

        let mut matches = Vec::new();
        if let Some(indexes) = self.direct_paths.get(request.path()) {
            self.add_matches(indexes.iter().copied(), &ctx, &mut matches);
        }
        if matches.is_empty() {
            self.add_matches(0..self.registrations.len(), &ctx, &mut matches);
        }
        if matches.is_empty() {
            return self.handle_no_match(&ctx);
        }

        matches.sort_by(|(_, a), (_, b)| a.compare_to(b, &ctx));

        if let [(best_index, best), (second_index, second), ..] = matches.as_slice() {
            if best.compare_to(second, &ctx) == Ordering::Equal {
                return Err(LookupError::AmbiguousHandler {
                    path: request.path().to_string(),
                    first: self.registrations[*best_index].handler.qualified_name(),
                    second: self.registrations[*second_index].handler.qualified_name(),
                });
            }
        }

        let (index, matched) = matches.swap_remove(0);
        let registration = &self.registrations[index];
        let (best_pattern, path_params) = match matched.patterns_condition().first() {
            Some(pattern) => (
                pattern.as_str().to_string(),
                pattern
                    .capture(request.path(), &self.options)
                    .unwrap_or_default(),
            ),
            None => (String::new(), HashMap::new()),
        };

        tracing::trace!(
            target: "routemap::lookup",
            "{} {} matched {}",
            request.method(),
            request.path(),
            registration.handler
        );

        Ok(Some(HandlerMatch {
            mapping: registration.info.clone(),
            matched,
            best_pattern,
            handler: registration.handler.clone(),
            path_params,
        }))
    }

    fn add_matches(
        &self,
        indexes: impl Iterator<Item = usize>,
        ctx: &MatchContext<'_>,
        matches: &mut Vec<(usize, RequestMappingInfo)>,
    ) {
        for index in indexes {
            if let Some(matched) = self.registrations[index].info.matching_condition(ctx) {
                matches.push((index, matched));
            }
        }
    }

    /// Explain why registrations matching the path rejected the request
    fn handle_no_match(&self, ctx: &MatchContext<'_>) -> Result<Option<HandlerMatch>, LookupError> {
        let request = ctx.request;
        let partial: Vec<&RequestMappingInfo> = self
            .registrations
            .iter()
            .map(|r| &r.info)
            .filter(|info| info.patterns_condition().matching_condition(ctx).is_some())
            .collect();
        if partial.is_empty() {
            return Ok(None);
        }

        let method_matches: Vec<&RequestMappingInfo> = partial
            .iter()
            .copied()
            .filter(|info| info.methods_condition().matching_condition(ctx).is_some())
            .collect();
        if method_matches.is_empty() {
            let allowed: BTreeSet<HttpMethod> = partial
                .iter()
                .flat_map(|info| info.methods_condition().methods().iter().copied())
                .collect();
            return Err(LookupError::MethodNotAllowed {
                method: request.method(),
                allowed: allowed.into_iter().collect(),
            });
        }

        let consumes_matches: Vec<&RequestMappingInfo> = method_matches
            .iter()
            .copied()
            .filter(|info| info.consumes_condition().matching_condition(ctx).is_some())
            .collect();
        if consumes_matches.is_empty() {
            let supported: BTreeSet<String> = method_matches
                .iter()
                .flat_map(|info| info.consumes_condition().consumable_media_types())
                .map(ToString::to_string)
                .collect();
            return Err(LookupError::UnsupportedMediaType {
                content_type: request
                    .header("content-type")
                    .unwrap_or(APPLICATION_OCTET_STREAM_VALUE)
                    .to_string(),
                supported: supported.into_iter().collect(),
            });
        }

        let produces_matches: Vec<&RequestMappingInfo> = consumes_matches
            .iter()
            .copied()
            .filter(|info| info.produces_condition().matching_condition(ctx).is_some())
            .collect();
        if produces_matches.is_empty() {
            let producible: BTreeSet<String> = consumes_matches
                .iter()
                .flat_map(|info| info.produces_condition().producible_media_types())
                .map(ToString::to_string)
                .collect();
            return Err(LookupError::NotAcceptable {
                producible: producible.into_iter().collect(),
            });
        }

        let params_matches = produces_matches
            .iter()
            .filter(|info| info.params_condition().matching_condition(ctx).is_some())
            .count();
        if params_matches == 0 {
            let conditions: Vec<String> = produces_matches
                .iter()
                .map(|info| info.params_condition().to_string())
                .collect();
            return Err(LookupError::UnsatisfiedParameters { conditions });
        }

        Ok(None)
    }

    /// JSON view of the table for diagnostics
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.registrations
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.mapping_name,
                        "mapping": r.info.to_json(),
                        "handler": r.handler,
                    })
                })
                .collect(),
        )
    }
}

/// Accumulates registrations and rejects ambiguous ones
#[derive(Debug)]
pub struct MappingRegistryBuilder {
    registry: MappingRegistry,
}

impl MappingRegistryBuilder {
    /// Register a mapping.
    ///
    /// An equal mapping already registered for another handler method is an
    /// [`MappingError::AmbiguousMapping`]. Re-registering the same pair is a no-op.
    pub fn register(&mut self, info: RequestMappingInfo, handler: HandlerMethod) -> MappingResult<()> {
        let registry = &mut self.registry;

        if let Some(&existing) = registry.by_info.get(&info) {
            let existing = &registry.registrations[existing].handler;
            if *existing == handler {
                return Ok(());
            }
            return Err(MappingError::AmbiguousMapping {
                mapping: info.to_string(),
                existing_handler: existing.qualified_name(),
                new_handler: handler.qualified_name(),
            });
        }

        let index = registry.registrations.len();
        for path in info.patterns_condition().direct_paths() {
            registry.direct_paths.entry(path).or_default().push(index);
        }

        let mapping_name = info
            .name()
            .map(String::from)
            .unwrap_or_else(|| default_mapping_name(&handler));
        registry.by_name.entry(mapping_name.clone()).or_default().push(index);

        crate::logging::structured::log_mapping_registered(&info, &handler);

        registry.by_info.insert(info.clone(), index);
        registry.registrations.push(MappingRegistration {
            info,
            handler,
            mapping_name,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn build(self) -> MappingRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::handler::{HandlerMethodDef, HandlerType};
    use std::sync::Arc;

    fn handler(type_name: &str, method: &str) -> HandlerMethod {
        HandlerMethod::new(
            Arc::new(HandlerType::new(type_name)),
            Arc::new(HandlerMethodDef::new(method)),
        )
    }

    fn info(path: &str, methods: &[HttpMethod]) -> RequestMappingInfo {
        RequestMappingInfo::paths([path])
            .methods(methods.iter().copied())
            .build()
            .unwrap()
    }

    fn registry() -> MappingRegistry {
        let mut builder = MappingRegistry::builder(MatchOptions::default());
        builder
            .register(info("/users", &[HttpMethod::GET]), handler("UserController", "list"))
            .unwrap();
        builder
            .register(info("/users", &[HttpMethod::POST]), handler("UserController", "create"))
            .unwrap();
        builder
            .register(info("/users/{id:int}", &[HttpMethod::GET]), handler("UserController", "show"))
            .unwrap();
        builder
            .register(info("/users/{name}", &[HttpMethod::GET]), handler("UserController", "by_name"))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.get(&info("/users", &[HttpMethod::POST])).unwrap().to_string(),
            "UserController#create"
        );
        assert_eq!(registry.mappings_by_direct_path("/users").len(), 2);
        assert_eq!(registry.handler_methods_for_mapping_name("UC#show").len(), 1);
    }

    #[test]
    fn test_ambiguous_mapping_rejected() {
        let mut builder = MappingRegistry::builder(MatchOptions::default());
        builder
            .register(info("/users", &[HttpMethod::GET]), handler("UserController", "list"))
            .unwrap();
        builder
            .register(info("/users", &[HttpMethod::GET]), handler("UserController", "list"))
            .unwrap();

        let error = builder
            .register(info("/users", &[HttpMethod::GET]), handler("AdminController", "list"))
            .unwrap_err();
        match error {
            MappingError::AmbiguousMapping {
                mapping,
                existing_handler,
                new_handler,
            } => {
                assert_eq!(mapping, "{GET [/users]}");
                assert_eq!(existing_handler, "UserController#list");
                assert_eq!(new_handler, "AdminController#list");
            }
            other => panic!("Expected AmbiguousMapping, got {:?}", other),
        }
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_lookup_prefers_specific_pattern() {
        let registry = registry();

        let found = registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/users/42"))
            .unwrap()
            .unwrap();
        assert_eq!(found.handler.to_string(), "UserController#show");
        assert_eq!(found.best_pattern, "/users/{id:int}");
        assert_eq!(found.path_params["id"], "42");

        let found = registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/users/alice"))
            .unwrap()
            .unwrap();
        assert_eq!(found.handler.to_string(), "UserController#by_name");
        assert_eq!(found.path_params["name"], "alice");
    }

    #[test]
    fn test_lookup_direct_path_and_head() {
        let registry = registry();
        let found = registry
            .lookup(&MappingRequest::new(HttpMethod::POST, "/users"))
            .unwrap()
            .unwrap();
        assert_eq!(found.handler.to_string(), "UserController#create");

        let head = registry
            .lookup(&MappingRequest::new(HttpMethod::HEAD, "/users"))
            .unwrap()
            .unwrap();
        assert_eq!(head.handler.to_string(), "UserController#list");
    }

    #[test]
    fn test_lookup_without_match() {
        let registry = registry();
        assert!(registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/missing"))
            .unwrap()
            .is_none());

        let error = registry
            .lookup(&MappingRequest::new(HttpMethod::DELETE, "/users"))
            .unwrap_err();
        assert_eq!(
            error,
            LookupError::MethodNotAllowed {
                method: HttpMethod::DELETE,
                allowed: vec![HttpMethod::GET, HttpMethod::POST],
            }
        );
    }

    #[test]
    fn test_lookup_ambiguous_handlers() {
        let mut builder = MappingRegistry::builder(MatchOptions::default());
        let by_owner = RequestMappingInfo::paths(["/files"]).params(["owner"]).build().unwrap();
        let by_tag = RequestMappingInfo::paths(["/files"]).params(["tag"]).build().unwrap();
        builder.register(by_owner, handler("FileController", "by_owner")).unwrap();
        builder.register(by_tag, handler("FileController", "by_tag")).unwrap();
        let registry = builder.build();

        let error = registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/files?owner=me&tag=x"))
            .unwrap_err();
        assert_eq!(
            error,
            LookupError::AmbiguousHandler {
                path: "/files".to_string(),
                first: "FileController#by_owner".to_string(),
                second: "FileController#by_tag".to_string(),
            }
        );

        let found = registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/files?tag=x"))
            .unwrap()
            .unwrap();
        assert_eq!(found.handler.to_string(), "FileController#by_tag");

        let error = registry
            .lookup(&MappingRequest::new(HttpMethod::GET, "/files"))
            .unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_default_mapping_name() {
        assert_eq!(
            default_mapping_name(&handler("UserController", "get_user")),
            "UC#get_user"
        );
    }
}

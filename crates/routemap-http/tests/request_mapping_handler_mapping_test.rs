//! Tests for merging annotation metadata into request mappings

use routemap_http::mapping::builtin::{
    delete_mapping, get_mapping, patch_mapping, post_mapping, put_mapping, request_body, request_mapping,
    rest_controller, REQUEST_MAPPING, REST_CONTROLLER,
};
use routemap_http::mapping::media_type::{APPLICATION_JSON_VALUE, APPLICATION_XML_VALUE};
use routemap_http::mapping::{AliasFor, AttributeValue};
use routemap_http::{
    Annotation, AnnotationType, HandlerMethodDef, HandlerType, HandlerTypePredicate, HttpMethod, MappingError,
    MappingRequest, MethodParameter, PropertyPlaceholderResolver, RequestMappingHandlerMapping, RequestMappingInfo,
};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_test::traced_test;

const POST_JSON: &str = "PostJson";

/// `@PostJson`: POST, consuming and producing JSON
fn post_json_type() -> AnnotationType {
    AnnotationType::new(POST_JSON)
        .attribute("value", AttributeValue::empty_strings())
        .meta_annotated(
            Annotation::new(REQUEST_MAPPING)
                .with("method", HttpMethod::POST)
                .with("consumes", [APPLICATION_JSON_VALUE])
                .with("produces", [APPLICATION_JSON_VALUE]),
        )
        .alias(AliasFor::new("value", REQUEST_MAPPING, "path"))
}

fn mapping_for(
    handler_mapping: &RequestMappingHandlerMapping,
    handler_type: &HandlerType,
    method: &str,
) -> RequestMappingInfo {
    let method = handler_type
        .methods
        .iter()
        .find(|candidate| candidate.name == method)
        .unwrap();
    handler_mapping
        .get_mapping_for_method(method, handler_type)
        .unwrap()
        .unwrap()
}

fn methods(info: &RequestMappingInfo) -> BTreeSet<HttpMethod> {
    info.methods_condition().methods().clone()
}

fn consumes(info: &RequestMappingInfo) -> Vec<String> {
    info.consumes_condition()
        .consumable_media_types()
        .iter()
        .map(|media_type| media_type.to_string())
        .collect()
}

fn produces(info: &RequestMappingInfo) -> Vec<String> {
    info.produces_condition()
        .producible_media_types()
        .iter()
        .map(|media_type| media_type.to_string())
        .collect()
}

#[test]
fn test_resolve_embedded_values_in_patterns() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.set_embedded_value_resolver(|value: &str| match value {
        "/${pattern}/bar" => "/foo/bar".to_string(),
        other => other.to_string(),
    });

    let resolved = handler_mapping
        .resolve_embedded_values_in_patterns(&["/foo".to_string(), "/${pattern}/bar".to_string()])
        .unwrap();
    assert_eq!(resolved, vec!["/foo".to_string(), "/foo/bar".to_string()]);
}

#[test]
fn test_resolver_called_once_per_pattern_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    {
        let calls = Arc::clone(&calls);
        let seen = Arc::clone(&seen);
        handler_mapping.set_embedded_value_resolver(move |value: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().push(value.to_string());
            value.to_uppercase()
        });
    }

    let patterns = vec!["/a".to_string(), "/b".to_string(), "/a".to_string()];
    let resolved = handler_mapping.resolve_embedded_values_in_patterns(&patterns).unwrap();

    assert_eq!(resolved, vec!["/A", "/B", "/A"]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(*seen.lock().unwrap(), patterns);
}

#[test]
fn test_unresolvable_placeholder_fails() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.set_embedded_value_resolver(PropertyPlaceholderResolver::new());

    let handler_type = HandlerType::new("UserController")
        .annotated(rest_controller())
        .method(HandlerMethodDef::new("show").annotated(get_mapping("/${missing}/users")));

    let err = handler_mapping
        .get_mapping_for_method(&handler_type.methods[0], &handler_type)
        .unwrap_err();
    assert!(matches!(err, MappingError::UnresolvablePlaceholder { .. }));
}

#[test]
#[traced_test]
fn test_path_prefix_with_placeholder() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.set_embedded_value_resolver(PropertyPlaceholderResolver::new().with_property("prefix", "api"));
    handler_mapping.set_path_prefixes(vec![(
        "/${prefix}".to_string(),
        HandlerTypePredicate::for_annotation([REST_CONTROLLER]),
    )]);

    let handler_type = HandlerType::new("UserController")
        .in_module("app::users")
        .annotated(rest_controller())
        .annotated(request_mapping().with_value("/user"))
        .method(HandlerMethodDef::new("get_user").annotated(get_mapping("/{id}")));

    let info = mapping_for(&handler_mapping, &handler_type, "get_user");
    assert_eq!(info.pattern_strings(), vec!["/api/user/{id}"]);
    assert!(logs_contain("Applying path prefix '/api'"));
}

#[test]
fn test_no_matching_prefix_leaves_patterns_alone() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.add_path_prefix("/admin", HandlerTypePredicate::for_base_module(["app::admin"]));

    let handler_type = HandlerType::new("UserController")
        .in_module("app::users")
        .annotated(rest_controller())
        .method(HandlerMethodDef::new("list").annotated(get_mapping("/users")));

    assert_eq!(
        mapping_for(&handler_mapping, &handler_type, "list").pattern_strings(),
        vec!["/users"]
    );
}

#[test]
fn test_composed_annotation() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.register_annotation_type(post_json_type()).unwrap();

    let handler_type = HandlerType::new("ComposedController")
        .annotated(rest_controller())
        .method(HandlerMethodDef::new("post_json").annotated(Annotation::new(POST_JSON).with_value("/postJson")));

    let info = mapping_for(&handler_mapping, &handler_type, "post_json");
    assert_eq!(info.pattern_strings(), vec!["/postJson"]);
    assert_eq!(methods(&info), BTreeSet::from([HttpMethod::POST]));
    assert_eq!(consumes(&info), vec![APPLICATION_JSON_VALUE]);
    assert_eq!(produces(&info), vec![APPLICATION_JSON_VALUE]);
    assert_eq!(
        info.to_string(),
        "{POST [/postJson], consumes [application/json], produces [application/json]}"
    );
}

#[test]
fn test_method_consumes_overrides_type_consumes() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("ConsumesController")
        .annotated(rest_controller())
        .annotated(request_mapping().with("consumes", [APPLICATION_JSON_VALUE]))
        .method(
            HandlerMethodDef::new("post_xml")
                .annotated(post_mapping("").with("path", "/post").with("consumes", [APPLICATION_XML_VALUE])),
        )
        .method(HandlerMethodDef::new("post_default").annotated(post_mapping("/default")));

    assert_eq!(
        consumes(&mapping_for(&handler_mapping, &handler_type, "post_xml")),
        vec![APPLICATION_XML_VALUE]
    );
    assert_eq!(
        consumes(&mapping_for(&handler_mapping, &handler_type, "post_default")),
        vec![APPLICATION_JSON_VALUE]
    );
}

#[test]
fn test_optional_request_body() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("BodyController")
        .annotated(rest_controller())
        .method(
            HandlerMethodDef::new("optional_body").annotated(post_mapping("/optional")).parameter(
                MethodParameter::new("body", "Option<String>")
                    .annotated(request_body(true))
                    .optional(),
            ),
        )
        .method(
            HandlerMethodDef::new("required_body")
                .annotated(post_mapping("/required"))
                .parameter(MethodParameter::new("body", "String").annotated(request_body(true))),
        )
        .method(HandlerMethodDef::new("no_body").annotated(post_mapping("/none")));

    assert!(!mapping_for(&handler_mapping, &handler_type, "optional_body").is_body_required());
    assert!(mapping_for(&handler_mapping, &handler_type, "required_body").is_body_required());
    assert!(mapping_for(&handler_mapping, &handler_type, "no_body").is_body_required());
}

#[test]
fn test_request_body_not_required_under_type_level_consumes() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.register_handler_type(
        HandlerType::new("BodyController")
            .annotated(rest_controller())
            .annotated(request_mapping().with("consumes", [APPLICATION_JSON_VALUE]))
            .method(
                HandlerMethodDef::new("post_body")
                    .annotated(post_mapping("/post"))
                    .parameter(MethodParameter::new("body", "String").annotated(request_body(false))),
            ),
    );
    let registry = handler_mapping.build().unwrap();

    let (info, handler) = registry
        .handler_methods()
        .find(|(info, _)| info.pattern_strings() == vec!["/post".to_string()])
        .unwrap();
    assert_eq!(handler.to_string(), "BodyController#post_body");
    assert!(!info.is_body_required());
    assert_eq!(consumes(info), vec![APPLICATION_JSON_VALUE]);

    // Without a body the consumes condition is skipped
    let found = registry
        .lookup(&MappingRequest::new(HttpMethod::POST, "/post"))
        .unwrap()
        .unwrap();
    assert_eq!(found.handler.to_string(), "BodyController#post_body");
}

#[test]
fn test_shorthand_annotations() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let cases = [
        (get_mapping("/get"), HttpMethod::GET, "/get"),
        (post_mapping("/post"), HttpMethod::POST, "/post"),
        (put_mapping("/put"), HttpMethod::PUT, "/put"),
        (delete_mapping("/delete"), HttpMethod::DELETE, "/delete"),
        (patch_mapping("/patch"), HttpMethod::PATCH, "/patch"),
    ];

    for (annotation, method, path) in cases {
        let handler_type = HandlerType::new("ShorthandController")
            .annotated(rest_controller())
            .method(HandlerMethodDef::new("handle").annotated(annotation));

        let info = mapping_for(&handler_mapping, &handler_type, "handle");
        assert_eq!(info.pattern_strings(), vec![path]);
        assert_eq!(methods(&info), BTreeSet::from([method]));
        assert!(consumes(&info).is_empty());
        assert!(produces(&info).is_empty());
    }
}

#[test]
fn test_method_level_methods_replace_type_level() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("MethodsController")
        .annotated(rest_controller())
        .annotated(request_mapping().with("method", vec![HttpMethod::GET, HttpMethod::HEAD]))
        .method(HandlerMethodDef::new("inherit").annotated(request_mapping().with_value("/inherit")))
        .method(HandlerMethodDef::new("replace").annotated(put_mapping("/replace")));

    assert_eq!(
        methods(&mapping_for(&handler_mapping, &handler_type, "inherit")),
        BTreeSet::from([HttpMethod::GET, HttpMethod::HEAD])
    );
    assert_eq!(
        methods(&mapping_for(&handler_mapping, &handler_type, "replace")),
        BTreeSet::from([HttpMethod::PUT])
    );
}

#[test]
fn test_empty_paths_yield_root_pattern() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("RootController")
        .annotated(rest_controller())
        .method(HandlerMethodDef::new("index").annotated(request_mapping()));

    let info = mapping_for(&handler_mapping, &handler_type, "index");
    assert_eq!(info.pattern_strings(), vec![""]);
    assert!(info.methods_condition().methods().is_empty());
}

#[test]
fn test_alias_conflict() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("AliasController").annotated(rest_controller()).method(
        HandlerMethodDef::new("conflict").annotated(request_mapping().with("value", "/a").with("path", "/b")),
    );

    let err = handler_mapping
        .get_mapping_for_method(&handler_type.methods[0], &handler_type)
        .unwrap_err();
    assert!(matches!(err, MappingError::AliasConflict { .. }));
}

#[test]
fn test_params_and_headers_are_unioned() {
    let handler_mapping = RequestMappingHandlerMapping::new();
    let handler_type = HandlerType::new("ParamsController")
        .annotated(rest_controller())
        .annotated(
            request_mapping()
                .with_value("/search")
                .with("params", ["api"])
                .with("headers", ["X-Tenant"]),
        )
        .method(
            HandlerMethodDef::new("search").annotated(
                get_mapping("")
                    .with("params", ["q"])
                    .with("headers", ["Accept=text/plain"]),
            ),
        );

    let info = mapping_for(&handler_mapping, &handler_type, "search");
    assert_eq!(info.params_condition().expressions().len(), 2);
    assert_eq!(info.headers_condition().expressions().len(), 1);
    assert_eq!(produces(&info), vec!["text/plain"]);
}

#[test]
fn test_merging_is_idempotent() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.register_annotation_type(post_json_type()).unwrap();
    handler_mapping.set_embedded_value_resolver(PropertyPlaceholderResolver::new().with_property("version", "v1"));
    handler_mapping.add_path_prefix("/${version}", HandlerTypePredicate::for_any_handler_type());

    let handler_type = HandlerType::new("IdempotentController")
        .annotated(rest_controller())
        .annotated(request_mapping().with_value("/things"))
        .method(HandlerMethodDef::new("create").annotated(Annotation::new(POST_JSON).with_value("/{id}")));

    let first = mapping_for(&handler_mapping, &handler_type, "create");
    let second = mapping_for(&handler_mapping, &handler_type, "create");
    assert_eq!(first, second);
    assert_eq!(first.pattern_strings(), vec!["/v1/things/{id}"]);
}

#[test]
#[traced_test]
fn test_build_logs_each_mapping() {
    let mut handler_mapping = RequestMappingHandlerMapping::new();
    handler_mapping.register_handler_type(
        HandlerType::new("UserController")
            .in_module("app")
            .annotated(rest_controller())
            .annotated(request_mapping().with_value("/users"))
            .method(HandlerMethodDef::new("list").annotated(get_mapping("")))
            .method(HandlerMethodDef::new("show").annotated(get_mapping("/{id}"))),
    );
    handler_mapping.register_handler_type(HandlerType::new("PlainType"));

    let registry = handler_mapping.build().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(logs_contain("Mapped {GET [/users/{id}]} onto app::UserController#show"));
    assert!(logs_contain("Skipping PlainType"));
    assert!(logs_contain("2 request mappings registered"));
}

//! End-to-end tests: build a mapping table from handler descriptors and
//! route requests through it

use axum::body::Body;
use axum::http::{Request, StatusCode};
use routemap_http::mapping::builtin::{
    controller, delete_mapping, get_mapping, post_mapping, put_mapping, request_body, request_mapping,
    rest_controller,
};
use routemap_http::mapping::media_type::{APPLICATION_JSON_VALUE, APPLICATION_XML_VALUE};
use routemap_http::{
    HandlerMethodDef, HandlerType, HttpMethod, LookupError, MappingConfig, MappingRegistry, MappingRequest,
    MethodParameter, RequestMappingHandlerMapping,
};
use std::sync::Arc;
use std::thread;

fn user_controller() -> HandlerType {
    HandlerType::new("UserController")
        .in_module("app::api")
        .annotated(rest_controller())
        .annotated(request_mapping().with_value("/users").with("produces", [APPLICATION_JSON_VALUE]))
        .method(HandlerMethodDef::new("list").annotated(get_mapping("")))
        .method(HandlerMethodDef::new("show").annotated(get_mapping("/{id:int}")))
        .method(HandlerMethodDef::new("me").annotated(get_mapping("/me")))
        .method(
            HandlerMethodDef::new("create")
                .annotated(post_mapping("").with("consumes", [APPLICATION_JSON_VALUE]))
                .parameter(MethodParameter::new("user", "NewUser").annotated(request_body(true))),
        )
        .method(
            HandlerMethodDef::new("update")
                .annotated(put_mapping("/{id:int}").with("consumes", [APPLICATION_JSON_VALUE]))
                .parameter(
                    MethodParameter::new("user", "Option<UserPatch>")
                        .annotated(request_body(true))
                        .optional(),
                ),
        )
        .method(HandlerMethodDef::new("delete").annotated(delete_mapping("/{id:int}")))
}

fn report_controller() -> HandlerType {
    HandlerType::new("ReportController")
        .in_module("app::reports")
        .annotated(controller())
        .method(
            HandlerMethodDef::new("json").annotated(
                get_mapping("/reports/{name}").with("produces", [APPLICATION_JSON_VALUE]),
            ),
        )
        .method(
            HandlerMethodDef::new("xml").annotated(
                get_mapping("/reports/{name}").with("produces", [APPLICATION_XML_VALUE]),
            ),
        )
        .method(
            HandlerMethodDef::new("files").annotated(get_mapping("/files/**")),
        )
}

fn build(config: MappingConfig) -> MappingRegistry {
    let mut handler_mapping = RequestMappingHandlerMapping::with_config(config);
    handler_mapping.register_handler_type(user_controller());
    handler_mapping.register_handler_type(report_controller());
    handler_mapping.build().unwrap()
}

fn registry() -> MappingRegistry {
    build(MappingConfig::default())
}

fn handler_name(registry: &MappingRegistry, request: &MappingRequest) -> String {
    registry
        .lookup(request)
        .unwrap()
        .map(|found| found.handler.to_string())
        .unwrap_or_default()
}

#[test]
fn test_table_contents() {
    let registry = registry();
    assert_eq!(registry.len(), 9);
    assert_eq!(registry.handler_methods_for_mapping_name("UC#show").len(), 1);
    assert_eq!(registry.handler_methods_for_mapping_name("RC#json").len(), 1);
    assert_eq!(registry.mappings_by_direct_path("/users").len(), 2);

    let json = registry.to_json();
    assert_eq!(json.as_array().map(Vec::len), Some(9));
    assert_eq!(json[0]["handler"]["type"], "app::api::UserController");
}

#[test]
fn test_static_pattern_beats_variable() {
    let registry = registry();
    assert_eq!(
        handler_name(&registry, &MappingRequest::new(HttpMethod::GET, "/users/me")),
        "UserController#me"
    );

    let found = registry
        .lookup(&MappingRequest::new(HttpMethod::GET, "/users/42"))
        .unwrap()
        .unwrap();
    assert_eq!(found.handler.to_string(), "UserController#show");
    assert_eq!(found.best_pattern, "/users/{id:int}");
    assert_eq!(found.path_params.get("id").map(String::as_str), Some("42"));
}

#[test]
fn test_constraint_rejects_value() {
    let registry = registry();
    assert!(registry
        .lookup(&MappingRequest::new(HttpMethod::GET, "/users/abc"))
        .unwrap()
        .is_none());
}

#[test]
fn test_unknown_path() {
    let registry = registry();
    assert!(registry
        .lookup(&MappingRequest::new(HttpMethod::GET, "/nothing/here"))
        .unwrap()
        .is_none());
}

#[test]
fn test_method_not_allowed() {
    let registry = registry();
    let err = registry
        .lookup(&MappingRequest::new(HttpMethod::PATCH, "/users/7"))
        .unwrap_err();
    assert_eq!(
        err,
        LookupError::MethodNotAllowed {
            method: HttpMethod::PATCH,
            allowed: vec![HttpMethod::GET, HttpMethod::PUT, HttpMethod::DELETE],
        }
    );
    assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_head_routes_to_get() {
    let registry = registry();
    assert_eq!(
        handler_name(&registry, &MappingRequest::new(HttpMethod::HEAD, "/users")),
        "UserController#list"
    );
}

#[test]
fn test_consumes_negotiation() {
    let registry = registry();

    let json = MappingRequest::new(HttpMethod::POST, "/users")
        .with_header("content-type", "application/json; charset=utf-8")
        .with_header("content-length", "17");
    assert_eq!(handler_name(&registry, &json), "UserController#create");

    let xml = MappingRequest::new(HttpMethod::POST, "/users")
        .with_header("content-type", APPLICATION_XML_VALUE)
        .with_header("content-length", "17");
    let err = registry.lookup(&xml).unwrap_err();
    assert_eq!(
        err,
        LookupError::UnsupportedMediaType {
            content_type: APPLICATION_XML_VALUE.to_string(),
            supported: vec![APPLICATION_JSON_VALUE.to_string()],
        }
    );
    assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[test]
fn test_optional_body_without_content_type() {
    let registry = registry();

    // update takes an optional body, so a bodiless PUT still routes
    let bodiless = MappingRequest::new(HttpMethod::PUT, "/users/3");
    assert_eq!(handler_name(&registry, &bodiless), "UserController#update");

    // create requires one; without a content type the body counts as octet-stream
    let err = registry
        .lookup(&MappingRequest::new(HttpMethod::POST, "/users").with_header("content-length", "4"))
        .unwrap_err();
    assert!(matches!(
        err,
        LookupError::UnsupportedMediaType { ref content_type, .. } if content_type == "application/octet-stream"
    ));
}

#[test]
fn test_produces_negotiation() {
    let registry = registry();

    let xml = MappingRequest::new(HttpMethod::GET, "/reports/sales").with_header("accept", "application/xml");
    assert_eq!(handler_name(&registry, &xml), "ReportController#xml");

    let json = MappingRequest::new(HttpMethod::GET, "/reports/sales")
        .with_header("accept", "application/xml;q=0.5, application/json");
    assert_eq!(handler_name(&registry, &json), "ReportController#json");

    let err = registry
        .lookup(&MappingRequest::new(HttpMethod::GET, "/users").with_header("accept", "text/html"))
        .unwrap_err();
    assert_eq!(
        err,
        LookupError::NotAcceptable {
            producible: vec![APPLICATION_JSON_VALUE.to_string()],
        }
    );
    assert_eq!(err.status_code(), StatusCode::NOT_ACCEPTABLE);
}

#[test]
fn test_catch_all_pattern() {
    let registry = registry();
    assert_eq!(
        handler_name(&registry, &MappingRequest::new(HttpMethod::GET, "/files/a/b/c.txt")),
        "ReportController#files"
    );
}

#[test]
fn test_trailing_slash_option() {
    let request = MappingRequest::new(HttpMethod::GET, "/users/me/");

    let lenient = registry();
    assert_eq!(handler_name(&lenient, &request), "UserController#me");

    let strict = build(MappingConfig {
        trailing_slash_match: false,
        ..MappingConfig::default()
    });
    assert!(strict.lookup(&request).unwrap().is_none());
}

#[test]
fn test_case_insensitive_option() {
    let request = MappingRequest::new(HttpMethod::GET, "/USERS/ME");
    assert!(registry().lookup(&request).unwrap().is_none());

    let insensitive = build(MappingConfig {
        case_sensitive_match: false,
        ..MappingConfig::default()
    });
    assert_eq!(handler_name(&insensitive, &request), "UserController#me");
}

#[test]
fn test_lookup_from_axum_request() {
    let registry = registry();
    let request = Request::builder()
        .method("DELETE")
        .uri("/users/9?soft=true")
        .body(Body::empty())
        .unwrap();

    let request = MappingRequest::from_http(&request).unwrap();
    assert_eq!(request.query_param("soft"), Some("true"));
    assert_eq!(handler_name(&registry, &request), "UserController#delete");
}

#[test]
fn test_registry_is_shared_across_threads() {
    let registry = Arc::new(registry());

    let workers: Vec<_> = (1..=4)
        .map(|id| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let request = MappingRequest::new(HttpMethod::GET, &format!("/users/{}", id));
                registry
                    .lookup(&request)
                    .unwrap()
                    .and_then(|found| found.path_params.get("id").cloned())
            })
        })
        .collect();

    for (id, worker) in (1..=4).zip(workers) {
        assert_eq!(worker.join().unwrap(), Some(id.to_string()));
    }
}

//! Builds a small mapping table and routes a few requests through it.
//!
//! Run with `cargo run -p routemap-http --example mapping_table`.
//! `API_VERSION` sets the `api.version` property used by the prefix and
//! `ROUTEMAP_PATH_PREFIXES` adds configured prefixes.

use routemap_core::AppConfigTrait;
use routemap_http::mapping::builtin::{get_mapping, post_mapping, request_body, request_mapping, rest_controller};
use routemap_http::mapping::media_type::APPLICATION_JSON_VALUE;
use routemap_http::{
    init_logging, HandlerMethodDef, HandlerType, HandlerTypePredicate, HttpMethod, LoggingConfig, MappingConfig,
    MappingRequest, MethodParameter, PropertyPlaceholderResolver, RequestMappingHandlerMapping,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging(LoggingConfig::development().with_service("mapping-table-demo"))?;

    let config = MappingConfig::from_env()?;
    let version = std::env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string());

    let mut handler_mapping = RequestMappingHandlerMapping::with_config(config);
    handler_mapping.set_embedded_value_resolver(
        PropertyPlaceholderResolver::new().with_property("api.version", version),
    );
    handler_mapping.add_path_prefix("/api/${api.version}", HandlerTypePredicate::for_base_module(["shop::api"]));

    handler_mapping.register_handler_type(
        HandlerType::new("ProductController")
            .in_module("shop::api")
            .annotated(rest_controller())
            .annotated(request_mapping().with_value("/products"))
            .method(HandlerMethodDef::new("list").annotated(get_mapping("")))
            .method(HandlerMethodDef::new("show").annotated(get_mapping("/{id:int}")))
            .method(
                HandlerMethodDef::new("create")
                    .annotated(post_mapping("").with("consumes", [APPLICATION_JSON_VALUE]))
                    .parameter(MethodParameter::new("product", "NewProduct").annotated(request_body(true))),
            ),
    );
    handler_mapping.register_handler_type(
        HandlerType::new("HealthController")
            .in_module("shop::ops")
            .annotated(rest_controller())
            .method(HandlerMethodDef::new("health").annotated(get_mapping("/health"))),
    );

    let registry = handler_mapping.build()?;
    println!("{}", serde_json::to_string_pretty(&registry.to_json())?);

    let requests = [
        MappingRequest::new(HttpMethod::GET, "/api/v1/products/12"),
        MappingRequest::new(HttpMethod::POST, "/api/v1/products")
            .with_header("content-type", "text/plain")
            .with_header("content-length", "5"),
        MappingRequest::new(HttpMethod::DELETE, "/api/v1/products/12"),
        MappingRequest::new(HttpMethod::GET, "/health"),
    ];

    for request in &requests {
        match registry.lookup(request) {
            Ok(Some(found)) => println!(
                "{} {} -> {} {:?}",
                request.method(),
                request.path(),
                found.handler,
                found.path_params
            ),
            Ok(None) => println!("{} {} -> no handler", request.method(), request.path()),
            Err(err) => println!(
                "{} {} -> {} ({})",
                request.method(),
                request.path(),
                err.status_code(),
                err
            ),
        }
    }

    Ok(())
}

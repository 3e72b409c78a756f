//! Built-in routing and stereotype annotations
//!
//! `@RequestMapping` is the base routing annotation. The method shorthands
//! (`@GetMapping` and friends) are meta-annotated with it and fix the method.
//! `@RestController` composes `@Controller` and `@ResponseBody`.

use super::annotation::{AliasFor, Annotation, AnnotationType, AttributeValue};
use crate::routing::HttpMethod;

pub const REQUEST_MAPPING: &str = "RequestMapping";
pub const GET_MAPPING: &str = "GetMapping";
pub const POST_MAPPING: &str = "PostMapping";
pub const PUT_MAPPING: &str = "PutMapping";
pub const DELETE_MAPPING: &str = "DeleteMapping";
pub const PATCH_MAPPING: &str = "PatchMapping";
pub const CONTROLLER: &str = "Controller";
pub const REST_CONTROLLER: &str = "RestController";
pub const RESPONSE_BODY: &str = "ResponseBody";
pub const REQUEST_BODY: &str = "RequestBody";

/// Attributes shared by the routing annotations
const MAPPING_ATTRIBUTES: [&str; 7] = ["value", "path", "params", "headers", "consumes", "produces", "name"];

fn request_mapping_type() -> AnnotationType {
    AnnotationType::new(REQUEST_MAPPING)
        .attribute("name", "")
        .attribute("value", AttributeValue::empty_strings())
        .attribute("path", AttributeValue::empty_strings())
        .attribute("method", AttributeValue::Methods(Vec::new()))
        .attribute("params", AttributeValue::empty_strings())
        .attribute("headers", AttributeValue::empty_strings())
        .attribute("consumes", AttributeValue::empty_strings())
        .attribute("produces", AttributeValue::empty_strings())
        .alias(AliasFor::new("value", REQUEST_MAPPING, "path"))
}

fn shorthand_type(name: &str, method: HttpMethod) -> AnnotationType {
    let mut annotation_type = AnnotationType::new(name)
        .meta_annotated(Annotation::new(REQUEST_MAPPING).with("method", method));

    for attribute in MAPPING_ATTRIBUTES {
        let default = if attribute == "name" {
            AttributeValue::from("")
        } else {
            AttributeValue::empty_strings()
        };
        annotation_type = annotation_type.attribute(attribute, default);
    }

    annotation_type
        .alias(AliasFor::new("value", REQUEST_MAPPING, "path"))
        .alias_to("path", REQUEST_MAPPING)
        .alias_to("params", REQUEST_MAPPING)
        .alias_to("headers", REQUEST_MAPPING)
        .alias_to("consumes", REQUEST_MAPPING)
        .alias_to("produces", REQUEST_MAPPING)
        .alias_to("name", REQUEST_MAPPING)
}

/// Annotation types every registry starts with, in dependency order
pub(crate) fn builtin_types() -> Vec<AnnotationType> {
    vec![
        request_mapping_type(),
        shorthand_type(GET_MAPPING, HttpMethod::GET),
        shorthand_type(POST_MAPPING, HttpMethod::POST),
        shorthand_type(PUT_MAPPING, HttpMethod::PUT),
        shorthand_type(DELETE_MAPPING, HttpMethod::DELETE),
        shorthand_type(PATCH_MAPPING, HttpMethod::PATCH),
        AnnotationType::new(CONTROLLER).attribute("value", ""),
        AnnotationType::new(RESPONSE_BODY),
        AnnotationType::new(REST_CONTROLLER)
            .attribute("value", "")
            .meta_annotated(controller())
            .meta_annotated(response_body())
            .alias(AliasFor::new("value", CONTROLLER, "value")),
        AnnotationType::new(REQUEST_BODY).attribute("required", true),
    ]
}

/// `@RequestMapping` with no attributes set
pub fn request_mapping() -> Annotation {
    Annotation::new(REQUEST_MAPPING)
}

pub fn get_mapping(path: &str) -> Annotation {
    shorthand(GET_MAPPING, path)
}

pub fn post_mapping(path: &str) -> Annotation {
    shorthand(POST_MAPPING, path)
}

pub fn put_mapping(path: &str) -> Annotation {
    shorthand(PUT_MAPPING, path)
}

pub fn delete_mapping(path: &str) -> Annotation {
    shorthand(DELETE_MAPPING, path)
}

pub fn patch_mapping(path: &str) -> Annotation {
    shorthand(PATCH_MAPPING, path)
}

fn shorthand(name: &str, path: &str) -> Annotation {
    let annotation = Annotation::new(name);
    if path.is_empty() {
        annotation
    } else {
        annotation.with_value([path])
    }
}

pub fn controller() -> Annotation {
    Annotation::new(CONTROLLER)
}

pub fn rest_controller() -> Annotation {
    Annotation::new(REST_CONTROLLER)
}

pub fn response_body() -> Annotation {
    Annotation::new(RESPONSE_BODY)
}

pub fn request_body(required: bool) -> Annotation {
    Annotation::new(REQUEST_BODY).with("required", required)
}

//! Handler descriptors
//!
//! Handler types are described as data: a name, the module they live in,
//! their annotations, the types they extend or implement, and their methods.
//! Mapping resolution only ever reads these descriptors.

use super::annotation::Annotation;
use serde::Serialize;
use std::sync::Arc;

/// A parameter of a handler method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: String,
    pub type_name: String,
    pub annotations: Vec<Annotation>,
    /// Whether the parameter type is an optional wrapper
    pub optional: bool,
}

impl MethodParameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            annotations: Vec::new(),
            optional: false,
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Mark the parameter type as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A method declared on a handler type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMethodDef {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub parameters: Vec<MethodParameter>,
}

impl HandlerMethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            parameters: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn parameter(mut self, parameter: MethodParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A handler type candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerType {
    pub name: String,
    /// Module path, `::` separated (e.g. `app::api::users`)
    pub module_path: String,
    pub annotations: Vec<Annotation>,
    /// Names of the types this type extends or implements
    pub supertypes: Vec<String>,
    pub methods: Vec<HandlerMethodDef>,
}

impl HandlerType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_path: String::new(),
            annotations: Vec::new(),
            supertypes: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn in_module(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn implements(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn method(mut self, method: HandlerMethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// `module::Name`, or just the name outside any module
    pub fn qualified_name(&self) -> String {
        if self.module_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.module_path, self.name)
        }
    }

    /// Whether the type lives in `base` or one of its submodules
    pub fn is_in_module(&self, base: &str) -> bool {
        let base = base.trim_end_matches("::");
        self.module_path == base
            || self
                .module_path
                .strip_prefix(base)
                .map(|rest| rest.starts_with("::"))
                .unwrap_or(false)
    }

    /// Whether the type is, extends or implements `type_name`
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.name == type_name
            || self.qualified_name() == type_name
            || self.supertypes.iter().any(|supertype| supertype == type_name)
    }
}

/// A resolved handler: a method bound to its declaring type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerMethod {
    #[serde(rename = "type", serialize_with = "serialize_type_name")]
    handler_type: Arc<HandlerType>,
    #[serde(rename = "method", serialize_with = "serialize_method_name")]
    method: Arc<HandlerMethodDef>,
}

fn serialize_type_name<S: serde::Serializer>(
    handler_type: &Arc<HandlerType>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&handler_type.qualified_name())
}

fn serialize_method_name<S: serde::Serializer>(
    method: &Arc<HandlerMethodDef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&method.name)
}

impl HandlerMethod {
    pub fn new(handler_type: Arc<HandlerType>, method: Arc<HandlerMethodDef>) -> Self {
        Self { handler_type, method }
    }

    pub fn handler_type(&self) -> &HandlerType {
        &self.handler_type
    }

    pub fn method(&self) -> &HandlerMethodDef {
        &self.method
    }

    /// `module::Type#method`
    pub fn qualified_name(&self) -> String {
        format!("{}#{}", self.handler_type.qualified_name(), self.method.name)
    }
}

impl std::fmt::Display for HandlerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.handler_type.name, self.method.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_membership() {
        let handler_type = HandlerType::new("UserController").in_module("app::api::users");
        assert!(handler_type.is_in_module("app::api"));
        assert!(handler_type.is_in_module("app::api::users"));
        assert!(handler_type.is_in_module("app::"));
        assert!(!handler_type.is_in_module("app::ap"));
        assert!(!handler_type.is_in_module("other"));
    }

    #[test]
    fn test_assignability() {
        let handler_type = HandlerType::new("UserController")
            .in_module("app")
            .implements("CrudController");
        assert!(handler_type.is_assignable_to("UserController"));
        assert!(handler_type.is_assignable_to("app::UserController"));
        assert!(handler_type.is_assignable_to("CrudController"));
        assert!(!handler_type.is_assignable_to("AdminController"));
    }

    #[test]
    fn test_handler_method_display() {
        let handler_type = Arc::new(HandlerType::new("UserController").in_module("app::api"));
        let method = Arc::new(HandlerMethodDef::new("list"));
        let handler = HandlerMethod::new(handler_type, method);

        assert_eq!(handler.to_string(), "UserController#list");
        assert_eq!(handler.qualified_name(), "app::api::UserController#list");
        assert_eq!(
            serde_json::to_value(&handler).unwrap(),
            serde_json::json!({"type": "app::api::UserController", "method": "list"})
        );
    }
}

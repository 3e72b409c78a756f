//! Handler type predicates used to select which handlers get a path prefix

use super::annotation::AnnotationRegistry;
use super::handler::HandlerType;
use crate::errors::{MappingError, MappingResult};
use std::sync::Arc;

type CustomPredicate = dyn Fn(&HandlerType) -> Result<bool, String> + Send + Sync;

#[derive(Clone)]
enum Selector {
    Any,
    Annotation(Vec<String>),
    BaseModule(Vec<String>),
    AssignableType(Vec<String>),
    Custom(Arc<CustomPredicate>),
    And(Box<Selector>, Box<Selector>),
    Or(Box<Selector>, Box<Selector>),
    Not(Box<Selector>),
}

/// Predicate over handler types
#[derive(Clone)]
pub struct HandlerTypePredicate {
    selector: Selector,
}

impl HandlerTypePredicate {
    /// Matches every handler type
    pub fn for_any_handler_type() -> Self {
        Self { selector: Selector::Any }
    }

    /// Matches types annotated (directly or through meta-annotations) with any of `annotations`
    pub fn for_annotation<S: Into<String>>(annotations: impl IntoIterator<Item = S>) -> Self {
        Self {
            selector: Selector::Annotation(annotations.into_iter().map(Into::into).collect()),
        }
    }

    /// Matches types declared in any of the base modules or their submodules
    pub fn for_base_module<S: Into<String>>(modules: impl IntoIterator<Item = S>) -> Self {
        Self {
            selector: Selector::BaseModule(modules.into_iter().map(Into::into).collect()),
        }
    }

    /// Matches types that are, extend or implement any of `types`
    pub fn for_assignable_type<S: Into<String>>(types: impl IntoIterator<Item = S>) -> Self {
        Self {
            selector: Selector::AssignableType(types.into_iter().map(Into::into).collect()),
        }
    }

    /// Arbitrary check; an `Err` aborts mapping registration
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&HandlerType) -> Result<bool, String> + Send + Sync + 'static,
    {
        Self {
            selector: Selector::Custom(Arc::new(predicate)),
        }
    }

    pub fn and(self, other: HandlerTypePredicate) -> Self {
        Self {
            selector: Selector::And(Box::new(self.selector), Box::new(other.selector)),
        }
    }

    pub fn or(self, other: HandlerTypePredicate) -> Self {
        Self {
            selector: Selector::Or(Box::new(self.selector), Box::new(other.selector)),
        }
    }

    pub fn negate(self) -> Self {
        Self {
            selector: Selector::Not(Box::new(self.selector)),
        }
    }

    /// Evaluate the predicate for a handler type
    pub fn test(&self, handler_type: &HandlerType, annotations: &AnnotationRegistry) -> MappingResult<bool> {
        Self::evaluate(&self.selector, handler_type, annotations)
    }

    fn evaluate(
        selector: &Selector,
        handler_type: &HandlerType,
        annotations: &AnnotationRegistry,
    ) -> MappingResult<bool> {
        match selector {
            Selector::Any => Ok(true),
            Selector::Annotation(names) => Ok(names
                .iter()
                .any(|name| annotations.is_annotation_present(&handler_type.annotations, name))),
            Selector::BaseModule(modules) => {
                Ok(modules.iter().any(|module| handler_type.is_in_module(module)))
            }
            Selector::AssignableType(types) => {
                Ok(types.iter().any(|name| handler_type.is_assignable_to(name)))
            }
            Selector::Custom(predicate) => predicate(handler_type)
                .map_err(|message| MappingError::predicate_failed(handler_type.qualified_name(), message)),
            Selector::And(left, right) => Ok(Self::evaluate(left, handler_type, annotations)?
                && Self::evaluate(right, handler_type, annotations)?),
            Selector::Or(left, right) => Ok(Self::evaluate(left, handler_type, annotations)?
                || Self::evaluate(right, handler_type, annotations)?),
            Selector::Not(inner) => Ok(!Self::evaluate(inner, handler_type, annotations)?),
        }
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Any => write!(f, "any"),
            Selector::Annotation(names) => write!(f, "annotation{:?}", names),
            Selector::BaseModule(modules) => write!(f, "module{:?}", modules),
            Selector::AssignableType(types) => write!(f, "assignable{:?}", types),
            Selector::Custom(_) => write!(f, "custom"),
            Selector::And(left, right) => write!(f, "({:?} && {:?})", left, right),
            Selector::Or(left, right) => write!(f, "({:?} || {:?})", left, right),
            Selector::Not(inner) => write!(f, "!{:?}", inner),
        }
    }
}

impl std::fmt::Debug for HandlerTypePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HandlerTypePredicate({:?})", self.selector)
    }
}

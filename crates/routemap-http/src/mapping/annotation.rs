//! Annotation model
//!
//! Handlers describe their routing metadata with [`Annotation`] values: a name
//! plus a bag of attributes. Annotation types live in an [`AnnotationRegistry`]
//! which knows each type's attribute defaults, the meta-annotations it is
//! composed of, and a static alias table ([`AliasFor`]).
//!
//! [`AnnotationRegistry::merged_attributes`] flattens a (possibly composed)
//! annotation into the attributes of a target annotation type before any
//! mapping logic runs. Alias edges may point inside the declaring type or at a
//! directly declared meta-annotation.

use crate::errors::{MappingError, MappingResult};
use crate::routing::HttpMethod;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Value of a single annotation attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Strings(Vec<String>),
    Bool(bool),
    Methods(Vec<HttpMethod>),
}

impl AttributeValue {
    /// Empty strings and empty arrays count as "not set"
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Str(value) => value.is_empty(),
            AttributeValue::Strings(values) => values.is_empty(),
            AttributeValue::Methods(methods) => methods.is_empty(),
            AttributeValue::Bool(_) => false,
        }
    }

    pub fn empty_strings() -> Self {
        AttributeValue::Strings(Vec::new())
    }

    /// A single non-empty string is the same value as a one-element array
    fn normalized(&self) -> AttributeValue {
        match self {
            AttributeValue::Str(value) if !value.is_empty() => AttributeValue::Strings(vec![value.clone()]),
            AttributeValue::Str(_) => AttributeValue::empty_strings(),
            other => other.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Str(_) => "string",
            AttributeValue::Strings(_) => "string array",
            AttributeValue::Bool(_) => "boolean",
            AttributeValue::Methods(_) => "method array",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::Strings(values)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        AttributeValue::Strings(values.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttributeValue {
    fn from(values: [&str; N]) -> Self {
        AttributeValue::Strings(values.iter().map(|v| v.to_string()).collect())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<HttpMethod> for AttributeValue {
    fn from(method: HttpMethod) -> Self {
        AttributeValue::Methods(vec![method])
    }
}

impl From<Vec<HttpMethod>> for AttributeValue {
    fn from(methods: Vec<HttpMethod>) -> Self {
        AttributeValue::Methods(methods)
    }
}

/// An annotation instance placed on a type, method or parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    name: String,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute value
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// Shorthand for the `value` attribute
    pub fn with_value(self, value: impl Into<AttributeValue>) -> Self {
        self.with("value", value)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }
}

/// Static alias edge: `attribute` of the declaring annotation type stands for
/// `target_attribute` of `target_annotation`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasFor {
    pub attribute: String,
    pub target_annotation: String,
    pub target_attribute: String,
}

impl AliasFor {
    pub fn new(
        attribute: impl Into<String>,
        target_annotation: impl Into<String>,
        target_attribute: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            target_annotation: target_annotation.into(),
            target_attribute: target_attribute.into(),
        }
    }
}

/// Definition of an annotation type
#[derive(Debug, Clone)]
pub struct AnnotationType {
    name: String,
    defaults: BTreeMap<String, AttributeValue>,
    meta: Vec<Annotation>,
    aliases: Vec<AliasFor>,
}

impl AnnotationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: BTreeMap::new(),
            meta: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Declare an attribute with its default value
    pub fn attribute(mut self, name: impl Into<String>, default: impl Into<AttributeValue>) -> Self {
        self.defaults.insert(name.into(), default.into());
        self
    }

    /// Declare a meta-annotation with the attribute values it fixes
    pub fn meta_annotated(mut self, annotation: Annotation) -> Self {
        self.meta.push(annotation);
        self
    }

    /// Declare an alias edge starting at one of this type's attributes
    pub fn alias(mut self, alias: AliasFor) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Alias `attribute` to the attribute of the same name on `target_annotation`
    pub fn alias_to(self, attribute: &str, target_annotation: &str) -> Self {
        self.alias(AliasFor::new(attribute, target_annotation, attribute))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta_annotations(&self) -> &[Annotation] {
        &self.meta
    }

    pub fn aliases(&self) -> &[AliasFor] {
        &self.aliases
    }

    fn declares(&self, attribute: &str) -> bool {
        self.defaults.contains_key(attribute)
    }

    /// Other attributes standing for the same value as `attribute`: local
    /// alias pairs, and mirrors aliasing the same meta-annotation attribute
    fn alias_partners<'a>(&'a self, attribute: &str) -> Vec<&'a str> {
        let mut partners = Vec::new();
        for alias in self.aliases.iter().filter(|alias| alias.target_annotation == self.name) {
            if alias.attribute == attribute {
                partners.push(alias.target_attribute.as_str());
            } else if alias.target_attribute == attribute {
                partners.push(alias.attribute.as_str());
            }
        }

        let targets: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .filter(|alias| alias.attribute == attribute && alias.target_annotation != self.name)
            .map(|alias| (alias.target_annotation.as_str(), alias.target_attribute.as_str()))
            .collect();
        for alias in &self.aliases {
            if alias.attribute != attribute
                && targets.contains(&(alias.target_annotation.as_str(), alias.target_attribute.as_str()))
            {
                partners.push(alias.attribute.as_str());
            }
        }

        partners.sort_unstable();
        partners.dedup();
        partners
    }
}

/// Flat attribute view of an annotation after alias and meta resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeMap {
    annotation: String,
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeMap {
    /// Name of the annotation type these attributes belong to
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn get(&self, attribute: &str) -> Option<&AttributeValue> {
        self.values.get(attribute)
    }

    /// String-array attribute; a single string counts as a one-element array
    pub fn strings(&self, attribute: &str) -> MappingResult<Vec<String>> {
        match self.values.get(attribute) {
            None => Ok(Vec::new()),
            Some(AttributeValue::Str(value)) if value.is_empty() => Ok(Vec::new()),
            Some(AttributeValue::Str(value)) => Ok(vec![value.clone()]),
            Some(AttributeValue::Strings(values)) => Ok(values.clone()),
            Some(other) => Err(self.invalid(attribute, "string array", other)),
        }
    }

    /// Single string attribute; empty means unset
    pub fn string(&self, attribute: &str) -> MappingResult<Option<String>> {
        match self.values.get(attribute) {
            None => Ok(None),
            Some(AttributeValue::Str(value)) => Ok(Some(value.clone()).filter(|v| !v.is_empty())),
            Some(other) => Err(self.invalid(attribute, "string", other)),
        }
    }

    pub fn boolean(&self, attribute: &str) -> MappingResult<Option<bool>> {
        match self.values.get(attribute) {
            None => Ok(None),
            Some(AttributeValue::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(self.invalid(attribute, "boolean", other)),
        }
    }

    /// Method-array attribute; method names given as strings are parsed
    pub fn methods(&self, attribute: &str) -> MappingResult<Vec<HttpMethod>> {
        match self.values.get(attribute) {
            None => Ok(Vec::new()),
            Some(AttributeValue::Methods(methods)) => Ok(methods.clone()),
            Some(value @ (AttributeValue::Strings(_) | AttributeValue::Str(_))) => {
                let names = match value {
                    AttributeValue::Str(name) if name.is_empty() => Vec::new(),
                    AttributeValue::Str(name) => vec![name.clone()],
                    AttributeValue::Strings(names) => names.clone(),
                    _ => Vec::new(),
                };
                names
                    .iter()
                    .map(|name| {
                        name.parse::<HttpMethod>().map_err(|_| MappingError::InvalidAttribute {
                            annotation: self.annotation.clone(),
                            attribute: attribute.to_string(),
                            expected: format!("an HTTP method name, got '{}'", name),
                        })
                    })
                    .collect()
            }
            Some(other) => Err(self.invalid(attribute, "method array", other)),
        }
    }

    fn invalid(&self, attribute: &str, expected: &str, actual: &AttributeValue) -> MappingError {
        MappingError::InvalidAttribute {
            annotation: self.annotation.clone(),
            attribute: attribute.to_string(),
            expected: format!("{}, got {}", expected, actual.kind()),
        }
    }
}

/// Registry of annotation types
#[derive(Debug, Clone)]
pub struct AnnotationRegistry {
    types: HashMap<String, AnnotationType>,
}

impl Default for AnnotationRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl AnnotationRegistry {
    /// Registry without any annotation types
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Registry preloaded with the routing and stereotype annotations
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for annotation_type in super::builtin::builtin_types() {
            registry.types.insert(annotation_type.name.clone(), annotation_type);
        }
        registry
    }

    /// Register an annotation type.
    ///
    /// Meta-annotations must already be registered and names cannot be
    /// redefined, so the meta graph stays acyclic.
    pub fn register(&mut self, annotation_type: AnnotationType) -> MappingResult<()> {
        let invalid = |message: String| MappingError::InvalidAnnotationDefinition {
            annotation: annotation_type.name.clone(),
            message,
        };

        if annotation_type.name.is_empty() {
            return Err(invalid("annotation name must not be empty".to_string()));
        }
        if self.types.contains_key(&annotation_type.name) {
            return Err(invalid("annotation type is already registered".to_string()));
        }

        for meta in &annotation_type.meta {
            let meta_type = self.types.get(meta.name()).ok_or_else(|| {
                invalid(format!("meta-annotation @{} is not registered", meta.name()))
            })?;
            if let Some(undeclared) = meta.attributes.keys().find(|a| !meta_type.declares(a)) {
                return Err(invalid(format!(
                    "meta-annotation @{} has no attribute '{}'",
                    meta.name(),
                    undeclared
                )));
            }
        }

        for alias in &annotation_type.aliases {
            if !annotation_type.declares(&alias.attribute) {
                return Err(invalid(format!(
                    "alias attribute '{}' is not declared",
                    alias.attribute
                )));
            }

            let target_declares = if alias.target_annotation == annotation_type.name {
                annotation_type.declares(&alias.target_attribute)
            } else if annotation_type
                .meta
                .iter()
                .any(|meta| meta.name() == alias.target_annotation)
            {
                self.types
                    .get(&alias.target_annotation)
                    .map(|target| target.declares(&alias.target_attribute))
                    .unwrap_or(false)
            } else {
                return Err(invalid(format!(
                    "alias '{}' targets @{}, which is not a declared meta-annotation",
                    alias.attribute, alias.target_annotation
                )));
            };

            if !target_declares {
                return Err(invalid(format!(
                    "alias target @{}.{} does not exist",
                    alias.target_annotation, alias.target_attribute
                )));
            }
        }

        tracing::debug!(
            target: "routemap::mapping",
            "Registered annotation type @{} ({} meta-annotations, {} aliases)",
            annotation_type.name,
            annotation_type.meta.len(),
            annotation_type.aliases.len()
        );
        self.types.insert(annotation_type.name.clone(), annotation_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AnnotationType> {
        self.types.get(name)
    }

    /// Whether `annotation_name` is `target` or is (transitively) meta-annotated with it
    pub fn is_or_has_meta(&self, annotation_name: &str, target: &str) -> bool {
        if annotation_name == target {
            return true;
        }
        self.types
            .get(annotation_name)
            .map(|annotation_type| {
                annotation_type
                    .meta
                    .iter()
                    .any(|meta| self.is_or_has_meta(meta.name(), target))
            })
            .unwrap_or(false)
    }

    /// Whether any of `annotations` is `target`, directly or through meta-annotations
    pub fn is_annotation_present(&self, annotations: &[Annotation], target: &str) -> bool {
        annotations
            .iter()
            .any(|annotation| self.is_or_has_meta(annotation.name(), target))
    }

    /// Find the single annotation on an element that resolves to `target`.
    ///
    /// More than one such annotation on the same element is an error.
    pub fn find_merged(
        &self,
        element: &str,
        annotations: &[Annotation],
        target: &str,
    ) -> MappingResult<Option<AttributeMap>> {
        let mut found: Vec<(&str, AttributeMap)> = Vec::new();
        for annotation in annotations {
            if let Some(merged) = self.merged_attributes(annotation, target)? {
                found.push((annotation.name(), merged));
            }
        }

        if found.len() > 1 {
            return Err(MappingError::MultipleMappingAnnotations {
                element: element.to_string(),
                annotations: found.iter().map(|(name, _)| format!("@{}", name)).collect(),
            });
        }
        Ok(found.pop().map(|(_, merged)| merged))
    }

    /// Flatten `annotation` into the attributes of `target`.
    ///
    /// Returns `None` when the annotation is neither `target` nor composed from
    /// it. Unregistered annotation types never resolve.
    pub fn merged_attributes(
        &self,
        annotation: &Annotation,
        target: &str,
    ) -> MappingResult<Option<AttributeMap>> {
        let Some(annotation_type) = self.types.get(annotation.name()) else {
            return Ok(None);
        };

        if let Some(undeclared) = annotation
            .attributes
            .keys()
            .find(|attribute| !annotation_type.declares(attribute))
        {
            return Err(MappingError::InvalidAttribute {
                annotation: annotation_type.name.clone(),
                attribute: undeclared.clone(),
                expected: "a declared attribute".to_string(),
            });
        }

        if annotation_type.name == target {
            let mut values = annotation_type.defaults.clone();
            values.extend(annotation.attributes.clone());
            Self::mirror_local_aliases(annotation_type, &mut values)?;
            return Ok(Some(AttributeMap {
                annotation: target.to_string(),
                values,
            }));
        }

        for meta in &annotation_type.meta {
            if !self.is_or_has_meta(meta.name(), target) {
                continue;
            }
            let meta_instance = self.apply_meta_overrides(annotation_type, annotation, meta)?;
            if let Some(merged) = self.merged_attributes(&meta_instance, target)? {
                return Ok(Some(merged));
            }
        }

        Ok(None)
    }

    /// Copy alias values of `annotation` onto the meta-annotation they target.
    ///
    /// A non-empty alias value (explicit, or the composed type's default)
    /// replaces the value the meta-annotation declares.
    fn apply_meta_overrides(
        &self,
        annotation_type: &AnnotationType,
        annotation: &Annotation,
        meta: &Annotation,
    ) -> MappingResult<Annotation> {
        let mut overrides: BTreeMap<&str, (&str, &AttributeValue)> = BTreeMap::new();

        for alias in annotation_type
            .aliases
            .iter()
            .filter(|alias| alias.target_annotation == meta.name())
        {
            let value = annotation
                .attributes
                .get(&alias.attribute)
                .or_else(|| annotation_type.defaults.get(&alias.attribute));
            let Some(value) = value.filter(|value| !value.is_empty()) else {
                continue;
            };

            match overrides.get(alias.target_attribute.as_str()) {
                Some((other_attribute, existing)) if existing.normalized() != value.normalized() => {
                    return Err(MappingError::AliasConflict {
                        annotation: annotation_type.name.clone(),
                        attribute: other_attribute.to_string(),
                        alias: alias.attribute.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    overrides.insert(alias.target_attribute.as_str(), (alias.attribute.as_str(), value));
                }
            }
        }

        let mut meta_instance = meta.clone();
        let meta_type = self.types.get(meta.name());
        for (target_attribute, (_, value)) in overrides {
            // The override replaces the whole alias set of the attribute
            if let Some(meta_type) = meta_type {
                for partner in meta_type.alias_partners(target_attribute) {
                    meta_instance.attributes.remove(partner);
                }
            }
            meta_instance
                .attributes
                .insert(target_attribute.to_string(), value.clone());
        }

        Ok(meta_instance)
    }

    /// Mirror values across aliases declared within one annotation type
    fn mirror_local_aliases(
        annotation_type: &AnnotationType,
        values: &mut BTreeMap<String, AttributeValue>,
    ) -> MappingResult<()> {
        for alias in annotation_type
            .aliases
            .iter()
            .filter(|alias| alias.target_annotation == annotation_type.name)
        {
            let alias_value = values.get(&alias.attribute).filter(|v| !v.is_empty()).cloned();
            let target_value = values
                .get(&alias.target_attribute)
                .filter(|v| !v.is_empty())
                .cloned();

            match (alias_value, target_value) {
                (Some(alias_value), Some(target_value))
                    if alias_value.normalized() != target_value.normalized() =>
                {
                    return Err(MappingError::AliasConflict {
                        annotation: annotation_type.name.clone(),
                        attribute: alias.target_attribute.clone(),
                        alias: alias.attribute.clone(),
                    });
                }
                (Some(value), None) => {
                    values.insert(alias.target_attribute.clone(), value);
                }
                (None, Some(value)) => {
                    values.insert(alias.attribute.clone(), value);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

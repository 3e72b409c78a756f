//! Media types used by consumes/produces conditions
//!
//! A [`MediaType`] is `type/subtype` plus optional parameters. Wildcards are
//! supported on both parts (`*/*`, `text/*`) and on the subtype prefix of a
//! structured syntax suffix (`application/*+json`).

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

pub const ALL_VALUE: &str = "*/*";
pub const APPLICATION_JSON_VALUE: &str = "application/json";
pub const APPLICATION_XML_VALUE: &str = "application/xml";
pub const APPLICATION_OCTET_STREAM_VALUE: &str = "application/octet-stream";
pub const TEXT_PLAIN_VALUE: &str = "text/plain";

const WILDCARD: &str = "*";
const QUALITY_PARAMETER: &str = "q";

/// Error raised for a malformed media type string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid media type \"{value}\": {reason}")]
pub struct MediaTypeError {
    pub value: String,
    pub reason: String,
}

impl MediaTypeError {
    fn new(value: &str, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A parsed media type such as `application/json;charset=utf-8`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType {
    main_type: String,
    sub_type: String,
    parameters: BTreeMap<String, String>,
}

impl MediaType {
    /// Create a media type without parameters
    pub fn new(main_type: &str, sub_type: &str) -> Self {
        Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn all() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    pub fn application_json() -> Self {
        Self::new("application", "json")
    }

    pub fn application_xml() -> Self {
        Self::new("application", "xml")
    }

    pub fn application_octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// Add a parameter, replacing any previous value for the same name
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters
            .insert(name.to_ascii_lowercase(), value.trim_matches('"').to_string());
        self
    }

    /// Parse a single media type
    pub fn parse(value: &str) -> Result<Self, MediaTypeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MediaTypeError::new(value, "must not be empty"));
        }
        // "*" is accepted as a shorthand for "*/*"
        let trimmed = if trimmed == WILDCARD { ALL_VALUE } else { trimmed };

        let parsed: mime::Mime = trimmed
            .parse()
            .map_err(|error: mime::FromStrError| MediaTypeError::new(value, error.to_string()))?;

        let main_type = parsed.type_().as_str();
        let sub_type = match parsed.suffix() {
            Some(suffix) => format!("{}+{}", parsed.subtype().as_str(), suffix.as_str()),
            None => parsed.subtype().as_str().to_string(),
        };
        if sub_type.is_empty() {
            return Err(MediaTypeError::new(value, "subtype must not be empty"));
        }
        if main_type == WILDCARD && sub_type != WILDCARD {
            return Err(MediaTypeError::new(
                value,
                "wildcard type is legal only in '*/*' (all media types)",
            ));
        }

        let mut media_type = MediaType::new(main_type, &sub_type);
        for (name, param_value) in parsed.params() {
            media_type = media_type.with_parameter(name.as_str(), param_value.as_str());
        }

        if let Some(quality) = media_type.parameters.get(QUALITY_PARAMETER) {
            match quality.parse::<f32>() {
                Ok(q) if (0.0..=1.0).contains(&q) => {}
                _ => {
                    return Err(MediaTypeError::new(
                        value,
                        format!("invalid quality value '{}'", quality),
                    ))
                }
            }
        }

        Ok(media_type)
    }

    /// Parse a comma-separated list such as an `Accept` header value
    pub fn parse_list(value: &str) -> Result<Vec<Self>, MediaTypeError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(MediaType::parse)
            .collect()
    }

    pub fn main_type(&self) -> &str {
        &self.main_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.main_type == WILDCARD
    }

    /// `*` or `*+suffix`
    pub fn is_wildcard_subtype(&self) -> bool {
        self.sub_type == WILDCARD || self.sub_type.starts_with("*+")
    }

    /// The structured syntax suffix, e.g. `json` for `application/problem+json`
    pub fn subtype_suffix(&self) -> Option<&str> {
        self.sub_type.rsplit_once('+').map(|(_, suffix)| suffix)
    }

    /// Quality factor (`q` parameter), 1.0 when absent
    pub fn quality(&self) -> f32 {
        self.parameters
            .get(QUALITY_PARAMETER)
            .and_then(|q| q.parse().ok())
            .unwrap_or(1.0)
    }

    /// Same type and subtype, ignoring parameters
    pub fn equals_type_and_subtype(&self, other: &MediaType) -> bool {
        self.main_type == other.main_type && self.sub_type == other.sub_type
    }

    /// Whether this media type includes `other` (`text/*` includes `text/plain`)
    pub fn includes(&self, other: &MediaType) -> bool {
        if self.is_wildcard_type() {
            return true;
        }
        if self.main_type != other.main_type {
            return false;
        }
        if self.sub_type == other.sub_type || self.sub_type == WILDCARD {
            return true;
        }
        if let Some(this_suffix) = self.sub_type.strip_prefix("*+") {
            return other.subtype_suffix() == Some(this_suffix) || other.sub_type == this_suffix;
        }
        false
    }

    /// Whether either media type includes the other
    pub fn is_compatible_with(&self, other: &MediaType) -> bool {
        self.includes(other) || other.includes(self)
    }

    /// Order by specificity, most specific first
    pub fn compare_specificity(&self, other: &MediaType) -> Ordering {
        self.is_wildcard_type()
            .cmp(&other.is_wildcard_type())
            .then_with(|| self.is_wildcard_subtype().cmp(&other.is_wildcard_subtype()))
            .then_with(|| other.specific_parameter_count().cmp(&self.specific_parameter_count()))
    }

    /// Order by quality (highest first), then by specificity
    pub fn compare_quality_and_specificity(&self, other: &MediaType) -> Ordering {
        other
            .quality()
            .partial_cmp(&self.quality())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.compare_specificity(other))
    }

    fn specific_parameter_count(&self) -> usize {
        self.parameters
            .keys()
            .filter(|name| name.as_str() != QUALITY_PARAMETER)
            .count()
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (name, value) in &self.parameters {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::parse(s)
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let media_type = MediaType::parse("Application/JSON; charset=UTF-8; profile=Full").unwrap();
        assert_eq!(media_type.main_type(), "application");
        assert_eq!(media_type.sub_type(), "json");
        assert_eq!(media_type.parameter("charset"), Some("utf-8"));
        assert_eq!(media_type.parameter("profile"), Some("Full"));
        assert_eq!(media_type.to_string(), "application/json;charset=utf-8;profile=Full");

        assert_eq!(MediaType::parse("*").unwrap(), MediaType::all());
        assert_eq!(
            APPLICATION_JSON_VALUE.parse::<MediaType>().unwrap().to_string(),
            APPLICATION_JSON_VALUE
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(MediaType::parse("").is_err());
        assert!(MediaType::parse("json").is_err());
        assert!(MediaType::parse("application/").is_err());
        assert!(MediaType::parse("*/json").is_err());
        assert!(MediaType::parse("text/plain;q=2").is_err());
        assert!(MediaType::parse("text/plain;charset").is_err());
        assert!(MediaType::parse("text/pla in").is_err());
        assert!(MediaType::parse("text/plain;format=\"flowed").is_err());
    }

    #[test]
    fn test_parse_structured_suffix() {
        let problem_json = MediaType::parse("application/problem+json").unwrap();
        assert_eq!(problem_json.sub_type(), "problem+json");
        assert_eq!(problem_json.subtype_suffix(), Some("json"));

        let any_json = MediaType::parse("application/*+json").unwrap();
        assert!(any_json.is_wildcard_subtype());
        assert_eq!(any_json.to_string(), "application/*+json");

        let quoted = MediaType::parse("text/plain;format=\"flowed\"").unwrap();
        assert_eq!(quoted.parameter("format"), Some("flowed"));
    }

    #[test]
    fn test_includes() {
        let all = MediaType::all();
        let text_any = MediaType::parse("text/*").unwrap();
        let text_plain = MediaType::text_plain();
        let json_suffix = MediaType::parse("application/*+json").unwrap();
        let problem_json = MediaType::parse("application/problem+json").unwrap();

        assert!(all.includes(&text_plain));
        assert!(text_any.includes(&text_plain));
        assert!(!text_plain.includes(&text_any));
        assert!(json_suffix.includes(&problem_json));
        assert!(json_suffix.includes(&MediaType::application_json()));
        assert!(!json_suffix.includes(&MediaType::application_xml()));
    }

    #[test]
    fn test_compatibility_is_symmetric() {
        let text_any = MediaType::parse("text/*").unwrap();
        let text_plain = MediaType::text_plain();
        assert!(text_any.is_compatible_with(&text_plain));
        assert!(text_plain.is_compatible_with(&text_any));
        assert!(!text_plain.is_compatible_with(&MediaType::application_json()));
    }

    #[test]
    fn test_accept_list_ordering() {
        let mut accepted =
            MediaType::parse_list("text/*;q=0.5, application/json, */*;q=0.1, text/plain;q=0.5")
                .unwrap();
        accepted.sort_by(|a, b| a.compare_quality_and_specificity(b));

        let rendered: Vec<String> = accepted.iter().map(|m| m.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["application/json", "text/plain;q=0.5", "text/*;q=0.5", "*/*;q=0.1"]
        );
    }
}

use super::expressions::NameValueExpression;
use super::RequestCondition;
use crate::errors::MappingResult;
use crate::mapping::media_type::MediaType;
use crate::mapping::request::MatchContext;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A media type, optionally negated with a leading `!`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaTypeExpression {
    media_type: MediaType,
    negated: bool,
}

impl MediaTypeExpression {
    pub fn parse(expression: &str) -> MappingResult<Self> {
        let trimmed = expression.trim();
        let (negated, value) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        Ok(Self {
            media_type: MediaType::parse(value)?,
            negated,
        })
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    fn compare_specificity(&self, other: &Self) -> Ordering {
        self.media_type
            .compare_specificity(&other.media_type)
            .then_with(|| self.cmp(other))
    }
}

impl std::fmt::Display for MediaTypeExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.media_type)
    }
}

impl Serialize for MediaTypeExpression {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse media type expressions from an attribute plus matching header expressions.
///
/// Comma separated values are split; the result is sorted most specific first.
fn parse_expressions<S: AsRef<str>>(
    values: &[S],
    headers: &[S],
    header_name: &str,
) -> MappingResult<Vec<MediaTypeExpression>> {
    let mut expressions = Vec::new();
    for value in values {
        for part in value.as_ref().split(',').filter(|part| !part.trim().is_empty()) {
            expressions.push(MediaTypeExpression::parse(part)?);
        }
    }

    for header in headers {
        let expression = NameValueExpression::parse("headers", header.as_ref())?;
        if !expression.name().eq_ignore_ascii_case(header_name) {
            continue;
        }
        if let Some(value) = expression.value() {
            for part in value.split(',').filter(|part| !part.trim().is_empty()) {
                let mut media = MediaTypeExpression::parse(part)?;
                media.negated = media.negated != expression.is_negated();
                expressions.push(media);
            }
        }
    }

    expressions.sort_by(|a, b| a.compare_specificity(b));
    expressions.dedup();
    Ok(expressions)
}

fn display_expressions(f: &mut std::fmt::Formatter<'_>, expressions: &[MediaTypeExpression]) -> std::fmt::Result {
    let rendered: Vec<String> = expressions.iter().map(ToString::to_string).collect();
    write!(f, "[{}]", rendered.join(" || "))
}

/// Media types the request body may have.
///
/// `body_required` is not part of the condition's identity. When it is false
/// a request without a body matches regardless of the declared media types.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumesCondition {
    expressions: Vec<MediaTypeExpression>,
    #[serde(skip)]
    body_required: bool,
}

impl Default for ConsumesCondition {
    fn default() -> Self {
        Self {
            expressions: Vec::new(),
            body_required: true,
        }
    }
}

impl PartialEq for ConsumesCondition {
    fn eq(&self, other: &Self) -> bool {
        self.expressions == other.expressions
    }
}

impl Eq for ConsumesCondition {}

impl Hash for ConsumesCondition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expressions.hash(state);
    }
}

impl ConsumesCondition {
    /// Parse `consumes` values plus `Content-Type` header expressions
    pub fn parse<S: AsRef<str>>(consumes: &[S], headers: &[S]) -> MappingResult<Self> {
        Ok(Self {
            expressions: parse_expressions(consumes, headers, CONTENT_TYPE.as_str())?,
            body_required: true,
        })
    }

    pub fn expressions(&self) -> &[MediaTypeExpression] {
        &self.expressions
    }

    /// Non-negated media types
    pub fn consumable_media_types(&self) -> Vec<&MediaType> {
        self.expressions
            .iter()
            .filter(|e| !e.negated)
            .map(MediaTypeExpression::media_type)
            .collect()
    }

    pub fn is_body_required(&self) -> bool {
        self.body_required
    }

    pub fn set_body_required(&mut self, body_required: bool) {
        self.body_required = body_required;
    }
}

impl RequestCondition for ConsumesCondition {
    /// Method level media types replace the type level ones when present
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        if other.expressions.is_empty() {
            Ok(self.clone())
        } else {
            Ok(other.clone())
        }
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        if self.expressions.is_empty() {
            return Some(self.clone());
        }
        if !self.body_required && !ctx.request.has_body() {
            return Some(Self {
                expressions: Vec::new(),
                body_required: false,
            });
        }

        let content_type = match ctx.request.content_type() {
            None => MediaType::application_octet_stream(),
            Some(Ok(content_type)) => content_type,
            Some(Err(_)) => return None,
        };

        let matched: Vec<MediaTypeExpression> = self
            .expressions
            .iter()
            .filter(|expression| expression.media_type.includes(&content_type) != expression.negated)
            .cloned()
            .collect();
        if matched.is_empty() {
            None
        } else {
            Some(Self {
                expressions: matched,
                body_required: self.body_required,
            })
        }
    }

    fn compare_to(&self, other: &Self, _ctx: &MatchContext<'_>) -> Ordering {
        match (self.expressions.first(), other.expressions.first()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(mine), Some(theirs)) => mine.media_type.compare_specificity(&theirs.media_type),
        }
    }

    fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl std::fmt::Display for ConsumesCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_expressions(f, &self.expressions)
    }
}

/// Media types the handler can produce, matched against `Accept`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProducesCondition {
    expressions: Vec<MediaTypeExpression>,
}

impl ProducesCondition {
    /// Parse `produces` values plus `Accept` header expressions
    pub fn parse<S: AsRef<str>>(produces: &[S], headers: &[S]) -> MappingResult<Self> {
        Ok(Self {
            expressions: parse_expressions(produces, headers, ACCEPT.as_str())?,
        })
    }

    pub fn expressions(&self) -> &[MediaTypeExpression] {
        &self.expressions
    }

    /// Non-negated media types
    pub fn producible_media_types(&self) -> Vec<&MediaType> {
        self.expressions
            .iter()
            .filter(|e| !e.negated)
            .map(MediaTypeExpression::media_type)
            .collect()
    }

    fn index_of(&self, accepted: &MediaType, equal: bool) -> Option<usize> {
        self.expressions.iter().position(|expression| {
            !expression.negated
                && if equal {
                    expression.media_type.equals_type_and_subtype(accepted)
                } else {
                    expression.media_type.includes(accepted) || accepted.includes(&expression.media_type)
                }
        })
    }
}

/// Found beats not found; a lower index beats a higher one
fn compare_index(mine: Option<usize>, theirs: Option<usize>) -> Ordering {
    match (mine, theirs) {
        (Some(mine), Some(theirs)) => mine.cmp(&theirs),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl RequestCondition for ProducesCondition {
    /// Method level media types replace the type level ones when present
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        if other.expressions.is_empty() {
            Ok(self.clone())
        } else {
            Ok(other.clone())
        }
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        if self.expressions.is_empty() {
            return Some(self.clone());
        }
        let accepted = ctx.request.accepted_media_types().ok()?;

        let matched: Vec<MediaTypeExpression> = self
            .expressions
            .iter()
            .filter(|expression| {
                let compatible = accepted
                    .iter()
                    .any(|media_type| expression.media_type.is_compatible_with(media_type));
                compatible != expression.negated
            })
            .cloned()
            .collect();
        if matched.is_empty() {
            None
        } else {
            Some(Self { expressions: matched })
        }
    }

    fn compare_to(&self, other: &Self, ctx: &MatchContext<'_>) -> Ordering {
        match (self.expressions.is_empty(), other.expressions.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let accepted = ctx
            .request
            .accepted_media_types()
            .unwrap_or_else(|_| vec![MediaType::all()]);
        for media_type in &accepted {
            let ordering = compare_index(self.index_of(media_type, true), other.index_of(media_type, true))
                .then_with(|| {
                    compare_index(self.index_of(media_type, false), other.index_of(media_type, false))
                });
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl std::fmt::Display for ProducesCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_expressions(f, &self.expressions)
    }
}

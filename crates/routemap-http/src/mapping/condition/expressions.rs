use super::RequestCondition;
use crate::errors::{MappingError, MappingResult};
use crate::mapping::request::{MappingRequest, MatchContext};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// `name`, `!name`, `name=value` or `name!=value`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NameValueExpression {
    name: String,
    value: Option<String>,
    negated: bool,
}

impl NameValueExpression {
    /// Parse an expression; `kind` names the attribute in errors
    pub fn parse(kind: &'static str, expression: &str) -> MappingResult<Self> {
        let trimmed = expression.trim();
        let (name, value, negated) = if let Some((name, value)) = trimmed.split_once("!=") {
            (name, Some(value), true)
        } else if let Some((name, value)) = trimmed.split_once('=') {
            (name, Some(value), false)
        } else if let Some(name) = trimmed.strip_prefix('!') {
            (name, None, true)
        } else {
            (trimmed, None, false)
        };

        let name = name.trim();
        if name.is_empty() || name.starts_with('!') {
            return Err(MappingError::InvalidExpression {
                kind,
                expression: expression.to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            value: value.map(|v| v.trim().to_string()),
            negated,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    fn lowercase_name(mut self) -> Self {
        self.name = self.name.to_ascii_lowercase();
        self
    }

    fn matches_values(&self, values: &[&str]) -> bool {
        let is_match = match &self.value {
            Some(expected) => values.iter().any(|value| *value == expected.as_str()),
            None => !values.is_empty(),
        };
        is_match != self.negated
    }
}

impl std::fmt::Display for NameValueExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.value, self.negated) {
            (Some(value), true) => write!(f, "{}!={}", self.name, value),
            (Some(value), false) => write!(f, "{}={}", self.name, value),
            (None, true) => write!(f, "!{}", self.name),
            (None, false) => write!(f, "{}", self.name),
        }
    }
}

fn compare_expressions(
    mine: &BTreeSet<NameValueExpression>,
    theirs: &BTreeSet<NameValueExpression>,
) -> Ordering {
    let with_value = |set: &BTreeSet<NameValueExpression>| set.iter().filter(|e| e.value.is_some()).count();
    theirs
        .len()
        .cmp(&mine.len())
        .then_with(|| with_value(theirs).cmp(&with_value(mine)))
}

fn display_expressions(
    f: &mut std::fmt::Formatter<'_>,
    expressions: &BTreeSet<NameValueExpression>,
) -> std::fmt::Result {
    let rendered: Vec<String> = expressions.iter().map(ToString::to_string).collect();
    write!(f, "[{}]", rendered.join(" && "))
}

/// Query parameter expressions; all must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ParamsCondition {
    expressions: BTreeSet<NameValueExpression>,
}

impl ParamsCondition {
    pub fn parse<S: AsRef<str>>(params: &[S]) -> MappingResult<Self> {
        let expressions = params
            .iter()
            .map(|param| NameValueExpression::parse("params", param.as_ref()))
            .collect::<MappingResult<BTreeSet<_>>>()?;
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> &BTreeSet<NameValueExpression> {
        &self.expressions
    }

    fn matches(&self, request: &MappingRequest) -> bool {
        self.expressions.iter().all(|expression| {
            let values = request.query_values(expression.name());
            expression.matches_values(&values)
        })
    }
}

impl RequestCondition for ParamsCondition {
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        let mut expressions = self.expressions.clone();
        expressions.extend(other.expressions.iter().cloned());
        Ok(Self { expressions })
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        self.matches(ctx.request).then(|| self.clone())
    }

    fn compare_to(&self, other: &Self, _ctx: &MatchContext<'_>) -> Ordering {
        compare_expressions(&self.expressions, &other.expressions)
    }

    fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl std::fmt::Display for ParamsCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_expressions(f, &self.expressions)
    }
}

/// Header expressions; all must match.
///
/// `Accept` and `Content-Type` expressions are not kept here, they feed the
/// produces and consumes conditions instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HeadersCondition {
    expressions: BTreeSet<NameValueExpression>,
}

impl HeadersCondition {
    pub fn parse<S: AsRef<str>>(headers: &[S]) -> MappingResult<Self> {
        let mut expressions = BTreeSet::new();
        for header in headers {
            let expression = NameValueExpression::parse("headers", header.as_ref())?.lowercase_name();
            if expression.name() == ACCEPT.as_str() || expression.name() == CONTENT_TYPE.as_str() {
                continue;
            }
            expressions.insert(expression);
        }
        Ok(Self { expressions })
    }

    pub fn expressions(&self) -> &BTreeSet<NameValueExpression> {
        &self.expressions
    }

    fn matches(&self, request: &MappingRequest) -> bool {
        self.expressions.iter().all(|expression| {
            let values: Vec<&str> = request
                .headers()
                .get_all(expression.name())
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect();
            expression.matches_values(&values)
        })
    }
}

impl RequestCondition for HeadersCondition {
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        let mut expressions = self.expressions.clone();
        expressions.extend(other.expressions.iter().cloned());
        Ok(Self { expressions })
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        self.matches(ctx.request).then(|| self.clone())
    }

    fn compare_to(&self, other: &Self, _ctx: &MatchContext<'_>) -> Ordering {
        compare_expressions(&self.expressions, &other.expressions)
    }

    fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl std::fmt::Display for HeadersCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_expressions(f, &self.expressions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{HttpMethod, MatchOptions};

    fn ctx(request: &MappingRequest) -> MatchContext<'_> {
        MatchContext::new(request, MatchOptions::default())
    }

    #[test]
    fn test_expression_forms() {
        let cases = [
            ("foo", "foo", None, false),
            ("!foo", "foo", None, true),
            ("foo=bar", "foo", Some("bar"), false),
            ("foo!=bar", "foo", Some("bar"), true),
        ];
        for (input, name, value, negated) in cases {
            let expression = NameValueExpression::parse("params", input).unwrap();
            assert_eq!(expression.name(), name);
            assert_eq!(expression.value(), value);
            assert_eq!(expression.is_negated(), negated);
            assert_eq!(expression.to_string(), input);
        }

        assert!(NameValueExpression::parse("params", "").is_err());
        assert!(NameValueExpression::parse("params", "=bar").is_err());
    }

    #[test]
    fn test_params_matching() {
        let condition = ParamsCondition::parse(&["active", "sort=name", "!debug", "mode!=raw"]).unwrap();

        let matching = MappingRequest::new(HttpMethod::GET, "/users?active&sort=name");
        assert!(condition.matching_condition(&ctx(&matching)).is_some());

        let missing = MappingRequest::new(HttpMethod::GET, "/users?sort=name");
        assert!(condition.matching_condition(&ctx(&missing)).is_none());

        let forbidden = MappingRequest::new(HttpMethod::GET, "/users?active&sort=name&debug=1");
        assert!(condition.matching_condition(&ctx(&forbidden)).is_none());

        let wrong_mode = MappingRequest::new(HttpMethod::GET, "/users?active&sort=name&mode=raw");
        assert!(condition.matching_condition(&ctx(&wrong_mode)).is_none());
    }

    #[test]
    fn test_headers_are_case_insensitive_and_skip_media_headers() {
        let condition =
            HeadersCondition::parse(&["X-Version=2", "Content-Type=application/json", "accept=text/plain"])
                .unwrap();
        assert_eq!(condition.expressions().len(), 1);

        let request = MappingRequest::new(HttpMethod::GET, "/").with_header("x-version", "2");
        assert!(condition.matching_condition(&ctx(&request)).is_some());

        let other = MappingRequest::new(HttpMethod::GET, "/").with_header("X-Version", "1");
        assert!(condition.matching_condition(&ctx(&other)).is_none());
    }

    #[test]
    fn test_combine_is_union() {
        let type_level = ParamsCondition::parse(&["a"]).unwrap();
        let method_level = ParamsCondition::parse(&["b=1"]).unwrap();
        let combined = type_level.combine(&method_level).unwrap();
        assert_eq!(combined.to_string(), "[a && b=1]");
    }

    #[test]
    fn test_more_expressions_win() {
        let request = MappingRequest::new(HttpMethod::GET, "/?a=1&b=2");
        let two = ParamsCondition::parse(&["a", "b"]).unwrap();
        let one = ParamsCondition::parse(&["a"]).unwrap();
        assert_eq!(two.compare_to(&one, &ctx(&request)), Ordering::Less);
        assert_eq!(one.compare_to(&ParamsCondition::default(), &ctx(&request)), Ordering::Less);
    }
}

use super::RequestCondition;
use crate::errors::MappingResult;
use crate::mapping::request::MatchContext;
use crate::routing::HttpMethod;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Set of HTTP methods; empty matches any method
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestMethodsCondition {
    methods: BTreeSet<HttpMethod>,
}

impl RequestMethodsCondition {
    pub fn new(methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    pub fn methods(&self) -> &BTreeSet<HttpMethod> {
        &self.methods
    }

    pub fn contains(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
    }

    fn single(method: HttpMethod) -> Self {
        Self::new([method])
    }
}

impl RequestCondition for RequestMethodsCondition {
    /// Methods declared on the method level replace the type level ones
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        if other.methods.is_empty() {
            Ok(self.clone())
        } else {
            Ok(other.clone())
        }
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        if self.methods.is_empty() {
            return Some(self.clone());
        }
        let method = ctx.request.method();
        if self.contains(method) {
            return Some(Self::single(method));
        }
        // HEAD falls back to GET
        if method == HttpMethod::HEAD && self.contains(HttpMethod::GET) {
            return Some(Self::single(HttpMethod::GET));
        }
        None
    }

    fn compare_to(&self, other: &Self, ctx: &MatchContext<'_>) -> Ordering {
        if ctx.request.method() == HttpMethod::HEAD {
            match (self.contains(HttpMethod::HEAD), other.contains(HttpMethod::HEAD)) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
        // An explicit method beats "any method"
        match (self.methods.is_empty(), other.methods.is_empty()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => other.methods.len().cmp(&self.methods.len()),
        }
    }

    fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Display for RequestMethodsCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(HttpMethod::as_str).collect();
        write!(f, "{}", methods.join(" || "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::request::MappingRequest;
    use crate::routing::MatchOptions;

    fn matches(condition: &RequestMethodsCondition, method: HttpMethod) -> Option<RequestMethodsCondition> {
        let request = MappingRequest::new(method, "/");
        condition.matching_condition(&MatchContext::new(&request, MatchOptions::default()))
    }

    #[test]
    fn test_method_level_replaces_type_level() {
        let type_level = RequestMethodsCondition::new([HttpMethod::GET, HttpMethod::POST]);
        let method_level = RequestMethodsCondition::new([HttpMethod::DELETE]);

        assert_eq!(type_level.combine(&method_level).unwrap(), method_level);
        assert_eq!(
            type_level.combine(&RequestMethodsCondition::default()).unwrap(),
            type_level
        );
    }

    #[test]
    fn test_matching_narrows_to_request_method() {
        let condition = RequestMethodsCondition::new([HttpMethod::GET, HttpMethod::POST]);
        assert_eq!(
            matches(&condition, HttpMethod::POST),
            Some(RequestMethodsCondition::new([HttpMethod::POST]))
        );
        assert_eq!(
            matches(&condition, HttpMethod::HEAD),
            Some(RequestMethodsCondition::new([HttpMethod::GET]))
        );
        assert_eq!(matches(&condition, HttpMethod::PUT), None);
        assert!(matches(&RequestMethodsCondition::default(), HttpMethod::PUT).is_some());
    }

    #[test]
    fn test_explicit_method_is_preferred() {
        let request = MappingRequest::new(HttpMethod::GET, "/");
        let ctx = MatchContext::new(&request, MatchOptions::default());
        let get = RequestMethodsCondition::new([HttpMethod::GET]);
        let any = RequestMethodsCondition::default();

        assert_eq!(get.compare_to(&any, &ctx), Ordering::Less);
        assert_eq!(any.compare_to(&get, &ctx), Ordering::Greater);
    }

    #[test]
    fn test_display() {
        let condition = RequestMethodsCondition::new([HttpMethod::POST, HttpMethod::GET]);
        assert_eq!(condition.to_string(), "GET || POST");
    }
}

use super::RequestCondition;
use crate::errors::{MappingError, MappingResult};
use crate::mapping::request::MatchContext;
use crate::routing::RoutePattern;
use serde::Serialize;
use std::cmp::Ordering;

/// Set of URL path patterns.
///
/// Declared patterns are kept sorted and deduplicated so that two conditions
/// with the same patterns compare equal. A condition narrowed to a request
/// keeps its patterns ordered best match first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PatternsCondition {
    patterns: Vec<RoutePattern>,
}

impl PatternsCondition {
    /// Build from parsed patterns; no patterns means the single empty pattern
    pub fn new(patterns: impl IntoIterator<Item = RoutePattern>) -> Self {
        let mut patterns: Vec<RoutePattern> = patterns.into_iter().collect();
        if patterns.is_empty() {
            patterns.push(RoutePattern::empty());
        }
        patterns.sort();
        patterns.dedup();
        Self { patterns }
    }

    /// Parse pattern strings
    pub fn parse<S: AsRef<str>>(paths: &[S]) -> MappingResult<Self> {
        let patterns = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                RoutePattern::parse(path).map_err(|source| MappingError::invalid_pattern(path, source))
            })
            .collect::<MappingResult<Vec<_>>>()?;
        Ok(Self::new(patterns))
    }

    pub fn patterns(&self) -> &[RoutePattern] {
        &self.patterns
    }

    /// Pattern strings in order
    pub fn pattern_strings(&self) -> Vec<String> {
        self.patterns.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Patterns without variables or wildcards, usable for direct lookup
    pub fn direct_paths(&self) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|pattern| pattern.is_static())
            .map(|pattern| {
                if pattern.is_empty() {
                    "/".to_string()
                } else {
                    pattern.as_str().to_string()
                }
            })
            .collect()
    }

    /// First pattern; after narrowing this is the best match
    pub fn first(&self) -> Option<&RoutePattern> {
        self.patterns.first()
    }
}

impl RequestCondition for PatternsCondition {
    fn combine(&self, other: &Self) -> MappingResult<Self> {
        let mut combined = Vec::with_capacity(self.patterns.len() * other.patterns.len());
        for outer in &self.patterns {
            for inner in &other.patterns {
                let pattern = outer.combine(inner).map_err(|source| {
                    MappingError::invalid_pattern(format!("{}{}", outer, inner), source)
                })?;
                combined.push(pattern);
            }
        }
        Ok(Self::new(combined))
    }

    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self> {
        let path = ctx.request.path();
        let mut matches: Vec<RoutePattern> = self
            .patterns
            .iter()
            .filter(|pattern| pattern.matches_with(path, &ctx.options))
            .cloned()
            .collect();
        if matches.is_empty() {
            return None;
        }
        matches.sort_by(|a, b| a.compare_specificity(b));
        Some(Self { patterns: matches })
    }

    fn compare_to(&self, other: &Self, _ctx: &MatchContext<'_>) -> Ordering {
        for (mine, theirs) in self.patterns.iter().zip(&other.patterns) {
            let ordering = mine.compare_specificity(theirs);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        other.patterns.len().cmp(&self.patterns.len())
    }

    fn is_empty(&self) -> bool {
        self.patterns.iter().all(RoutePattern::is_empty)
    }
}

impl std::fmt::Display for PatternsCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.pattern_strings().join(" || "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::request::MappingRequest;
    use crate::routing::{HttpMethod, MatchOptions};

    fn condition(paths: &[&str]) -> PatternsCondition {
        PatternsCondition::parse(paths).unwrap()
    }

    #[test]
    fn test_no_patterns_means_empty_pattern() {
        let empty = condition(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.pattern_strings(), vec![""]);
        assert_eq!(empty.direct_paths(), vec!["/"]);
    }

    #[test]
    fn test_declared_order_does_not_matter() {
        assert_eq!(condition(&["/b", "/a", "/a"]), condition(&["/a", "/b"]));
    }

    #[test]
    fn test_combine_is_cartesian_join() {
        let combined = condition(&["/t1", "/t2"]).combine(&condition(&["/m1", "m2/"])).unwrap();
        assert_eq!(
            combined.pattern_strings(),
            vec!["/t1/m1", "/t1/m2/", "/t2/m1", "/t2/m2/"]
        );

        let type_only = condition(&["/user"]).combine(&condition(&[])).unwrap();
        assert_eq!(type_only.pattern_strings(), vec!["/user"]);

        let method_only = condition(&[]).combine(&condition(&["/get"])).unwrap();
        assert_eq!(method_only.pattern_strings(), vec!["/get"]);
    }

    #[test]
    fn test_combine_rejects_duplicate_variables() {
        let result = condition(&["/{id}"]).combine(&condition(&["/{id}"]));
        assert!(matches!(result, Err(MappingError::InvalidPattern { .. })));
    }

    #[test]
    fn test_matching_orders_best_first() {
        let declared = condition(&["/users/*", "/users/{id}", "/users/me", "/other"]);
        let request = MappingRequest::new(HttpMethod::GET, "/users/me");
        let ctx = MatchContext::new(&request, MatchOptions::default());

        let matched = declared.matching_condition(&ctx).unwrap();
        assert_eq!(
            matched.pattern_strings(),
            vec!["/users/me", "/users/{id}", "/users/*"]
        );

        let miss = MappingRequest::new(HttpMethod::GET, "/nothing");
        assert!(declared
            .matching_condition(&MatchContext::new(&miss, MatchOptions::default()))
            .is_none());
    }

    #[test]
    fn test_compare_prefers_more_specific() {
        let request = MappingRequest::new(HttpMethod::GET, "/users/7");
        let ctx = MatchContext::new(&request, MatchOptions::default());

        let exact = condition(&["/users/{id:int}"]);
        let loose = condition(&["/users/{id}"]);
        assert_eq!(exact.compare_to(&loose, &ctx), Ordering::Less);
        assert_eq!(loose.compare_to(&exact, &ctx), Ordering::Greater);
    }
}

//! Request conditions
//!
//! Each part of a [`RequestMappingInfo`](super::RequestMappingInfo) is a
//! request condition. Conditions combine (type level with method level),
//! narrow themselves to what a request actually matched, and order matched
//! conditions by how specifically they fit the request.

mod expressions;
mod media;
mod methods;
mod patterns;

pub use expressions::{HeadersCondition, NameValueExpression, ParamsCondition};
pub use media::{ConsumesCondition, MediaTypeExpression, ProducesCondition};
pub use methods::RequestMethodsCondition;
pub use patterns::PatternsCondition;

use super::request::MatchContext;
use crate::errors::MappingResult;
use std::cmp::Ordering;

/// Contract shared by every request condition
pub trait RequestCondition: Sized {
    /// Combine with `other`, which is the more specific (method level) side
    fn combine(&self, other: &Self) -> MappingResult<Self>;

    /// Narrow this condition to the request, or `None` when it does not match
    fn matching_condition(&self, ctx: &MatchContext<'_>) -> Option<Self>;

    /// Order two conditions already narrowed to the same request; `Less` is the better fit
    fn compare_to(&self, other: &Self, ctx: &MatchContext<'_>) -> Ordering;

    /// A condition with no expressions matches every request
    fn is_empty(&self) -> bool;
}

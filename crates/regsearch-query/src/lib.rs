//! regsearch-query
//!
//! Turns a `FilterSet` into a Lucene-style query expression of the kind the
//! openFDA `search=` parameter accepts.

pub mod builder;
pub mod escape;
pub mod expression;

pub use builder::QueryBuilder;
pub use expression::{Clause, Condition, Operator, QueryExpression, Term};

use std::fmt;

use crate::escape::escape_quoted;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Equals,
	Prefix,
	Range,
}

/// Constraint on one field. Values are kept unescaped; escaping happens when
/// the expression is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
	Equals(String),
	Prefix(String),
	/// Inclusive; a missing bound is open.
	Range { from: Option<String>, to: Option<String> },
}

impl Condition {
	pub fn operator(&self) -> Operator {
		match self {
			Condition::Equals(_) => Operator::Equals,
			Condition::Prefix(_) => Operator::Prefix,
			Condition::Range { .. } => Operator::Range,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
	pub field: String,
	pub condition: Condition,
}

impl Clause {
	pub fn new(field: impl Into<String>, condition: Condition) -> Self { Self { field: field.into(), condition } }

	pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self { Self::new(field, Condition::Equals(value.into())) }

	pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self { Self::new(field, Condition::Prefix(value.into())) }

	pub fn range(field: impl Into<String>, from: Option<String>, to: Option<String>) -> Self {
		Self::new(field, Condition::Range { from, to })
	}
}

impl fmt::Display for Clause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.condition {
			Condition::Equals(v) => write!(f, "{}:\"{}\"", self.field, escape_quoted(v)),
			Condition::Prefix(v) => write!(f, "{}:\"{}*\"", self.field, escape_quoted(v)),
			Condition::Range { from, to } => write!(
				f,
				"{}:[{} TO {}]",
				self.field,
				from.as_deref().unwrap_or("*"),
				to.as_deref().unwrap_or("*")
			),
		}
	}
}

/// One AND-joined term: a single clause or an OR-group of alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
	Clause(Clause),
	AnyOf(Vec<Clause>),
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Term::Clause(c) => fmt::Display::fmt(c, f),
			Term::AnyOf(cs) if cs.len() == 1 => fmt::Display::fmt(&cs[0], f),
			Term::AnyOf(cs) => {
				f.write_str("(")?;
				for (i, c) in cs.iter().enumerate() {
					if i > 0 { f.write_str(" OR ")?; }
					fmt::Display::fmt(c, f)?;
				}
				f.write_str(")")
			}
		}
	}
}

/// Ordered AND of terms, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryExpression {
	terms: Vec<Term>,
}

impl QueryExpression {
	pub fn new(terms: Vec<Term>) -> Self { Self { terms } }

	pub fn terms(&self) -> &[Term] { &self.terms }

	pub fn is_empty(&self) -> bool { self.terms.is_empty() }

	pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
		self.terms.iter().flat_map(|t| match t {
			Term::Clause(c) => std::slice::from_ref(c),
			Term::AnyOf(cs) => cs.as_slice(),
		})
	}
}

impl fmt::Display for QueryExpression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, t) in self.terms.iter().enumerate() {
			if i > 0 { f.write_str(" AND ")?; }
			fmt::Display::fmt(t, f)?;
		}
		Ok(())
	}
}

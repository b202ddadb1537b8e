use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt::Write;

use regsearch_core::{BackendConfig, FieldKind, FieldSpec, FilterSet, FilterValue};

use crate::escape::{is_field_name, is_numeric, is_year, normalize_input};
use crate::expression::{Clause, Condition, QueryExpression, Term};

/// Builds query expressions from filter sets according to declared field specs.
///
/// Terms follow the declared field order; an OR-group sits where its first
/// present member is declared. Undeclared filters are treated as text
/// fields on their own name and come last, ordered by name; names that are not
/// plain field paths are dropped.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
	specs: Vec<FieldSpec>,
}

impl QueryBuilder {
	pub fn new(specs: Vec<FieldSpec>) -> Self { Self { specs } }

	pub fn from_backend(backend: &BackendConfig) -> Self { Self::new(backend.fields.clone()) }

	pub fn spec(&self, name: &str) -> Option<&FieldSpec> { self.specs.iter().find(|s| s.name == name) }

	pub fn build(&self, filters: &FilterSet) -> QueryExpression {
		let mut terms: Vec<Term> = Vec::new();
		let mut groups: HashMap<&str, usize> = HashMap::new();

		for spec in &self.specs {
			let Some(value) = filters.get(&spec.name) else { continue };
			let Some(clause) = clause_for(spec, value) else { continue };
			match spec.group.as_deref() {
				Some(group) => match groups.get(group) {
					Some(&idx) => {
						if let Term::AnyOf(cs) = &mut terms[idx] { cs.push(clause); }
					}
					None => {
						groups.insert(group, terms.len());
						terms.push(Term::AnyOf(vec![clause]));
					}
				},
				None => terms.push(Term::Clause(clause)),
			}
		}

		for (name, value) in filters.iter() {
			if self.spec(name).is_some() { continue; }
			if !is_field_name(name) {
				tracing::warn!(filter = %name, "ignoring undeclared filter with an invalid field name");
				continue;
			}
			if let Some(clause) = clause_for(&FieldSpec::new(name), value) { terms.push(Term::Clause(clause)); }
		}

		let terms = terms
			.into_iter()
			.map(|t| match t {
				Term::AnyOf(mut cs) if cs.len() == 1 => Term::Clause(cs.remove(0)),
				other => other,
			})
			.collect();
		let expr = QueryExpression::new(terms);
		tracing::debug!(query = %expr, "built query expression");
		expr
	}
}

/// Clause for one non-empty filter, or `None` when the value is a wildcard
/// sentinel ("Any") or normalizes to nothing.
pub fn clause_for(spec: &FieldSpec, value: &FilterValue) -> Option<Clause> {
	let field = spec.api_field();
	match value {
		FilterValue::Text(raw) | FilterValue::Choice(raw) => {
			let input = normalize_input(raw);
			if input.is_empty() { return None; }
			match spec.kind {
				FieldKind::Text => Some(text_clause(field, input)),
				FieldKind::Exact => Some(Clause::equals(field, input)),
				FieldKind::Choice => {
					if input.eq_ignore_ascii_case(spec.any_value.trim()) { None } else { Some(Clause::equals(field, input)) }
				}
				FieldKind::Year => Some(year_text_clause(spec, input)),
				FieldKind::Date => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
					Ok(d) => Some(day_range(spec, d)),
					Err(_) => Some(year_text_clause(spec, input)),
				},
			}
		}
		FilterValue::Date(d) => match spec.kind {
			FieldKind::Year => year_range(spec, d.year()),
			FieldKind::Date => Some(day_range(spec, *d)),
			_ => Some(Clause::equals(field, format_date(spec, *d))),
		},
		FilterValue::DateRange { from, to } => {
			if from.is_none() && to.is_none() { return None; }
			let (from, to) = match spec.kind {
				FieldKind::Year => (
					from.and_then(|d| NaiveDate::from_ymd_opt(d.year(), 1, 1)),
					to.and_then(|d| NaiveDate::from_ymd_opt(d.year(), 12, 31)),
				),
				_ => (*from, *to),
			};
			Some(Clause::range(field, from.map(|d| format_date(spec, d)), to.map(|d| format_date(spec, d))))
		}
	}
}

fn text_clause(field: &str, input: &str) -> Clause {
	if is_numeric(input) { Clause::equals(field, input) } else { Clause::prefix(field, input) }
}

fn year_text_clause(spec: &FieldSpec, input: &str) -> Clause {
	if is_year(input) {
		if let Some(clause) = input.parse::<i32>().ok().and_then(|y| year_range(spec, y)) { return clause; }
	}
	Clause::prefix(spec.api_field(), input)
}

fn year_range(spec: &FieldSpec, year: i32) -> Option<Clause> {
	let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
	let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
	Some(Clause::range(spec.api_field(), Some(format_date(spec, first)), Some(format_date(spec, last))))
}

fn day_range(spec: &FieldSpec, day: NaiveDate) -> Clause {
	let d = format_date(spec, day);
	Clause::new(spec.api_field(), Condition::Range { from: Some(d.clone()), to: Some(d) })
}

/// Formats with the field's strftime pattern; an invalid pattern falls back to ISO.
pub fn format_date(spec: &FieldSpec, day: NaiveDate) -> String {
	let mut out = String::new();
	if write!(out, "{}", day.format(&spec.date_format)).is_err() {
		tracing::warn!(field = %spec.name, format = %spec.date_format, "invalid date format, using ISO");
		return day.format("%Y-%m-%d").to_string();
	}
	out
}

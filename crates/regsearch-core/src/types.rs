//! Domain types shared by the query builder, transport and session.

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::Method;

/// One user-supplied filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Choice(String),
    Date(NaiveDate),
    DateRange { from: Option<NaiveDate>, to: Option<NaiveDate> },
}

impl FilterValue {
    pub fn choice(value: impl Into<String>) -> Self { FilterValue::Choice(value.into()) }

    pub fn range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self { FilterValue::DateRange { from, to } }

    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) | FilterValue::Choice(s) => s.trim().is_empty(),
            FilterValue::Date(_) => false,
            FilterValue::DateRange { from, to } => from.is_none() && to.is_none(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self { FilterValue::Text(value.to_string()) }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self { FilterValue::Text(value) }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self { FilterValue::Date(value) }
}

/// Search criteria keyed by filter name. Empty values are never stored, so
/// every entry present contributes to the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    values: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets `name`, or clears it when `value` is empty.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&name);
        } else {
            self.values.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> { self.values.remove(name) }

    pub fn get(&self, name: &str) -> Option<&FilterValue> { self.values.get(name) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for (k, v) in iter { set.insert(k, v); }
        set
    }
}

/// One decoded page of results.
///
/// `total_count` is what the backend reported at fetch time and is the only
/// input to "has more" decisions. `items.len() <= page_size` always holds.
#[derive(Debug, Clone)]
pub struct ResultPage<R> {
    pub items: Vec<R>,
    pub total_count: usize,
    pub page_offset: usize,
    pub page_size: usize,
}

impl<R> ResultPage<R> {
    pub fn empty() -> Self { Self { items: Vec::new(), total_count: 0, page_offset: 0, page_size: 0 } }
}

/// A transport-level request, fully planned before it reaches a `Fetcher`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self { Self { method: Method::Get, url: url.into(), query: Vec::new(), body: None } }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self { method: Method::Post, url: url.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self { Self { status: 200, body: body.into() } }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

/// Comparable projection of one record field.
///
/// Text compares case-insensitively; numbers sort before text.
#[derive(Debug, Clone)]
pub enum SortValue {
    Number(f64),
    Text(String),
}

impl SortValue {
    pub fn text(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() { None } else { Some(SortValue::Text(s.to_string())) }
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
            (SortValue::Text(a), SortValue::Text(b)) => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
        }
    }
}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for SortValue {}

use std::cmp::Ordering;

use regsearch_core::{Record, SortValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort of `items` by `key`. Records without a value for `key` go
/// last in either direction; ties keep arrival order. The input is untouched.
pub fn sort<'a, R: Record>(items: &'a [R], key: &str, direction: SortDirection) -> Vec<&'a R> {
    let mut keyed: Vec<(Option<SortValue>, &R)> = items.iter().map(|r| (r.sort_value(key), r)).collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().map(|(_, r)| r).collect()
}

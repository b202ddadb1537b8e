use async_trait::async_trait;

use crate::error::Result;
use crate::types::{FetchRequest, RawResponse, SortValue};

/// Transport seam. Implementations issue exactly one request and never retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse>;
}

/// App-specific projection of one JSON result object.
///
/// Construction never fails: a missing or malformed field degrades to its
/// absent representation instead of rejecting the record.
pub trait Record: Send + Sync + 'static {
    fn from_json(value: serde_json::Value) -> Self;

    /// Value used by the sorter for `key`; `None` sorts last.
    fn sort_value(&self, key: &str) -> Option<SortValue>;
}

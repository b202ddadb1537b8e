//! regsearch-core
//!
//! Shared vocabulary for the search client crates: filter sets, result pages,
//! the `Record`/`Fetcher` seams, the error taxonomy and figment-backed config.

pub mod config;
pub mod error;
pub mod record;
pub mod traits;
pub mod types;

pub use config::{BackendConfig, Config, FieldKind, FieldSpec, Method, Paging};
pub use error::{Error, ErrorKind, Result};
pub use record::{lenient, JsonRecord, UNKNOWN};
pub use traits::{Fetcher, Record};
pub use types::{FetchRequest, FilterSet, FilterValue, RawResponse, ResultPage, SortValue};

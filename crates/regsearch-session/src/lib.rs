//! regsearch-session
//!
//! The stateful half of the client: `PagedSearchSession` runs searches and
//! appends further pages, publishing `SessionState` through a watch channel;
//! `sort` orders accumulated items for display.

pub mod session;
pub mod sort;
pub mod state;

pub use session::{Outcome, PagedSearchSession};
pub use sort::{sort, SortDirection};
pub use state::{Phase, SessionState};

use regsearch_core::{Error, FilterSet};
use regsearch_query::QueryExpression;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Ready,
    LoadingMore,
    Errored,
}

/// Snapshot of one session as a UI sees it.
///
/// `items` keep arrival order and are never de-duplicated. `generation`
/// increases with every `search`/`reset`; responses issued under an older
/// generation are dropped.
#[derive(Debug, Clone)]
pub struct SessionState<R> {
    pub phase: Phase,
    pub current_query: Option<QueryExpression>,
    pub filters: FilterSet,
    pub items: Vec<R>,
    pub total_count: usize,
    /// Offset of the last applied page.
    pub offset: usize,
    pub error: Option<Error>,
    pub generation: u64,
}

impl<R> Default for SessionState<R> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            current_query: None,
            filters: FilterSet::new(),
            items: Vec::new(),
            total_count: 0,
            offset: 0,
            error: None,
            generation: 0,
        }
    }
}

impl<R> SessionState<R> {
    pub fn is_loading(&self) -> bool { self.phase == Phase::Searching }

    pub fn is_fetching_more(&self) -> bool { self.phase == Phase::LoadingMore }

    pub fn has_more(&self) -> bool { self.items.len() < self.total_count }

    /// Clears results and query, keeping the generation counter.
    pub(crate) fn clear(&mut self) {
        self.current_query = None;
        self.filters = FilterSet::new();
        self.items.clear();
        self.total_count = 0;
        self.offset = 0;
        self.error = None;
    }
}

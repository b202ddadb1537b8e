use tokio::sync::watch;

use regsearch_core::{BackendConfig, Error, FetchRequest, Fetcher, FilterSet, Record, Result, ResultPage};
use regsearch_http::{plan_request, HttpFetcher, ResponseDecoder};
use regsearch_query::QueryBuilder;

use crate::sort::{sort, SortDirection};
use crate::state::{Phase, SessionState};

/// What happened to a `search`/`load_more` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was applied to the session state.
    Applied,
    /// Nothing to do: a fetch was already in flight or every result is loaded.
    Skipped,
    /// A newer search started while this request was in flight; its response was dropped.
    Stale,
}

/// Query-fetch-paginate orchestrator for one search screen.
///
/// All state lives in a `watch` channel whose sender is the single writer;
/// every mutation goes through `send_modify`/`send_if_modified` and no borrow
/// is held across an await. Responses are applied only while the generation
/// they were issued under is still current.
pub struct PagedSearchSession<R, F = HttpFetcher> {
    backend: BackendConfig,
    builder: QueryBuilder,
    fetcher: F,
    state: watch::Sender<SessionState<R>>,
}

impl<R: Record> PagedSearchSession<R, HttpFetcher> {
    pub fn from_backend(backend: BackendConfig) -> Result<Self> {
        let fetcher = HttpFetcher::from_backend(&backend)?;
        Self::with_fetcher(backend, fetcher)
    }
}

impl<R: Record, F: Fetcher> PagedSearchSession<R, F> {
    /// Fails with `InvalidConfig` when the backend does not validate.
    pub fn with_fetcher(backend: BackendConfig, fetcher: F) -> Result<Self> {
        backend.validate()?;
        let builder = QueryBuilder::from_backend(&backend);
        let (state, _) = watch::channel(SessionState::default());
        Ok(Self { backend, builder, fetcher, state })
    }

    pub fn backend(&self) -> &BackendConfig { &self.backend }

    pub fn subscribe(&self) -> watch::Receiver<SessionState<R>> { self.state.subscribe() }

    /// Borrowed snapshot. Do not hold it across an await.
    pub fn state(&self) -> watch::Ref<'_, SessionState<R>> { self.state.borrow() }

    /// Starts a new search from page one, superseding anything in flight.
    pub async fn search(&self, filters: &FilterSet) -> Result<Outcome> {
        let expr = self.builder.build(filters);
        if expr.is_empty() {
            self.state.send_modify(|s| {
                s.generation += 1;
                s.clear();
                s.phase = Phase::Errored;
                s.error = Some(Error::NoCriteria);
            });
            tracing::warn!("search rejected: no criteria");
            return Err(Error::NoCriteria);
        }

        let request = plan_request(&self.backend, &expr, filters, 0);
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.clear();
            s.current_query = Some(expr);
            s.filters = filters.clone();
            s.phase = Phase::Searching;
        });
        tracing::debug!(generation, "search started");

        let result = self.fetch_page(&request).await;

        let mut outcome = Outcome::Stale;
        let mut failure = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation { return false; }
            outcome = Outcome::Applied;
            match result {
                Ok(page) => {
                    tracing::info!(items = page.items.len(), total = page.total_count, "first page applied");
                    s.total_count = page.total_count;
                    s.items = page.items;
                    s.phase = Phase::Ready;
                }
                Err(err) if err.is_no_matches() => {
                    tracing::info!("no matches");
                    s.phase = Phase::Ready;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "search failed");
                    s.items.clear();
                    s.total_count = 0;
                    s.phase = Phase::Errored;
                    failure = Some(err.clone());
                    s.error = Some(err);
                }
            }
            true
        });

        if outcome == Outcome::Stale {
            tracing::debug!(generation, "dropping superseded search response");
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }

    /// Appends the next page of the current query. A no-op while a fetch is
    /// in flight or once every result is loaded.
    pub async fn load_more(&self) -> Result<Outcome> {
        let page_size = self.backend.page_size;
        let mut planned = None;
        self.state.send_if_modified(|s| {
            if matches!(s.phase, Phase::Searching | Phase::LoadingMore) || !s.has_more() { return false; }
            let Some(query) = s.current_query.as_ref() else { return false };
            let offset = s.offset + page_size;
            planned = Some((s.generation, offset, plan_request(&self.backend, query, &s.filters, offset)));
            s.phase = Phase::LoadingMore;
            s.error = None;
            true
        });
        let Some((generation, offset, request)) = planned else {
            return Ok(Outcome::Skipped);
        };
        tracing::debug!(generation, offset, "loading more");

        let result = self.fetch_page(&request).await;

        let mut outcome = Outcome::Stale;
        let mut failure = None;
        self.state.send_if_modified(|s| {
            if s.generation != generation { return false; }
            outcome = Outcome::Applied;
            match result {
                Ok(page) => {
                    tracing::info!(items = page.items.len(), total = page.total_count, offset, "page appended");
                    let exhausted = page.items.is_empty();
                    s.items.extend(page.items);
                    s.total_count = if exhausted { s.items.len() } else { page.total_count };
                    s.offset = offset;
                    s.phase = Phase::Ready;
                }
                Err(err) => {
                    tracing::warn!(error = %err, offset, "load more failed");
                    s.phase = Phase::Errored;
                    failure = Some(err.clone());
                    s.error = Some(err);
                }
            }
            true
        });

        if outcome == Outcome::Stale {
            tracing::debug!(generation, offset, "dropping stale page");
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }

    /// Back to `Idle`; any response still in flight will be dropped.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.clear();
            s.phase = Phase::Idle;
        });
    }

    /// Accumulated items ordered for display; the session keeps arrival order.
    pub fn sorted(&self, key: &str, direction: SortDirection) -> Vec<R>
    where
        R: Clone,
    {
        let state = self.state.borrow();
        sort(&state.items, key, direction).into_iter().cloned().collect()
    }

    async fn fetch_page(&self, request: &FetchRequest) -> Result<ResultPage<R>> {
        let raw = self.fetcher.fetch(request).await?;
        ResponseDecoder::decode_response(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use regsearch_core::{ErrorKind, FieldSpec, JsonRecord, RawResponse};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Serves `total` synthetic records per query; requests at `gated_skip`
    /// wait for `gate` before answering.
    struct ScriptedFetcher {
        total: AtomicUsize,
        calls: AtomicUsize,
        fail_skip: Mutex<Option<String>>,
        gated_skip: Option<String>,
        gate: Arc<Notify>,
    }

    impl ScriptedFetcher {
        fn new(total: usize) -> Self {
            Self { total: AtomicUsize::new(total), calls: AtomicUsize::new(0), fail_skip: Mutex::new(None), gated_skip: None, gate: Arc::new(Notify::new()) }
        }

        fn gated_at(mut self, skip: &str) -> Self { self.gated_skip = Some(skip.to_string()); self }

        fn fail_at(&self, skip: Option<&str>) { *self.fail_skip.lock().unwrap() = skip.map(str::to_string); }

        /// Total reported by subsequent responses; pages past it come back empty.
        fn set_total(&self, total: usize) { self.total.store(total, Ordering::SeqCst); }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let search = request.query_value("search").unwrap_or_default().to_string();
            let skip = request.query_value("skip").unwrap_or("0").to_string();
            let limit: usize = request.query_value("limit").unwrap_or("20").parse().unwrap();
            if self.gated_skip.as_deref() == Some(skip.as_str()) {
                self.gate.notified().await;
            }
            if self.fail_skip.lock().unwrap().as_deref() == Some(skip.as_str()) {
                return Err(Error::Network("connection reset".into()));
            }
            if search.contains("Nothing") {
                let body = json!({ "error": { "code": "NOT_FOUND", "message": "No matches found!" } });
                return Ok(RawResponse { status: 404, body: body.to_string().into_bytes() });
            }
            let start: usize = skip.parse().unwrap();
            let total = self.total.load(Ordering::SeqCst);
            let results: Vec<_> = (start..(start + limit).min(total))
                .map(|i| json!({ "query": search, "index": i }))
                .collect();
            let body = json!({ "meta": { "results": { "skip": start, "limit": limit, "total": total } }, "results": results });
            Ok(RawResponse::ok(body.to_string()))
        }
    }

    fn session(fetcher: ScriptedFetcher) -> PagedSearchSession<JsonRecord, ScriptedFetcher> {
        let backend = BackendConfig::new("http://scripted/search").with_field(FieldSpec::new("name"));
        PagedSearchSession::with_fetcher(backend, fetcher).unwrap()
    }

    fn acme() -> FilterSet { FilterSet::new().with("name", "Acme") }

    #[tokio::test]
    async fn empty_filters_never_fetch() {
        let s = session(ScriptedFetcher::new(40));
        let err = s.search(&FilterSet::new().with("name", "  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCriteria);
        assert_eq!(s.fetcher.calls.load(Ordering::SeqCst), 0);
        let state = s.state();
        assert_eq!(state.phase, Phase::Errored);
        assert!(matches!(state.error, Some(Error::NoCriteria)));
    }

    #[test]
    fn zero_page_size_backend_is_rejected() {
        let backend = BackendConfig::new("http://scripted/search")
            .with_paging(regsearch_core::Paging::Page)
            .with_page_size(0)
            .with_field(FieldSpec::new("name"));
        let err = PagedSearchSession::<JsonRecord, _>::with_fetcher(backend, ScriptedFetcher::new(40)).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn later_page_total_replaces_earlier_one() {
        let s = session(ScriptedFetcher::new(40));
        s.search(&acme()).await.unwrap();
        assert_eq!(s.state().total_count, 40);

        s.fetcher.set_total(60);
        assert_eq!(s.load_more().await.unwrap(), Outcome::Applied);
        let state = s.state();
        assert_eq!(state.items.len(), 40);
        assert_eq!(state.total_count, 60);
        assert!(state.has_more());
    }

    #[tokio::test]
    async fn empty_appended_page_stops_paging() {
        let s = session(ScriptedFetcher::new(40));
        s.search(&acme()).await.unwrap();

        // Upstream shrank between pages: skip=20 now returns nothing.
        s.fetcher.set_total(20);
        assert_eq!(s.load_more().await.unwrap(), Outcome::Applied);
        {
            let state = s.state();
            assert_eq!(state.items.len(), 20);
            assert_eq!(state.total_count, 20);
            assert!(!state.has_more());
            assert_eq!(state.phase, Phase::Ready);
        }

        assert_eq!(s.load_more().await.unwrap(), Outcome::Skipped);
        assert_eq!(s.fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_more_before_any_search_is_skipped() {
        let s = session(ScriptedFetcher::new(40));
        assert_eq!(s.load_more().await.unwrap(), Outcome::Skipped);
        assert_eq!(s.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_failure_discards_previous_results() {
        let s = session(ScriptedFetcher::new(40));
        s.search(&acme()).await.unwrap();
        assert_eq!(s.state().items.len(), 20);

        s.fetcher.fail_at(Some("0"));
        let err = s.search(&acme()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        let state = s.state();
        assert_eq!(state.phase, Phase::Errored);
        assert!(state.items.is_empty());
        assert_eq!(state.total_count, 0);
    }

    #[tokio::test]
    async fn load_more_failure_keeps_partial_results_and_can_retry() {
        let s = session(ScriptedFetcher::new(40));
        s.search(&acme()).await.unwrap();

        s.fetcher.fail_at(Some("20"));
        assert!(s.load_more().await.is_err());
        {
            let state = s.state();
            assert_eq!(state.phase, Phase::Errored);
            assert_eq!(state.items.len(), 20);
            assert_eq!(state.offset, 0);
        }

        s.fetcher.fail_at(None);
        assert_eq!(s.load_more().await.unwrap(), Outcome::Applied);
        let state = s.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.items.len(), 40);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn not_found_envelope_is_an_empty_result() {
        let s = session(ScriptedFetcher::new(40));
        let outcome = s.search(&FilterSet::new().with("name", "Nothing")).await.unwrap();
        assert_eq!(outcome, Outcome::Applied);
        let state = s.state();
        assert_eq!(state.phase, Phase::Ready);
        assert!(state.items.is_empty());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn newer_search_discards_in_flight_load_more() {
        let fetcher = ScriptedFetcher::new(40).gated_at("20");
        let gate = fetcher.gate.clone();
        let s = Arc::new(session(fetcher));
        s.search(&acme()).await.unwrap();

        let mut rx = s.subscribe();
        let background = {
            let s = s.clone();
            tokio::spawn(async move { s.load_more().await })
        };
        while rx.borrow_and_update().phase != Phase::LoadingMore {
            rx.changed().await.unwrap();
        }
        {
            let state = s.state();
            assert!(state.is_fetching_more());
            assert!(!state.is_loading());
        }

        // A second load_more while one is in flight is a no-op.
        assert_eq!(s.load_more().await.unwrap(), Outcome::Skipped);

        s.search(&FilterSet::new().with("name", "Beta")).await.unwrap();
        gate.notify_one();
        assert_eq!(background.await.unwrap().unwrap(), Outcome::Stale);

        let state = s.state();
        assert_eq!(state.phase, Phase::Ready);
        assert_eq!(state.items.len(), 20);
        assert!(state.items.iter().all(|r| r.display("query") == "name:\"Beta*\""));
    }

    #[tokio::test]
    async fn reset_drops_in_flight_search() {
        let fetcher = ScriptedFetcher::new(40).gated_at("0");
        let gate = fetcher.gate.clone();
        let s = Arc::new(session(fetcher));

        let mut rx = s.subscribe();
        let background = {
            let s = s.clone();
            tokio::spawn(async move { s.search(&acme()).await })
        };
        while rx.borrow_and_update().phase != Phase::Searching {
            rx.changed().await.unwrap();
        }
        assert!(s.state().is_loading());
        assert!(!s.state().is_fetching_more());
        s.reset();
        gate.notify_one();
        assert_eq!(background.await.unwrap().unwrap(), Outcome::Stale);
        assert_eq!(s.state().phase, Phase::Idle);
        assert!(s.state().items.is_empty());
    }

    #[tokio::test]
    async fn sorted_view_leaves_arrival_order_alone() {
        let s = session(ScriptedFetcher::new(3));
        s.search(&acme()).await.unwrap();
        let sorted = s.sorted("index", SortDirection::Descending);
        assert_eq!(sorted[0].display("index"), "2");
        assert_eq!(s.state().items[0].display("index"), "0");
    }
}

//! One search at a time: derive a query, fetch results, remember it.

use crate::config::{SearchConfig, SearchOptions};
use crate::image::ImageSearchClient;
use crate::query::{DerivedQuery, QueryExtractor, SearchInput, GENERIC_QUERY};
use crate::shopping::ShoppingSearchClient;
use crate::SearchError;
use lens_commerce::{HistoryEntry, LibraryStore, SearchResultSet, SearchType};
use lens_observability::Diagnostics;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the orchestrator is in its cycle. Settled phases are reported to
/// observers and then give way to `Idle` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Succeeded,
    Failed,
}

/// User-facing notices emitted during a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    AnalyzingImage,
    UsingDemoData { reason: String },
    SearchCompleted { count: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::AnalyzingImage => write!(f, "Analyzing image..."),
            Notice::UsingDemoData { reason } => write!(f, "Showing demo results ({})", reason),
            Notice::SearchCompleted { count } => write!(f, "Search completed: {} results", count),
        }
    }
}

/// Hooks for a front end. Every method defaults to doing nothing, and none
/// of them can influence the search.
pub trait SearchObserver: Send + Sync {
    fn on_phase(&self, _phase: SearchPhase) {}

    fn on_query_derived(&self, _query: &str) {}

    fn on_notice(&self, _notice: &Notice) {}

    /// Results are ready to be shown.
    fn on_results(&self, _results: &SearchResultSet) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// What a completed search produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub query: String,
    pub results: SearchResultSet,
    pub search_type: SearchType,
    /// `None` when the query was a placeholder.
    pub history_entry: Option<HistoryEntry>,
}

#[derive(Default)]
struct OrchestratorState {
    phase: SearchPhase,
    search_term: String,
    results: Option<SearchResultSet>,
}

/// Runs searches end to end and keeps the latest results.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = SearchOrchestrator::from_config(config, library, Diagnostics::new());
/// let outcome = orchestrator
///     .submit(SearchInput::url("https://shop.example.com/products/vintage-camera.jpg"))
///     .await?;
/// assert_eq!(outcome.query, "vintage camera");
/// ```
pub struct SearchOrchestrator {
    extractor: QueryExtractor,
    shopping: ShoppingSearchClient,
    library: Arc<LibraryStore>,
    observer: Arc<dyn SearchObserver>,
    in_flight: AtomicBool,
    state: Mutex<OrchestratorState>,
}

/// Holds the in-flight flag; dropping it (including on cancellation)
/// releases the flag and returns the phase to `Idle`.
struct InFlight<'a> {
    orchestrator: &'a SearchOrchestrator,
}

impl<'a> InFlight<'a> {
    fn acquire(orchestrator: &'a SearchOrchestrator) -> Result<Self, SearchError> {
        orchestrator
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SearchError::Busy)?;
        Ok(Self { orchestrator })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.orchestrator.lock().phase = SearchPhase::Idle;
        self.orchestrator.in_flight.store(false, Ordering::Release);
    }
}

impl SearchOrchestrator {
    pub fn new(
        extractor: QueryExtractor,
        shopping: ShoppingSearchClient,
        library: Arc<LibraryStore>,
    ) -> Self {
        Self {
            extractor,
            shopping,
            library,
            observer: Arc::new(NoopObserver),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(OrchestratorState::default()),
        }
    }

    /// Wire up the reqwest-backed clients from one configuration.
    pub fn from_config(config: SearchConfig, library: Arc<LibraryStore>, diagnostics: Diagnostics) -> Self {
        let images = ImageSearchClient::new(&config, diagnostics.clone());
        let extractor = QueryExtractor::new(
            Arc::new(images),
            config.recognition_timeout(),
            diagnostics.clone(),
        );
        let shopping = ShoppingSearchClient::new(config, diagnostics);
        Self::new(extractor, shopping, library)
    }

    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn library(&self) -> &Arc<LibraryStore> {
        &self.library
    }

    pub fn phase(&self) -> SearchPhase {
        self.lock().phase
    }

    /// The query currently shown to the user.
    pub fn search_term(&self) -> String {
        self.lock().search_term.clone()
    }

    /// Results of the last successful search.
    pub fn current_results(&self) -> Option<SearchResultSet> {
        self.lock().results.clone()
    }

    pub async fn submit(&self, input: SearchInput) -> Result<SearchOutcome, SearchError> {
        self.submit_with(input, SearchOptions::default()).await
    }

    /// Run one search. Fails with [`SearchError::Busy`] if one is running.
    pub async fn submit_with(
        &self,
        input: SearchInput,
        options: SearchOptions,
    ) -> Result<SearchOutcome, SearchError> {
        let _guard = InFlight::acquire(self)?;
        input.validate()?;

        self.set_phase(SearchPhase::Searching);
        let outcome = self.run(&input, options).await;

        match &outcome {
            Ok(done) => {
                tracing::info!(
                    query = %done.query,
                    count = done.results.len(),
                    synthetic = done.results.is_synthetic_data,
                    "search succeeded"
                );
                self.set_phase(SearchPhase::Succeeded);
            }
            Err(e) => {
                tracing::warn!(error = %e, "search failed");
                self.set_phase(SearchPhase::Failed);
            }
        }
        self.set_phase(SearchPhase::Idle);
        outcome
    }

    async fn run(&self, input: &SearchInput, mut options: SearchOptions) -> Result<SearchOutcome, SearchError> {
        if matches!(input, SearchInput::Image(_)) {
            self.observer.on_notice(&Notice::AnalyzingImage);
        }

        let derived: DerivedQuery = self.extractor.derive_query(input, options.mock).await?;
        self.lock().search_term = derived.query.clone();
        self.observer.on_query_derived(&derived.query);

        options.is_book = options.is_book || derived.is_book;
        let mut results = self.shopping.search_with(&derived.query, &options).await;

        if results.is_empty() {
            tracing::warn!(query = %derived.query, "no results, retrying with generic demo query");
            let retry = SearchOptions {
                is_book: false,
                ..options.clone()
            }
            .with_mock(true);
            results = self.shopping.search_with(GENERIC_QUERY, &retry).await;
        }
        if results.is_empty() {
            return Err(SearchError::NoResults(derived.query));
        }

        if results.is_synthetic_data {
            let reason = results
                .fallback_reason
                .clone()
                .unwrap_or_else(|| "demo data".to_string());
            self.observer.on_notice(&Notice::UsingDemoData { reason });
        }

        let search_type = input.search_type();
        let history_entry = derived
            .is_meaningful()
            .then(|| self.library.add_history(&derived.query, search_type));

        self.lock().results = Some(results.clone());
        self.observer.on_results(&results);
        self.observer
            .on_notice(&Notice::SearchCompleted { count: results.len() });

        Ok(SearchOutcome {
            query: derived.query,
            results,
            search_type,
            history_entry,
        })
    }

    fn set_phase(&self, phase: SearchPhase) {
        self.lock().phase = phase;
        self.observer.on_phase(phase);
    }

    fn lock(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageMatches, VisualRecognizer};
    use crate::query::{ImageFile, PLACEHOLDER_QUERY};
    use async_trait::async_trait;
    use lens_cache::{Cache, StoreScope};
    use lens_data::{FetchError, HttpTransport, RequestBuilder, Response, TimeoutConfig};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    struct NoMatches;

    #[async_trait]
    impl VisualRecognizer for NoMatches {
        async fn recognize(&self, _image_url: &str, _mock: Option<bool>) -> ImageMatches {
            ImageMatches::default()
        }
    }

    /// Signals when a request arrives, then waits to be released.
    struct Gate {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl HttpTransport for Gate {
        async fn execute(
            &self,
            _request: RequestBuilder,
            _timeouts: TimeoutConfig,
        ) -> Result<Response, FetchError> {
            self.started.notify_one();
            self.release.notified().await;
            Err(FetchError::Connection("offline".into()))
        }
    }

    /// Counts requests and fails every one of them.
    #[derive(Default)]
    struct Offline {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for Offline {
        async fn execute(
            &self,
            _request: RequestBuilder,
            _timeouts: TimeoutConfig,
        ) -> Result<Response, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Connection("offline".into()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        phases: Mutex<Vec<SearchPhase>>,
        notices: Mutex<Vec<Notice>>,
        queries: Mutex<Vec<String>>,
    }

    impl SearchObserver for Recorder {
        fn on_phase(&self, phase: SearchPhase) {
            self.phases.lock().unwrap().push(phase);
        }

        fn on_query_derived(&self, query: &str) {
            self.queries.lock().unwrap().push(query.to_string());
        }

        fn on_notice(&self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    fn library() -> Arc<LibraryStore> {
        Arc::new(LibraryStore::open(Cache::in_memory(), StoreScope::Anonymous))
    }

    fn mock_config() -> SearchConfig {
        SearchConfig {
            mock_mode: true,
            ..SearchConfig::default()
        }
    }

    fn extractor() -> QueryExtractor {
        QueryExtractor::new(Arc::new(NoMatches), Duration::from_secs(1), Diagnostics::new())
    }

    fn orchestrator(config: SearchConfig) -> SearchOrchestrator {
        let shopping = ShoppingSearchClient::new(config, Diagnostics::new());
        SearchOrchestrator::new(extractor(), shopping, library())
    }

    // === Scenarios ===

    #[tokio::test]
    async fn test_url_search_records_history() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(mock_config()).with_observer(recorder.clone());

        let outcome = orchestrator
            .submit(SearchInput::url("https://shop.example.com/products/vintage-camera.jpg"))
            .await
            .unwrap();

        assert_eq!(outcome.query, "vintage camera");
        assert!(outcome.results.is_synthetic_data);
        assert_eq!(outcome.search_type, SearchType::Url);
        assert_eq!(orchestrator.search_term(), "vintage camera");
        assert_eq!(orchestrator.current_results(), Some(outcome.results.clone()));
        assert_eq!(orchestrator.phase(), SearchPhase::Idle);

        let history = orchestrator.library().history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].search_term, "vintage camera");
        assert_eq!(Some(history[0].clone()), outcome.history_entry);

        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![SearchPhase::Searching, SearchPhase::Succeeded, SearchPhase::Idle]
        );
        let notices = recorder.notices.lock().unwrap();
        assert!(matches!(notices[0], Notice::UsingDemoData { .. }));
        assert_eq!(notices[1], Notice::SearchCompleted { count: 5 });
    }

    #[tokio::test]
    async fn test_bare_host_url_searches_product() {
        let orchestrator = orchestrator(mock_config());
        let outcome = orchestrator
            .submit(SearchInput::url("https://www.example.com"))
            .await
            .unwrap();
        assert_eq!(outcome.query, "product");
        assert!(!outcome.results.is_empty());
    }

    // === Input and placeholders ===

    #[tokio::test]
    async fn test_blank_input_rejected_without_state_change() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(mock_config()).with_observer(recorder.clone());

        let err = orchestrator.submit(SearchInput::url("  ")).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        assert!(recorder.phases.lock().unwrap().is_empty());
        assert_eq!(orchestrator.phase(), SearchPhase::Idle);

        // The guard was released.
        assert!(orchestrator.submit(SearchInput::url("https://a.test/lamp")).await.is_ok());
    }

    #[tokio::test]
    async fn test_placeholder_query_not_added_to_history() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(mock_config()).with_observer(recorder.clone());

        let image = ImageFile::new("IMG_0001.jpg", vec![1, 2, 3]);
        let outcome = orchestrator.submit(SearchInput::image(image)).await.unwrap();

        assert_eq!(outcome.query, GENERIC_QUERY);
        assert_eq!(outcome.search_type, SearchType::Image);
        assert!(outcome.history_entry.is_none());
        assert!(orchestrator.library().history().is_empty());
        assert_eq!(recorder.notices.lock().unwrap()[0], Notice::AnalyzingImage);
    }

    #[tokio::test]
    async fn test_mock_option_reaches_image_recognition() {
        let transport = Arc::new(Offline::default());
        let live = SearchConfig {
            mock_mode: false,
            ..SearchConfig::default()
        };
        let diagnostics = Diagnostics::new();
        let recognizer = ImageSearchClient::with_transport(transport.clone(), &live, diagnostics.clone());
        let extractor = QueryExtractor::new(Arc::new(recognizer), Duration::from_secs(1), diagnostics.clone());
        let shopping = ShoppingSearchClient::with_transport(transport.clone(), live, diagnostics.clone());
        let orchestrator = SearchOrchestrator::new(extractor, shopping, library());

        let image = ImageFile::new("brass-desk-lamp.jpg", vec![1, 2, 3]);
        let outcome = orchestrator
            .submit_with(SearchInput::image(image), SearchOptions::default().with_mock(true))
            .await
            .unwrap();

        assert_eq!(outcome.query, "brass desk lamp");
        assert!(outcome.results.is_synthetic_data);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_single_char_url_text_becomes_placeholder() {
        let orchestrator = orchestrator(mock_config());
        let outcome = orchestrator.submit(SearchInput::url("x")).await.unwrap();
        assert_eq!(outcome.query, PLACEHOLDER_QUERY);
        assert!(outcome.history_entry.is_none());
    }

    // === Failure ===

    #[tokio::test]
    async fn test_zero_limit_fails_after_generic_retry() {
        let recorder = Arc::new(Recorder::default());
        let orchestrator = orchestrator(mock_config()).with_observer(recorder.clone());

        let err = orchestrator
            .submit_with(
                SearchInput::url("https://a.test/desk-lamp"),
                SearchOptions::default().with_limit(0),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::NoResults(ref q) if q == "desk lamp"));
        assert!(orchestrator.current_results().is_none());
        assert!(orchestrator.library().history().is_empty());
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![SearchPhase::Searching, SearchPhase::Failed, SearchPhase::Idle]
        );
    }

    // === Concurrency ===

    #[tokio::test]
    async fn test_second_submit_while_searching_is_busy() {
        let gate = Arc::new(Gate {
            started: Notify::new(),
            release: Notify::new(),
        });
        let config = SearchConfig {
            api_key: "k".into(),
            proxy_enabled: false,
            ..SearchConfig::default()
        };
        let shopping = ShoppingSearchClient::with_transport(gate.clone(), config, Diagnostics::new());
        let orchestrator = Arc::new(SearchOrchestrator::new(extractor(), shopping, library()));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(SearchInput::url("https://a.test/desk-lamp")).await })
        };

        gate.started.notified().await;
        assert_eq!(orchestrator.phase(), SearchPhase::Searching);
        let err = orchestrator
            .submit(SearchInput::url("https://a.test/floor-lamp"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Busy));

        gate.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(outcome.results.is_synthetic_data);
        assert_eq!(orchestrator.phase(), SearchPhase::Idle);
        assert_eq!(orchestrator.library().history().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_search_releases_guard() {
        let gate = Arc::new(Gate {
            started: Notify::new(),
            release: Notify::new(),
        });
        let config = SearchConfig {
            api_key: "k".into(),
            proxy_enabled: false,
            ..SearchConfig::default()
        };
        let shopping = ShoppingSearchClient::with_transport(gate.clone(), config, Diagnostics::new());
        let orchestrator = SearchOrchestrator::new(extractor(), shopping, library());

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            orchestrator.submit(SearchInput::url("https://a.test/desk-lamp")),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(orchestrator.phase(), SearchPhase::Idle);

        gate.release.notify_one();
        assert!(orchestrator.submit(SearchInput::url("https://a.test/desk-lamp")).await.is_ok());
    }
}

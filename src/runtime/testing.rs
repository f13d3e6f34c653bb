//! Mock backend and runtime harness for testing
//!
//! These mocks enable runtime tests without a real backend.

use super::{RuntimeHandle, SessionRuntime, UiEvent};
use crate::gateway::{Backend, GatewayError, IngestRequest, IngestResponse, QueryRequest, QueryResponse};
use crate::state_machine::{AppState, Event};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Notify};

// ============================================================================
// Mock Backend
// ============================================================================

/// Mock backend that returns queued responses
#[derive(Default)]
pub struct MockBackend {
    ingest_responses: Mutex<VecDeque<Result<IngestResponse, GatewayError>>>,
    query_responses: Mutex<VecDeque<Result<QueryResponse, GatewayError>>>,
    /// Record of all ingest requests made
    pub ingest_requests: Mutex<Vec<IngestRequest>>,
    /// Record of all query requests made
    pub query_requests: Mutex<Vec<QueryRequest>>,
    hold_queries: AtomicBool,
    release: Notify,
    abandoned_queries: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_ingest(&self, doc_id: &str) {
        self.ingest_responses
            .lock()
            .unwrap()
            .push_back(Ok(IngestResponse {
                doc_id: doc_id.to_string(),
                status: Some("Article indexed successfully".to_string()),
            }));
    }

    pub fn queue_ingest_error(&self, error: GatewayError) {
        self.ingest_responses.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_answer(&self, answer: &str) {
        self.query_responses
            .lock()
            .unwrap()
            .push_back(Ok(QueryResponse {
                answer: answer.to_string(),
            }));
    }

    pub fn queue_query_error(&self, error: GatewayError) {
        self.query_responses.lock().unwrap().push_back(Err(error));
    }

    /// Make queries wait until [`Self::release_queries`] is called
    pub fn hold_queries(&self) {
        self.hold_queries.store(true, Ordering::SeqCst);
    }

    pub fn release_queries(&self) {
        self.hold_queries.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
    }

    /// Queries whose future was dropped before it finished
    pub fn abandoned_queries(&self) -> usize {
        self.abandoned_queries.load(Ordering::SeqCst)
    }

    pub fn recorded_ingests(&self) -> Vec<IngestRequest> {
        self.ingest_requests.lock().unwrap().clone()
    }

    pub fn recorded_queries(&self) -> Vec<QueryRequest> {
        self.query_requests.lock().unwrap().clone()
    }
}

/// Counts the query as abandoned unless it runs to completion
struct QueryGuard<'a> {
    abandoned: &'a AtomicUsize,
    finished: bool,
}

impl Drop for QueryGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn ingest(&self, request: &IngestRequest) -> Result<IngestResponse, GatewayError> {
        self.ingest_requests.lock().unwrap().push(request.clone());
        self.ingest_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock ingest response queued")))
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, GatewayError> {
        self.query_requests.lock().unwrap().push(request.clone());
        let mut guard = QueryGuard {
            abandoned: &self.abandoned_queries,
            finished: false,
        };
        if self.hold_queries.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        guard.finished = true;
        self.query_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock query response queued")))
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// Helper for running a session runtime against a mock backend
pub struct TestRuntime {
    pub backend: Arc<MockBackend>,
    pub handle: RuntimeHandle,
    pub ui_rx: broadcast::Receiver<UiEvent>,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

impl TestRuntime {
    pub fn new(backend: MockBackend) -> Self {
        let backend = Arc::new(backend);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, ui_rx) = broadcast::channel(128);

        let runtime = SessionRuntime::new(
            AppState::default(),
            Arc::clone(&backend),
            event_rx,
            event_tx.downgrade(),
            broadcast_tx.clone(),
        );
        let handle = tokio::spawn(runtime.run());

        TestRuntime {
            backend,
            handle: RuntimeHandle {
                event_tx,
                broadcast_tx,
            },
            ui_rx,
            _runtime_handle: handle,
        }
    }

    pub async fn send(&self, event: Event) {
        self.handle.send(event).await.expect("Failed to send event");
    }

    pub async fn submit_url(&self, url: &str) {
        self.send(Event::SubmitUrl {
            url: url.to_string(),
        })
        .await;
    }

    pub async fn ask(&self, question: &str) {
        self.send(Event::Ask {
            question: question.to_string(),
        })
        .await;
    }

    /// Wait for the first published state matching `predicate`
    pub async fn wait_for_state(
        &mut self,
        predicate: impl Fn(&AppState) -> bool,
        timeout: Duration,
    ) -> Option<AppState> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.ui_rx.recv()).await {
                Ok(Ok(UiEvent::StateChanged { state })) if predicate(&state) => {
                    return Some(state);
                }
                _ => continue,
            }
        }
        None
    }

    /// Wait until the backend has seen `count` queries
    pub async fn wait_for_queries(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.backend.recorded_queries().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    /// Collect every UI event published within `window`
    pub async fn drain(&mut self, window: Duration) -> Vec<UiEvent> {
        let mut events = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Ok(event)) = tokio::time::timeout_at(deadline, self.ui_rx.recv()).await {
            events.push(event);
        }
        events
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::state::{ERROR_PLACEHOLDER, WELCOME_MESSAGE};
    use crate::state_machine::{Origin, Phase, TextEdit};

    const RUST_URL: &str = "https://en.wikipedia.org/wiki/Rust";
    const WAIT: Duration = Duration::from_secs(2);

    fn texts(state: &AppState) -> Vec<(Origin, String)> {
        state
            .transcript
            .as_ref()
            .map(|t| {
                t.messages()
                    .iter()
                    .map(|m| (m.origin, m.text.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn ready_runtime(backend: MockBackend) -> TestRuntime {
        backend.queue_ingest("abc123");
        let mut rt = TestRuntime::new(backend);
        rt.submit_url(RUST_URL).await;
        rt.wait_for_state(|s| s.session.is_ready(), WAIT)
            .await
            .expect("session should become ready");
        rt
    }

    #[tokio::test]
    async fn test_mock_backend_queue() {
        let mock = MockBackend::new();
        mock.queue_answer("Hello");

        let request = QueryRequest {
            question: "Hi".to_string(),
            doc_id: None,
        };
        let response = mock.query(&request).await.unwrap();
        assert_eq!(response.answer, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.query(&request).await.is_err());
        assert_eq!(mock.recorded_queries().len(), 2);
        assert_eq!(mock.abandoned_queries(), 0);
    }

    #[tokio::test]
    async fn test_ingest_success_opens_chat() {
        let backend = MockBackend::new();
        backend.queue_ingest("abc123");
        let mut rt = TestRuntime::new(backend);

        rt.submit_url(RUST_URL).await;
        let ingesting = rt
            .wait_for_state(|s| s.session.phase == Phase::Ingesting, WAIT)
            .await;
        assert!(ingesting.is_some());

        let ready = rt
            .wait_for_state(|s| s.session.is_ready(), WAIT)
            .await
            .expect("session should become ready");
        assert_eq!(ready.session.document().unwrap().as_str(), "abc123");
        assert_eq!(texts(&ready), vec![(Origin::Bot, WELCOME_MESSAGE.to_string())]);
        assert_eq!(rt.backend.recorded_ingests()[0].url, RUST_URL);
    }

    #[tokio::test]
    async fn test_ingest_failure_returns_to_input() {
        let backend = MockBackend::new();
        backend.queue_ingest_error(
            GatewayError::status(400, "HTTP 400 Bad Request")
                .with_detail(Some("URL must start with 'https://en.wikipedia.org/wiki/'.".into())),
        );
        let mut rt = TestRuntime::new(backend);

        rt.submit_url("https://example.com/wiki/Rust").await;
        let state = rt
            .wait_for_state(|s| s.session.last_error.is_some(), WAIT)
            .await
            .expect("error should be reported");
        assert_eq!(state.session.phase, Phase::AwaitingInput);
        assert!(state.session.document().is_none());
        assert_eq!(
            state.session.last_error.unwrap().to_string(),
            "URL must start with 'https://en.wikipedia.org/wiki/'."
        );
    }

    #[tokio::test]
    async fn test_blank_url_never_reaches_backend() {
        let mut rt = TestRuntime::new(MockBackend::new());
        rt.submit_url("   ").await;
        let state = rt
            .wait_for_state(|s| s.session.last_error.is_some(), WAIT)
            .await
            .unwrap();
        assert_eq!(state.session.phase, Phase::AwaitingInput);
        assert!(rt.backend.recorded_ingests().is_empty());
    }

    #[tokio::test]
    async fn test_question_answered() {
        let backend = MockBackend::new();
        backend.queue_answer("It is about a language.");
        let mut rt = ready_runtime(backend).await;

        rt.ask("What is it about?").await;
        let state = rt
            .wait_for_state(|s| s.transcript.as_ref().is_some_and(|t| t.len() == 3), WAIT)
            .await
            .expect("answer should arrive");

        assert_eq!(
            texts(&state)[1..],
            [
                (Origin::User, "What is it about?".to_string()),
                (Origin::Bot, "It is about a language.".to_string()),
            ]
        );
        let transcript = state.transcript.unwrap();
        assert!(!transcript.pending);
        assert!(transcript.error.is_none());

        let sent = rt.backend.recorded_queries();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].question, "What is it about?");
        assert_eq!(sent[0].doc_id.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_question_failure_appends_placeholder() {
        let backend = MockBackend::new();
        backend.queue_query_error(GatewayError::network("Connection failed"));
        let mut rt = ready_runtime(backend).await;

        rt.ask("?").await;
        let state = rt
            .wait_for_state(|s| s.transcript.as_ref().is_some_and(|t| t.len() == 3), WAIT)
            .await
            .expect("failure should settle");
        assert_eq!(
            texts(&state)[1..],
            [
                (Origin::User, "?".to_string()),
                (Origin::Bot, ERROR_PLACEHOLDER.to_string()),
            ]
        );
        assert_eq!(
            state.transcript.unwrap().error.unwrap().to_string(),
            "Unknown error querying the chatbot."
        );
    }

    #[tokio::test]
    async fn test_second_question_rejected_while_pending() {
        let backend = MockBackend::new();
        backend.hold_queries();
        backend.queue_answer("First answer");
        let mut rt = ready_runtime(backend).await;

        rt.ask("First?").await;
        assert!(rt.wait_for_queries(1, WAIT).await);
        rt.ask("Second?").await;

        let events = rt.drain(Duration::from_millis(200)).await;
        assert!(events.iter().any(|e| matches!(
            e,
            UiEvent::Rejected { message } if message == "Still waiting for the previous answer"
        )));

        rt.backend.release_queries();
        let state = rt
            .wait_for_state(|s| s.transcript.as_ref().is_some_and(|t| !t.pending && t.len() == 3), WAIT)
            .await
            .unwrap();
        assert_eq!(texts(&state)[2], (Origin::Bot, "First answer".to_string()));
        assert_eq!(rt.backend.recorded_queries().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_aborts_question_in_flight() {
        let backend = MockBackend::new();
        backend.hold_queries();
        backend.queue_answer("Stale answer");
        let mut rt = ready_runtime(backend).await;

        rt.ask("Slow?").await;
        assert!(rt.wait_for_queries(1, WAIT).await);
        rt.send(Event::Reset).await;
        let reset = rt
            .wait_for_state(|s| s.session.phase == Phase::AwaitingInput, WAIT)
            .await
            .unwrap();
        assert!(reset.transcript.is_none());
        assert!(reset.session.input_url.is_empty());

        // Let the aborted task observe cancellation
        rt.drain(Duration::from_millis(100)).await;
        assert_eq!(rt.backend.abandoned_queries(), 1);

        rt.backend.queue_ingest("def456");
        rt.submit_url(RUST_URL).await;
        let fresh = rt
            .wait_for_state(|s| s.session.is_ready(), WAIT)
            .await
            .unwrap();
        rt.backend.release_queries();
        let later = rt.drain(Duration::from_millis(200)).await;
        assert!(!later
            .iter()
            .any(|e| matches!(e, UiEvent::StateChanged { .. })));
        assert_eq!(texts(&fresh), vec![(Origin::Bot, WELCOME_MESSAGE.to_string())]);
    }

    #[tokio::test]
    async fn test_scroll_follows_each_append() {
        let backend = MockBackend::new();
        backend.queue_ingest("abc123");
        backend.queue_answer("It is about a language.");
        let mut rt = TestRuntime::new(backend);

        rt.submit_url(RUST_URL).await;
        rt.wait_for_state(|s| s.session.is_ready(), WAIT)
            .await
            .unwrap();
        rt.ask("What is it about?").await;
        let events = rt.drain(Duration::from_millis(300)).await;

        let scrolls: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                UiEvent::ScrollToLatest { sequence, .. } => Some(*sequence),
                _ => None,
            })
            .collect();
        // welcome, question, answer
        assert_eq!(scrolls.len(), 3, "one scroll per appended message");
        assert!(scrolls.windows(2).all(|w| w[0] < w[1]));

        let last_state = events
            .iter()
            .rev()
            .find_map(|e| match e {
                UiEvent::StateChanged { state } => Some(state.clone()),
                _ => None,
            })
            .unwrap();
        let last = last_state.transcript.unwrap().last().unwrap().sequence;
        assert_eq!(*scrolls.last().unwrap(), last);
    }

    #[tokio::test]
    async fn test_typed_input_submits() {
        let backend = MockBackend::new();
        backend.queue_ingest("abc123");
        let mut rt = TestRuntime::new(backend);

        rt.send(Event::InputEdited(TextEdit::InsertStr(RUST_URL.to_string())))
            .await;
        rt.send(Event::SubmitInput).await;
        rt.wait_for_state(|s| s.session.is_ready(), WAIT)
            .await
            .unwrap();
        assert_eq!(rt.backend.recorded_ingests()[0].url, RUST_URL);
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let backend = Arc::new(MockBackend::new());
        let (handle, task) = crate::runtime::spawn(Arc::clone(&backend));
        drop(handle);
        tokio::time::timeout(WAIT, task)
            .await
            .expect("runtime should stop")
            .unwrap();
    }
}

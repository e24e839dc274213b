//! Debounced, versioned preview execution.
//!
//! Keeps a live picture of "dataset after applying the recipe so far"
//! without hitting the remote evaluator on every keystroke:
//!
//! - every recipe edit starts (or restarts) an 800 ms quiet-period timer;
//!   only a timer that survives the quiet period issues a request, so an
//!   edit burst costs exactly one round-trip;
//! - every request carries the recipe version it was built from, and a
//!   response is applied only while that version is still the latest.
//!   Results therefore land in recipe-version order, never in network
//!   arrival order;
//! - a not-yet-fired timer is cancelled outright by the next edit; an
//!   already-issued request is never aborted; its response is discarded
//!   by the version check instead.

use crate::api::types::{PipelinePayload, PreviewData};
use crate::error::{PrimaError, Result};
use crate::recipe::Recipe;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Inline error shown when the remote evaluator rejects the recipe.
pub const PREVIEW_VALIDATION_MESSAGE: &str = "Failed to generate preview. Check column names.";

/// Inline error shown when the request could not complete at all.
pub const PREVIEW_TRANSPORT_MESSAGE: &str =
    "Preview request failed. Check your connection and retry.";

/// The remote evaluator seam. [`crate::api::ApiClient`] is the production
/// implementation; tests substitute doubles (the evaluator is assumed to be
/// a pure function of payload + session).
#[async_trait]
pub trait PreviewBackend: Send + Sync + 'static {
    async fn preview(&self, payload: &PipelinePayload) -> Result<PreviewData>;
}

/// Observable preview state.
///
/// `result` holds the last successfully applied preview. After a failure
/// or while a newer recipe is being evaluated it is flagged `stale` so it
/// is never presented as reflecting the current recipe.
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    pub result: Option<PreviewData>,
    pub error: Option<String>,
    pub stale: bool,
    pub loading: bool,
    /// Recipe version the current `result` was computed from.
    pub version: u64,
}

struct Pending {
    handle: JoinHandle<()>,
    issued: Arc<AtomicBool>,
}

/// Drives speculative re-evaluation of a recipe against one dataset
/// session.
pub struct PreviewExecutor {
    backend: Arc<dyn PreviewBackend>,
    session_id: String,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    state: Arc<Mutex<PreviewState>>,
    pending: Option<Pending>,
}

impl PreviewExecutor {
    pub fn new(
        backend: Arc<dyn PreviewBackend>,
        session_id: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        Self {
            backend,
            session_id: session_id.into(),
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(PreviewState::default())),
            pending: None,
        }
    }

    /// Snapshot of the current preview state.
    pub fn state(&self) -> PreviewState {
        lock(&self.state).clone()
    }

    /// The most recent recipe version this executor has seen.
    pub fn latest_version(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Notify the executor that the recipe changed (append/update/remove).
    ///
    /// Restarts the quiet-period timer, marks any existing result stale and
    /// schedules a preview of the new recipe version. Must be called from
    /// within a Tokio runtime.
    pub fn recipe_changed(&mut self, recipe: &Recipe) {
        let version = recipe.version();
        self.latest.store(version, Ordering::SeqCst);

        // A timer that has not fired yet is cancelled outright. An issued
        // request keeps running; its response fails the version check.
        if let Some(pending) = self.pending.take() {
            if !pending.issued.load(Ordering::SeqCst) {
                pending.handle.abort();
            }
        }

        {
            let mut state = lock(&self.state);
            state.stale = state.result.is_some();
            state.loading = true;
        }

        let payload = PipelinePayload::new(self.session_id.clone(), recipe);
        let issued = Arc::new(AtomicBool::new(false));
        let backend = Arc::clone(&self.backend);
        let latest = Arc::clone(&self.latest);
        let state = Arc::clone(&self.state);
        let issued_flag = Arc::clone(&issued);
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // Superseded during the quiet period: no request at all.
            if latest.load(Ordering::SeqCst) != version {
                return;
            }
            issued_flag.store(true, Ordering::SeqCst);

            let outcome = backend.preview(&payload).await;

            let mut state = lock(&state);
            if latest.load(Ordering::SeqCst) != version {
                tracing::debug!(version, "discarding stale preview response");
                return;
            }
            state.loading = false;
            match outcome {
                Ok(data) => {
                    tracing::debug!(version, rows = data.rows, "preview applied");
                    state.result = Some(data);
                    state.error = None;
                    state.stale = false;
                    state.version = version;
                }
                Err(e) => {
                    tracing::warn!(version, "preview failed: {e}");
                    state.error = Some(error_message(&e));
                    state.stale = state.result.is_some();
                }
            }
        });

        self.pending = Some(Pending { handle, issued });
    }

    /// Wait for the currently scheduled preview cycle (if any) to finish.
    pub async fn settled(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.handle.await;
        }
    }
}

fn error_message(err: &PrimaError) -> String {
    match err {
        PrimaError::Remote { .. } => PREVIEW_VALIDATION_MESSAGE.to_owned(),
        PrimaError::Transport(_) => PREVIEW_TRANSPORT_MESSAGE.to_owned(),
        other => other.to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    /// Pure stub evaluator: answers with `rows = step count` so responses
    /// for different recipe versions are distinguishable, with an optional
    /// per-call artificial latency.
    #[derive(Default)]
    struct StubBackend {
        calls: AtomicUsize,
        delays: Mutex<VecDeque<Duration>>,
        fail_with: Mutex<Option<PrimaError>>,
    }

    impl StubBackend {
        fn with_delays(delays: impl IntoIterator<Item = Duration>) -> Self {
            Self {
                delays: Mutex::new(delays.into_iter().collect()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail_next(&self, err: PrimaError) {
            *lock(&self.fail_with) = Some(err);
        }
    }

    #[async_trait]
    impl PreviewBackend for StubBackend {
        async fn preview(&self, payload: &PipelinePayload) -> Result<PreviewData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = lock(&self.delays).pop_front().unwrap_or_default();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = lock(&self.fail_with).take() {
                return Err(err);
            }
            Ok(PreviewData {
                rows: payload.steps.len() as u64,
                columns: vec!["Age".to_owned()],
                data: vec![],
            })
        }
    }

    /// Let spawned preview tasks run to their next suspension point.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn executor(backend: &Arc<StubBackend>) -> PreviewExecutor {
        PreviewExecutor::new(
            Arc::clone(backend) as Arc<dyn PreviewBackend>,
            "sess-1",
            Duration::from_millis(800),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_burst_issues_exactly_one_request() {
        let backend = Arc::new(StubBackend::default());
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        recipe.append("drop_column");
        exec.recipe_changed(&recipe);
        recipe.append("fill_na_median");
        exec.recipe_changed(&recipe);
        recipe.append("minmax_scaler");
        exec.recipe_changed(&recipe);

        // Let the surviving debounce task start and arm its timer before
        // the (paused) clock is advanced.
        settle().await;

        // 799 ms after the last edit: still inside the quiet period.
        tokio::time::advance(Duration::from_millis(799)).await;
        settle().await;
        assert_eq!(backend.calls(), 0);
        assert!(exec.state().loading);

        // The 800th millisecond fires the one surviving timer.
        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(backend.calls(), 1);

        let state = exec.state();
        assert_eq!(state.result.expect("preview applied").rows, 3);
        assert!(!state.loading);
        assert!(!state.stale);
        assert_eq!(state.version, recipe.version());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_never_overwrites_newer_result() {
        // First request takes 1000 ms, second 10 ms: the v1 response
        // arrives after the v2 response has already been applied.
        let backend = Arc::new(StubBackend::with_delays([
            Duration::from_millis(1000),
            Duration::from_millis(10),
        ]));
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        recipe.append("drop_column");
        exec.recipe_changed(&recipe);

        // Let the debounce task arm its timer before advancing the clock.
        settle().await;

        // Quiet period elapses; request A (v1) goes out.
        tokio::time::advance(Duration::from_millis(800)).await;
        settle().await;
        assert_eq!(backend.calls(), 1);

        // Edit while A is in flight.
        recipe.append("fill_na_median");
        exec.recipe_changed(&recipe);
        settle().await;
        tokio::time::advance(Duration::from_millis(800)).await;
        settle().await;
        assert_eq!(backend.calls(), 2);

        // B (v2) completes first and is applied.
        tokio::time::advance(Duration::from_millis(10)).await;
        settle().await;
        assert_eq!(exec.state().result.as_ref().expect("v2 applied").rows, 2);

        // A (v1) completes afterwards and must be discarded.
        tokio::time::advance(Duration::from_millis(1000)).await;
        settle().await;
        let state = exec.state();
        assert_eq!(state.result.expect("v2 kept").rows, 2);
        assert!(state.error.is_none());
        assert!(!state.stale);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_issues_no_request() {
        let backend = Arc::new(StubBackend::default());
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        recipe.append("drop_column");
        exec.recipe_changed(&recipe);
        recipe.append("fill_na_median");
        exec.recipe_changed(&recipe);

        // Let the surviving debounce task arm its timer before advancing.
        settle().await;

        // Even after both original deadlines pass, only the last edit's
        // timer produced a request.
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_inline_error_and_marks_result_stale() {
        let backend = Arc::new(StubBackend::default());
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        recipe.append("drop_column");
        exec.recipe_changed(&recipe);
        exec.settled().await;
        assert!(exec.state().result.is_some());

        backend.fail_next(PrimaError::Remote {
            status: 422,
            detail: "Column 'Cabin' not found".to_owned(),
        });
        recipe.append("fill_na_median");
        exec.recipe_changed(&recipe);
        exec.settled().await;

        let state = exec.state();
        assert_eq!(state.error.as_deref(), Some(PREVIEW_VALIDATION_MESSAGE));
        assert!(state.stale, "old result must not pose as current");
        assert!(state.result.is_some(), "last good preview is kept");

        // A later success clears the error.
        recipe.append("minmax_scaler");
        exec.recipe_changed(&recipe);
        exec.settled().await;
        let state = exec.state();
        assert!(state.error.is_none());
        assert!(!state.stale);
        assert_eq!(state.result.unwrap().rows, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_uses_retry_message() {
        let backend = Arc::new(StubBackend::default());
        backend.fail_next(PrimaError::Transport("connection refused".to_owned()));
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        recipe.append("drop_column");
        exec.recipe_changed(&recipe);
        exec.settled().await;

        let state = exec.state();
        assert_eq!(state.error.as_deref(), Some(PREVIEW_TRANSPORT_MESSAGE));
        assert!(state.result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_recipe_previews_base_dataset() {
        let backend = Arc::new(StubBackend::default());
        let mut exec = executor(&backend);

        let mut recipe = Recipe::new();
        let id = recipe.append("drop_column").id.clone();
        recipe.remove(&id);
        exec.recipe_changed(&recipe);
        exec.settled().await;

        // Zero steps is a valid preview of the untouched sample.
        assert_eq!(backend.calls(), 1);
        assert_eq!(exec.state().result.unwrap().rows, 0);
    }
}

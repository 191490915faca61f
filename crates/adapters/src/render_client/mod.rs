// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter boundary for the render service: HTTP for request/response
//! operations, an independent WebSocket listener for progress events.

pub mod http;
pub mod queue_decode;
pub mod ws;

pub use http::{RenderHttpClient, RenderHttpError};
pub use ws::RenderServiceEvent;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRenderClient;

use sg_core::{AppError, AppResult};
use std::time::Duration;

const MAX_SUBMIT_ATTEMPTS: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// The operations the job dispatcher needs from the render service.
/// Kept narrow on purpose — `RenderHttpClient` exposes a wider surface
/// (history, object_info, view, system_stats) for callers that need it,
/// but only submission and interruption drive the dispatch loop.
#[async_trait::async_trait]
pub trait RenderClient: Clone + Send + Sync + 'static {
    async fn submit_prompt(&self, workflow: serde_json::Value, client_id: &str) -> Result<String, RenderHttpError>;
    async fn interrupt(&self) -> Result<(), RenderHttpError>;
}

impl From<RenderHttpError> for AppError {
    fn from(err: RenderHttpError) -> Self {
        match err {
            RenderHttpError::Unreachable(msg) => AppError::RenderServiceUnreachable(msg),
            RenderHttpError::ServiceError(msg) => AppError::RenderServiceError(msg),
            RenderHttpError::Malformed(msg) => AppError::MalformedResponse(msg),
        }
    }
}

/// Submit a workflow, retrying transient unreachable-service failures with
/// exponential backoff (1s, 2s, 4s, 8s, 16s, capped at 30s; 5 attempts
/// total). A non-transient `ServiceError`/`Malformed` response is returned
/// immediately without retrying.
pub async fn submit_with_retry<R: RenderClient>(
    client: &R,
    workflow: serde_json::Value,
    client_id: &str,
) -> AppResult<String> {
    let mut delay = INITIAL_RETRY_DELAY;
    let mut last_err = None;

    for attempt in 1..=MAX_SUBMIT_ATTEMPTS {
        match client.submit_prompt(workflow.clone(), client_id).await {
            Ok(prompt_id) => return Ok(prompt_id),
            Err(err @ RenderHttpError::Unreachable(_)) => {
                tracing::warn!(attempt, %err, "render service unreachable, will retry");
                last_err = Some(err);
                if attempt < MAX_SUBMIT_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }

    #[allow(clippy::unwrap_used)]
    Err(last_err.unwrap().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unreachable_to_render_service_unreachable() {
        let mapped: AppError = RenderHttpError::Unreachable("connection refused".into()).into();
        assert!(matches!(mapped, AppError::RenderServiceUnreachable(_)));
    }

    #[test]
    fn maps_malformed_to_malformed_response() {
        let mapped: AppError = RenderHttpError::Malformed("bad json".into()).into();
        assert!(matches!(mapped, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn submit_with_retry_gives_up_after_exhausting_attempts() {
        let client = fake::FakeRenderClient::new();
        client.fail_submit_n_times(MAX_SUBMIT_ATTEMPTS, RenderHttpError::Unreachable("down".into()));
        let err = submit_with_retry(&client, serde_json::json!({}), "c1").await.unwrap_err();
        assert!(matches!(err, AppError::RenderServiceUnreachable(_)));
        assert_eq!(client.submit_call_count(), MAX_SUBMIT_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn submit_with_retry_recovers_after_transient_failures() {
        let client = fake::FakeRenderClient::new();
        client.fail_submit_n_times(2, RenderHttpError::Unreachable("down".into()));
        client.queue_submit_success("prompt-1");
        let prompt_id = submit_with_retry(&client, serde_json::json!({}), "c1").await.expect("submit");
        assert_eq!(prompt_id, "prompt-1");
    }

    #[tokio::test]
    async fn submit_with_retry_does_not_retry_service_errors() {
        let client = fake::FakeRenderClient::new();
        client.queue_submit_failure(RenderHttpError::ServiceError("bad request".into()));
        let err = submit_with_retry(&client, serde_json::json!({}), "c1").await.unwrap_err();
        assert!(matches!(err, AppError::RenderServiceError(_)));
        assert_eq!(client.submit_call_count(), 1);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{RenderClient, RenderHttpError};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    enum QueuedSubmit {
        Ok(String),
        Err(RenderHttpError),
    }

    struct FakeState {
        submit_queue: VecDeque<QueuedSubmit>,
        submit_calls: usize,
        interrupt_calls: usize,
    }

    /// In-memory render-service double: programmed with a queue of
    /// submit outcomes consumed in order, recording call counts for
    /// assertions.
    #[derive(Clone)]
    pub struct FakeRenderClient {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeRenderClient {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    submit_queue: VecDeque::new(),
                    submit_calls: 0,
                    interrupt_calls: 0,
                })),
            }
        }
    }

    impl FakeRenderClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `submit_prompt` call succeeds with `prompt_id`.
        pub fn queue_submit_success(&self, prompt_id: impl Into<String>) {
            self.inner.lock().submit_queue.push_back(QueuedSubmit::Ok(prompt_id.into()));
        }

        /// The next `submit_prompt` call fails with `err`.
        pub fn queue_submit_failure(&self, err: RenderHttpError) {
            self.inner.lock().submit_queue.push_back(QueuedSubmit::Err(err));
        }

        /// The next `n` `submit_prompt` calls fail with clones of `err`.
        pub fn fail_submit_n_times(&self, n: u32, err: RenderHttpError) {
            let mut state = self.inner.lock();
            for _ in 0..n {
                state.submit_queue.push_back(QueuedSubmit::Err(clone_error(&err)));
            }
        }

        pub fn submit_call_count(&self) -> usize {
            self.inner.lock().submit_calls
        }

        pub fn interrupt_call_count(&self) -> usize {
            self.inner.lock().interrupt_calls
        }
    }

    fn clone_error(err: &RenderHttpError) -> RenderHttpError {
        match err {
            RenderHttpError::Unreachable(msg) => RenderHttpError::Unreachable(msg.clone()),
            RenderHttpError::ServiceError(msg) => RenderHttpError::ServiceError(msg.clone()),
            RenderHttpError::Malformed(msg) => RenderHttpError::Malformed(msg.clone()),
        }
    }

    #[async_trait::async_trait]
    impl RenderClient for FakeRenderClient {
        async fn submit_prompt(&self, _workflow: serde_json::Value, _client_id: &str) -> Result<String, RenderHttpError> {
            let mut state = self.inner.lock();
            state.submit_calls += 1;
            match state.submit_queue.pop_front() {
                Some(QueuedSubmit::Ok(prompt_id)) => Ok(prompt_id),
                Some(QueuedSubmit::Err(err)) => Err(err),
                None => Ok(format!("fake-prompt-{}", state.submit_calls)),
            }
        }

        async fn interrupt(&self) -> Result<(), RenderHttpError> {
            self.inner.lock().interrupt_calls += 1;
            Ok(())
        }
    }
}

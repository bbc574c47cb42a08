//! Mock language oracle for testing.
//!
//! Returns queued answers in order, can inject errors and latency, and
//! records every request so tests can assert whether (and how) the
//! oracle was consulted.
//!
//! # Example
//!
//! ```ignore
//! let oracle = MockOracle::new()
//!     .with_response(r#"{"label": "yes"}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    FinishReason, LanguageOracle, OracleError, OracleInfo, OracleRequest, OracleResponse,
    TokenUsage,
};

/// Mock oracle for testing.
#[derive(Debug, Clone)]
pub struct MockOracle {
    /// Pre-configured answers (consumed in order).
    responses: Arc<Mutex<VecDeque<MockAnswer>>>,
    info: OracleInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<OracleRequest>>>,
}

/// A configured mock answer.
#[derive(Debug, Clone)]
pub enum MockAnswer {
    Success(String),
    /// Content cut off at the token limit.
    Truncated(String),
    Error(OracleError),
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: OracleInfo::new("mock", "mock-oracle-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful answer to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockAnswer::Success(content.into()));
        self
    }

    /// Adds an answer that stopped at the token limit.
    pub fn with_truncated_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockAnswer::Truncated(content.into()));
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: OracleError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockAnswer::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this oracle.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded requests.
    pub fn get_calls(&self) -> Vec<OracleRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<OracleRequest> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn next_answer(&self) -> MockAnswer {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockAnswer::Success("Mock response".to_string()))
    }
}

#[async_trait]
impl LanguageOracle for MockOracle {
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError> {
        self.calls.lock().unwrap().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let (content, finish_reason) = match self.next_answer() {
            MockAnswer::Success(content) => (content, FinishReason::Stop),
            MockAnswer::Truncated(content) => (content, FinishReason::Length),
            MockAnswer::Error(err) => return Err(err),
        };

        Ok(OracleResponse {
            content,
            usage: TokenUsage::new(10, 5),
            model: self.info.model.clone(),
            finish_reason,
        })
    }

    fn oracle_info(&self) -> OracleInfo {
        self.info.clone()
    }
}

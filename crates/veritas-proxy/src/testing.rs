//! Test doubles for the outbound HTTP capability.
//!
//! Compiled for this crate's own tests and for dependents that enable the
//! `testing` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{UpstreamClient, UpstreamRequest, UpstreamResponse};
use crate::error::ProxyError;

/// Scripted [`UpstreamClient`] that records every request it receives.
///
/// Replies are consumed in order; once the script runs out every call gets
/// `200 {}`.
pub struct StubClient {
    replies: Mutex<VecDeque<Result<UpstreamResponse, ProxyError>>>,
    requests: Mutex<Vec<UpstreamRequest>>,
    hang: bool,
    call_count: AtomicUsize,
}

impl StubClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            hang: false,
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn respond(self, response: UpstreamResponse) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn respond_json(self, status: u16, body: Value) -> Self {
        self.respond(UpstreamResponse::json_body(status, &body))
    }

    pub fn fail_with(self, error: ProxyError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Never answer. Only a caller-side timeout ends the call.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for StubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpstreamClient for StubClient {
    async fn call(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if self.hang {
            std::future::pending::<()>().await;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok(UpstreamResponse::new(200, "{}")))
    }
}

//! In-memory search backend (testing only)
//!
//! `StaticBackend` answers every search with the same canned response or
//! error and records the requests it receives.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{BackendResult, SearchBackend, SearchRequest, SearchResponse};
use crate::error::BackendError;

/// Backend returning a fixed reply.
#[derive(Debug)]
pub struct StaticBackend {
    endpoint: String,
    reply: BackendResult<SearchResponse>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl StaticBackend {
    pub fn responding(response: SearchResponse) -> Self {
        Self::with_reply(Ok(response))
    }

    pub fn failing(error: BackendError) -> Self {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: BackendResult<SearchResponse>) -> Self {
        Self {
            endpoint: "memory://static".to_string(),
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for StaticBackend {
    async fn search(&self, request: &SearchRequest) -> BackendResult<SearchResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

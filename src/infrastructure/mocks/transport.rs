//! Mock similarity transport for testing.

use crate::application::client::SimilarIssuesRequest;
use crate::application::ports::{SimilarityTransport, TransportError};
use crate::domain::candidate::SimilarIssueCandidate;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

type TransportResult = Result<Vec<SimilarIssueCandidate>, TransportError>;

/// Controllable transport double.
///
/// Returns a fixed candidate list by default; one-off responses (including
/// failures) can be queued with [`push_response`](Self::push_response) and
/// are consumed in order before falling back to the fixed list. Records
/// every request it sees for assertion.
#[derive(Debug)]
pub struct MockTransport {
    fixed: Mutex<TransportResult>,
    queue: Mutex<VecDeque<TransportResult>>,
    calls: AtomicU64,
    last_request: Mutex<Option<SimilarIssuesRequest>>,
}

impl MockTransport {
    /// Create a transport that always returns the given candidates.
    pub fn returning(candidates: Vec<SimilarIssueCandidate>) -> Self {
        Self {
            fixed: Mutex::new(Ok(candidates)),
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a transport that always fails.
    pub fn failing(error: TransportError) -> Self {
        Self {
            fixed: Mutex::new(Err(error)),
            queue: Mutex::new(VecDeque::new()),
            calls: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Queue a one-off response consumed before the fixed result.
    pub fn push_response(&self, response: TransportResult) {
        self.lock(&self.queue).push_back(response);
    }

    /// Number of requests sent so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<SimilarIssuesRequest> {
        self.lock(&self.last_request).clone()
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex
            .lock()
            .expect("MockTransport mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl SimilarityTransport for MockTransport {
    fn send(&self, request: &SimilarIssuesRequest) -> TransportResult {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self.lock(&self.last_request) = Some(request.clone());

        if let Some(queued) = self.lock(&self.queue).pop_front() {
            return queued;
        }
        self.lock(&self.fixed).clone()
    }
}

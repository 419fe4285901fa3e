//! Mock transport and probes for unit testing
//!
//! Provides scripted stand-ins for the HTTP transport and the health probe so
//! the client and poller can be tested without a running service.
//!
//! # Example
//!
//! ```rust
//! use roaster::client::HttpResponse;
//! use roaster_testkit::mock::{MockTransport, health_body};
//!
//! // Two cold-start failures, then alive
//! let transport = MockTransport::new()
//!     .respond("/health", HttpResponse::new(503, "waking up"))
//!     .respond("/health", HttpResponse::new(503, "waking up"))
//!     .otherwise("/health", HttpResponse::new(200, health_body("alive")));
//!
//! assert_eq!(transport.request_count(), 0);
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use url::Url;

use roaster::client::{
    HttpResponse, RoastLevel, RoastRequest, RoastResponse, Transport, TransportError,
};
use roaster::readiness::{HealthProbe, ProbeNotReady};

type Scripted = Result<HttpResponse, TransportError>;

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: Url,
    /// JSON body for POSTs
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

#[derive(Debug, Default)]
struct Script {
    /// Consumed in order, per path
    queued: HashMap<String, VecDeque<Scripted>>,
    /// Used once a path's queue is empty
    fallback: HashMap<String, Scripted>,
}

/// Transport answering from a per-path script
///
/// Responses are keyed by URL path (e.g. `/health`). Queued responses are
/// served first, in order; after that the path's fallback repeats. A path with
/// neither fails with a [`TransportError`].
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<Script>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `path`
    pub fn respond(self, path: &str, response: HttpResponse) -> Self {
        self.enqueue(path, Ok(response));
        self
    }

    /// Queue one transport failure for `path`
    pub fn fail(self, path: &str, message: impl Into<String>) -> Self {
        self.enqueue(path, Err(TransportError(message.into())));
        self
    }

    /// Answer `path` with `response` whenever nothing is queued
    pub fn otherwise(self, path: &str, response: HttpResponse) -> Self {
        self.script
            .lock()
            .fallback
            .insert(path.to_string(), Ok(response));
        self
    }

    fn enqueue(&self, path: &str, scripted: Scripted) {
        self.script
            .lock()
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    /// Wrap in an `Arc` so a test can keep inspecting it after handing it out
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// All requests seen so far, oldest first
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests seen for one path
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path() == path)
            .cloned()
            .collect()
    }

    fn answer(&self, method: &'static str, url: Url, body: Option<String>) -> Scripted {
        let path = url.path().to_string();
        self.requests.lock().push(RecordedRequest { method, url, body });

        let mut script = self.script.lock();
        if let Some(next) = script.queued.get_mut(&path).and_then(VecDeque::pop_front) {
            return next;
        }
        script
            .fallback
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Err(TransportError(format!("no mock response for {method} {path}"))))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: Url) -> Result<HttpResponse, TransportError> {
        self.answer("GET", url, None)
    }

    async fn post_json(&self, url: Url, body: String) -> Result<HttpResponse, TransportError> {
        self.answer("POST", url, Some(body))
    }
}

/// Probe that fails a fixed number of times, then reports alive
#[derive(Debug)]
pub struct MockProbe {
    failures: u32,
    calls: AtomicU32,
}

impl MockProbe {
    /// Fail the first `failures` probes
    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    /// Never report alive
    pub fn never_ready() -> Arc<Self> {
        Self::failing(u32::MAX)
    }

    /// Probes performed so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for MockProbe {
    async fn probe(&self) -> Result<(), ProbeNotReady> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ProbeNotReady::Status(503))
        } else {
            Ok(())
        }
    }
}

/// `/health` body with the given status
pub fn health_body(status: &str) -> String {
    serde_json::json!({ "status": status, "model": "gemini-2.5-flash", "database": "healthy" })
        .to_string()
}

/// The example request from the service documentation
pub fn sample_request() -> RoastRequest {
    RoastRequest::new(
        "PetRock 2.0",
        "We're revolutionizing the pet industry with AI-powered rocks that provide emotional support",
        "Millennials who want pets but can't commit to real animals",
        "$50k",
        RoastLevel::Medium,
    )
}

/// The example response from the service documentation
pub fn sample_response() -> RoastResponse {
    RoastResponse {
        brutal_roast: "Your idea is basically selling rocks to people who think they're buying innovation..."
            .to_string(),
        honest_feedback: "While the concept is creative, you need to focus on real value proposition..."
            .to_string(),
        competitor_reality_check: "You're competing against actual pet stores, adoption centers, and therapy apps..."
            .to_string(),
        pitch_rewrite: "We provide mindfulness and stress-relief solutions through tactile meditation tools..."
            .to_string(),
        survival_tips: vec![
            "Pivot to actual pet care services".to_string(),
            "Focus on real emotional wellness solutions".to_string(),
            "Consider B2B applications for stress relief".to_string(),
        ],
    }
}

/// [`sample_response`] as a JSON body
pub fn sample_response_json() -> String {
    serde_json::to_string(&sample_response()).unwrap_or_default()
}

//! API State management
//!
//! Shared state for the status API: a live view of one poller's snapshot.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::readiness::{ProgressStage, ReadinessSnapshot, ReadinessState};

/// Shared API state
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Service being waited on, for display
    target: Arc<str>,
    readiness: watch::Receiver<ReadinessSnapshot>,
    started_at: Instant,
}

impl ApiState {
    pub fn new(target: impl Into<Arc<str>>, readiness: watch::Receiver<ReadinessSnapshot>) -> Self {
        Self {
            target: target.into(),
            readiness,
            started_at: Instant::now(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn snapshot(&self) -> ReadinessSnapshot {
        *self.readiness.borrow()
    }

    pub fn state(&self) -> ReadinessState {
        self.readiness.borrow().state
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Get status summary for API response
    pub fn get_status_response(&self) -> StatusResponse {
        let snapshot = self.snapshot();
        let stage = snapshot.stage();

        StatusResponse {
            target: self.target.to_string(),
            state: snapshot.state,
            progress: snapshot.progress,
            stage,
            message: stage.message().to_string(),
            attempts: snapshot.attempts,
            elapsed_ms: self.elapsed().as_millis() as u64,
            ready_after_ms: snapshot.ready_after.map(|d| d.as_millis() as u64),
        }
    }
}

/// Status API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub target: String,
    pub state: ReadinessState,
    pub progress: f64,
    pub stage: ProgressStage,
    pub message: String,
    pub attempts: u32,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_after_ms: Option<u64>,
}

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub state: ReadinessState,
}

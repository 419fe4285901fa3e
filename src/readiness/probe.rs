//! Health probes
//!
//! A probe performs exactly one readiness check. Anything short of a healthy
//! answer is a [`ProbeNotReady`]; the poller treats all of them the same way.

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{RoastClient, RoastError, Transport};

/// Why a single probe did not report ready
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeNotReady {
    #[error("service unreachable: {0}")]
    Unreachable(String),

    #[error("health endpoint returned {0}")]
    Status(u16),

    #[error("malformed health response: {0}")]
    Malformed(String),

    #[error("service reported status '{0}'")]
    NotAlive(String),
}

impl From<RoastError> for ProbeNotReady {
    fn from(err: RoastError) -> Self {
        match err {
            RoastError::RequestFailed { status, .. } => ProbeNotReady::Status(status),
            RoastError::MalformedResponse { source, .. } => ProbeNotReady::Malformed(source.to_string()),
            other => ProbeNotReady::Unreachable(other.to_string()),
        }
    }
}

/// One-shot readiness check
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns `Ok(())` only when the service reports itself alive
    async fn probe(&self) -> Result<(), ProbeNotReady>;
}

#[async_trait]
impl<T: Transport> HealthProbe for RoastClient<T> {
    async fn probe(&self) -> Result<(), ProbeNotReady> {
        let health = self.health().await?;
        if health.is_alive() {
            Ok(())
        } else {
            Err(ProbeNotReady::NotAlive(health.status))
        }
    }
}

//! Status HTTP API
//!
//! Exposes a readiness poller's progress while `roaster wait` runs, so other
//! tools can watch the cold start without parsing logs.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (always returns 200 if running)
//! - `GET /status` - Current readiness snapshot (202 while polling)
//! - `GET /metrics` - Prometheus text format

mod metrics;
mod server;
mod state;

pub use server::{create_router, start_api_server};
pub use state::{ApiState, HealthResponse, StatusResponse};

//! Prometheus metrics
//!
//! Exposes the readiness snapshot in Prometheus text format at `/metrics`.
//!
//! ## Metrics Exposed
//!
//! - `roaster_readiness_state` - 0=polling, 1=ready, 2=exhausted
//! - `roaster_readiness_progress` - Progress value shown to users (0-100)
//! - `roaster_probe_attempts` - Health probes started
//! - `roaster_elapsed_seconds` - Time since the API started
//! - `roaster_ready_after_seconds` - Cold start duration, once ready

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::fmt::{Display, Write};

use super::state::ApiState;
use crate::readiness::ReadinessState;

/// Generate Prometheus-format metrics
pub async fn metrics_handler(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        render_metrics(&state),
    )
}

fn render_metrics(state: &ApiState) -> String {
    let snapshot = state.snapshot();
    let mut output = String::new();

    let state_value = match snapshot.state {
        ReadinessState::Polling => 0,
        ReadinessState::Ready => 1,
        ReadinessState::Exhausted => 2,
    };

    gauge(
        &mut output,
        "roaster_readiness_state",
        "Readiness state (0=polling, 1=ready, 2=exhausted)",
        state_value,
    );
    gauge(
        &mut output,
        "roaster_readiness_progress",
        "Progress value shown while waiting (0-100)",
        snapshot.progress,
    );
    gauge(
        &mut output,
        "roaster_probe_attempts",
        "Health probes started",
        snapshot.attempts,
    );
    gauge(
        &mut output,
        "roaster_elapsed_seconds",
        "Time elapsed since start",
        state.elapsed().as_secs_f64(),
    );

    if let Some(ready_after) = snapshot.ready_after {
        gauge(
            &mut output,
            "roaster_ready_after_seconds",
            "Time until the service first reported alive",
            ready_after.as_secs_f64(),
        );
    }

    output
}

fn gauge(output: &mut String, name: &str, help: &str, value: impl Display) {
    // Writing to a String cannot fail
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} gauge");
    let _ = writeln!(output, "{name} {value}");
    let _ = writeln!(output);
}

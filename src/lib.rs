//! Roaster - cold-start aware client for the RoastMyStartup API
//!
//! The roast service runs on a host that sleeps when idle. A request sent to a
//! sleeping instance is slow or fails, so clients first wait for `GET /health`
//! to report `alive` and only then submit the startup to be roasted.
//!
//! ## Modules
//!
//! - [`client`] - HTTP client for the roast API (`/health`, `/roast`, `/stats`)
//! - [`readiness`] - Readiness poller with progress animation
//! - `config` - Configuration parsing
//! - `api` - Status HTTP API for a running poller

pub mod api;
pub mod client;
pub mod config;
pub mod readiness;

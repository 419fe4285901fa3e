//! Configuration parsing
//!
//! Handles parsing of the client configuration file. Every section is
//! optional; an empty file yields the defaults below.
//!
//! ## Configuration Format
//!
//! ```yaml
//! service:
//!   base_url: https://roast-my-startup-api.onrender.com
//!
//! readiness:
//!   interval: 2s
//!   settle_delay: 300ms
//!   # max_attempts: 30
//!   progress:
//!     fast_cadence: 300ms
//!     fast_ceiling: 90.0
//!     fast_step: { min: 5.0, max: 13.0 }
//!     slow_cadence: 1500ms
//!     slow_ceiling: 99.0
//!     slow_step: { min: 0.2, max: 0.7 }
//! ```

mod settings;

pub use settings::{Config, ConfigError, ServiceConfig};

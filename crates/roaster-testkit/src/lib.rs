//! Roaster Test Kit
//!
//! Test infrastructure for the roast client and readiness poller.
//!
//! This crate provides:
//! - Scripted transports and probes for testing without a live service
//! - Request/response fixtures
//! - Seeded random data generation for reproducible tests
//!
//! # Example
//!
//! ```rust
//! use roaster_testkit::random::PseudoGenerator;
//!
//! // Create reproducible random generator
//! let mut rng = PseudoGenerator::new(12345);
//!
//! // Generate a request that passes validation
//! let request = rng.random_request();
//! assert!(request.validate().is_ok());
//! ```

pub mod mock;
pub mod random;

// Re-exports for convenience
pub use mock::{MockProbe, MockTransport, RecordedRequest};
pub use random::PseudoGenerator;

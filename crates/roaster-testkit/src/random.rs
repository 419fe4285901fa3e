//! Seeded random data generation
//!
//! Provides reproducible random data for tests: seeds for progress
//! animations and valid roast requests. The same seed always produces the
//! same sequence, so failures can be replayed.
//!
//! # Example
//!
//! ```rust
//! use roaster_testkit::random::PseudoGenerator;
//!
//! let mut rng1 = PseudoGenerator::new(42);
//! let mut rng2 = PseudoGenerator::new(42);
//!
//! // Same seed produces same output
//! assert_eq!(rng1.random_request(), rng2.random_request());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use roaster::client::{RoastLevel, RoastRequest};

const WORDS: &[&str] = &[
    "ai", "blockchain", "rocks", "pets", "coffee", "drones", "subscription", "uber", "for",
    "dogs", "platform", "marketplace", "social", "cloud", "founders", "students", "busy",
    "parents", "gamified", "wellness", "b2b", "saas", "crypto", "meal", "kits",
];

/// Seeded pseudo-random generator for reproducible test data
#[derive(Debug)]
pub struct PseudoGenerator {
    rng: StdRng,
    seed: u64,
}

impl PseudoGenerator {
    /// Create a new generator with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Get the seed used to create this generator
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Borrow the underlying RNG (e.g. to drive a `ProgressMeter`)
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Generate a random u64
    pub fn random_u64(&mut self) -> u64 {
        self.rng.random()
    }

    /// Generate a random usize in the given range
    pub fn random_range(&mut self, range: std::ops::Range<usize>) -> usize {
        self.rng.random_range(range)
    }

    /// Space-separated words, `count` of them
    pub fn random_words(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| WORDS[self.rng.random_range(0..WORDS.len())])
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn random_level(&mut self) -> RoastLevel {
        RoastLevel::ALL[self.rng.random_range(0..RoastLevel::ALL.len())]
    }

    /// A request that passes `RoastRequest::validate`
    pub fn random_request(&mut self) -> RoastRequest {
        let name_words = self.random_range(1..4);
        let idea_words = self.random_range(8..40);
        let user_words = self.random_range(3..12);
        let budget = format!("${}k", self.random_range(1..1000));

        RoastRequest::new(
            self.random_words(name_words),
            format!("We build {}", self.random_words(idea_words)),
            format!("Target: {}", self.random_words(user_words)),
            budget,
            self.random_level(),
        )
    }
}

/// Create multiple pseudo-random generators from a single seed
///
/// This is useful when you need multiple independent random streams
/// that are still reproducible from a single seed.
///
/// # Example
///
/// ```rust
/// use roaster_testkit::random::pseudo_generators;
///
/// let rngs = pseudo_generators(42, 5);
/// assert_eq!(rngs.len(), 5);
/// ```
pub fn pseudo_generators(seed: u64, count: usize) -> Vec<PseudoGenerator> {
    let mut master_rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| PseudoGenerator::new(master_rng.random()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut rng1 = PseudoGenerator::new(12345);
        let mut rng2 = PseudoGenerator::new(12345);

        for _ in 0..20 {
            assert_eq!(rng1.random_request(), rng2.random_request());
        }
    }

    #[test]
    fn test_different_seeds_different_output() {
        let mut rng1 = PseudoGenerator::new(1);
        let mut rng2 = PseudoGenerator::new(2);

        assert_ne!(rng1.random_words(20), rng2.random_words(20));
    }

    #[test]
    fn test_pseudo_generators() {
        let rngs1 = pseudo_generators(42, 3);
        let rngs2 = pseudo_generators(42, 3);

        for (mut r1, mut r2) in rngs1.into_iter().zip(rngs2.into_iter()) {
            assert_eq!(r1.seed(), r2.seed());
            assert_eq!(r1.random_u64(), r2.random_u64());
        }
    }

    #[test]
    fn test_random_requests_validate() {
        let mut rng = PseudoGenerator::new(7);
        for _ in 0..200 {
            let request = rng.random_request();
            assert!(request.validate().is_ok(), "{request:?}");
        }
    }

    #[test]
    fn test_seed_getter() {
        let rng = PseudoGenerator::new(999);
        assert_eq!(rng.seed(), 999);
    }
}

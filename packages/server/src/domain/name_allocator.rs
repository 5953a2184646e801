//! Collision-free display name allocation.
//!
//! Names are a fixed prefix followed by a zero-padded numeric suffix, e.g. `u0042`.
//! The random source is owned by the allocator so tests can seed it.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{error::NameError, value_object::DisplayName};

/// Prefix of every generated name.
pub const NAME_PREFIX: &str = "u";

/// Number of digits in the numeric suffix.
pub const SUFFIX_WIDTH: u32 = 4;

/// Random draws attempted before falling back to a linear scan.
pub const MAX_RANDOM_ATTEMPTS: usize = 64;

/// Display name allocator.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    rng: ChaCha8Rng,
    space: usize,
}

impl NameAllocator {
    /// Allocator seeded from the operating system's entropy.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Deterministic allocator, same seed ⇒ same sequence of names.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            space: 10usize.pow(SUFFIX_WIDTH),
        }
    }

    /// Total number of distinct names this allocator can produce.
    pub fn space(&self) -> usize {
        self.space
    }

    /// Allocate a name that is not in `existing`.
    ///
    /// Draws random suffixes until one is free. After [`MAX_RANDOM_ATTEMPTS`]
    /// collisions it scans the suffix space from a random offset, so a nearly
    /// saturated room still gets a name in bounded time.
    ///
    /// # Errors
    ///
    /// [`NameError::Exhausted`] when every name in the space is taken.
    pub fn allocate(&mut self, existing: &HashSet<DisplayName>) -> Result<DisplayName, NameError> {
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let candidate = format_name(self.rng.gen_range(0..self.space));
            if !existing.contains(candidate.as_str()) {
                return Ok(DisplayName::generated(candidate));
            }
        }

        tracing::debug!(
            "No free name after {} random draws ({} names taken), scanning",
            MAX_RANDOM_ATTEMPTS,
            existing.len()
        );

        let offset = self.rng.gen_range(0..self.space);
        (0..self.space)
            .map(|step| format_name((offset + step) % self.space))
            .find(|candidate| !existing.contains(candidate.as_str()))
            .map(DisplayName::generated)
            .ok_or(NameError::Exhausted { space: self.space })
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_name(suffix: usize) -> String {
    format!(
        "{}{:0width$}",
        NAME_PREFIX,
        suffix,
        width = SUFFIX_WIDTH as usize
    )
}

//! Randomness source for sampling and synthetic data.
//!
//! All non-deterministic choices (sampling, synthetic fields) draw from RNGs
//! created here, so a fixed `RNG_SEED` makes a whole run reproducible.

use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use siphasher::sip::SipHasher24;

/// Creates operation-scoped RNGs.
///
/// In seeded mode each RNG seed is derived with SipHash-2-4 from
/// `(parent seed, scope, sequence number)`:
/// - the same parent seed replays the same sequence of RNGs across runs
/// - successive calls with the same scope still get different streams
#[derive(Debug)]
pub struct RngProvider {
    /// Parent seed for child RNG generation. None = random mode.
    parent_seed: Option<u64>,
    sequence: AtomicU64,
}

impl RngProvider {
    /// Creates a provider drawing seeds from the operating system.
    #[must_use]
    pub const fn new_random() -> Self {
        Self {
            parent_seed: None,
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a deterministic provider.
    #[must_use]
    pub const fn new_seeded(seed: u64) -> Self {
        Self {
            parent_seed: Some(seed),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a provider from an optional seed.
    #[must_use]
    pub const fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new_seeded(seed),
            None => Self::new_random(),
        }
    }

    /// Returns `true` in seeded mode.
    #[must_use]
    pub const fn is_deterministic(&self) -> bool {
        self.parent_seed.is_some()
    }

    /// Creates an RNG for one operation, e.g. `"fake.random"`.
    #[must_use]
    pub fn for_operation(&self, scope: &str) -> StdRng {
        match self.parent_seed {
            Some(parent_seed) => {
                let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
                let mut hasher = SipHasher24::new_with_key(&[0u8; 16]);
                hasher.write(&parent_seed.to_le_bytes());
                hasher.write(scope.as_bytes());
                hasher.write(b":");
                hasher.write(&sequence.to_le_bytes());
                StdRng::seed_from_u64(hasher.finish())
            }
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for RngProvider {
    fn default() -> Self {
        Self::new_random()
    }
}

//! Seeded environment for simulation.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use roomcast_core::Environment;

/// Default simulated wall clock: 2024-01-01 21:05:00 UTC.
pub const DEFAULT_CLOCK_SECS: u64 = 1_704_143_100;

/// Deterministic environment: seeded ChaCha RNG and a manual clock.
///
/// Clones share the RNG and the clock, so a router and the test driving it
/// observe the same state.
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    clock_secs: Arc<AtomicU64>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment seeded with 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment with a specific seed. Equal seeds replay equal identifiers.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            clock_secs: Arc::new(AtomicU64::new(DEFAULT_CLOCK_SECS)),
        }
    }

    /// Set the wall clock.
    pub fn set_clock(&self, secs: u64) {
        self.clock_secs.store(secs, Ordering::SeqCst);
    }

    /// Move the wall clock forward.
    pub fn advance_clock(&self, secs: u64) {
        self.clock_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }

    fn wall_clock_secs(&self) -> u64 {
        self.clock_secs.load(Ordering::SeqCst)
    }
}

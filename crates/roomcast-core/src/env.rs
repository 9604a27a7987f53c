//! Environment abstraction for deterministic testing.
//!
//! Decouples relay logic from system resources (wall clock, randomness) so the
//! same code runs under a seeded simulation and in production.

/// Abstract environment providing wall-clock time and randomness.
///
/// Implementations MUST guarantee that `random_bytes()` uses OS entropy in
/// production and a seeded generator in simulation, so a given seed replays
/// the same connection identifiers.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`, e.g. for connection identifiers.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Seconds since the Unix epoch. Used to stamp outgoing messages.
    fn wall_clock_secs(&self) -> u64;
}

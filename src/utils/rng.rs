//! Injectable randomness for cue jitter and pause timing. Production code
//! uses [`OsRandom`]; tests script the draws to make timing deterministic.

use tracing::warn;

/// A source of uniform draws. `fork` hands an independent source to a
/// spawned pacing loop so the loop can sample delays without sharing state
/// with the engine.
pub trait RandomSource: Send {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    fn fork(&mut self) -> Box<dyn RandomSource>;
}

/// xorshift64* generator seeded from the operating system. Statistical
/// quality well beyond what cue jitter needs, and no per-draw syscall.
#[derive(Debug, Clone)]
pub struct OsRandom {
    state: u64,
}

impl OsRandom {
    pub fn new() -> Self {
        let mut seed = [0u8; 8];
        if let Err(err) = getrandom::fill(&mut seed) {
            warn!(error = %err, "OS entropy unavailable; seeding jitter from the clock");
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
                .unwrap_or(0x9e3779b97f4a7c15);
            seed = nanos.to_le_bytes();
        }
        Self::seeded(u64::from_le_bytes(seed))
    }

    pub fn seeded(seed: u64) -> Self {
        // xorshift state must be nonzero.
        Self {
            state: if seed == 0 { 0x9e3779b97f4a7c15 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545f4914f6cdd1d)
    }
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for OsRandom {
    fn next_unit(&mut self) -> f64 {
        // Top 53 bits give a uniform double in [0, 1).
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn fork(&mut self) -> Box<dyn RandomSource> {
        Box::new(OsRandom::seeded(self.next_u64()))
    }
}

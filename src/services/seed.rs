// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Process-wide randomness behind the guest `seed` import.
///
/// Built once during bring-up and shared by handle; the per-call value is a
/// uniform double scaled by the current wall-clock nanos, matching what
/// AssemblyScript's runtime expects from `env.seed`.
pub struct SeedSource {
    rng: Mutex<StdRng>,
}

impl SeedSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic source for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn next(&self) -> f64 {
        let unit: f64 = self.rng.lock().gen();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as f64)
            .unwrap_or(1.0);
        unit * nanos
    }
}

impl Default for SeedSource {
    fn default() -> Self {
        Self::new()
    }
}

//! Seeded RNG wrapper for reproducible behavior.
//!
//! Provides a thread-safe, seeded random number generator shared between the
//! synthetic data producers and the randomly initialised sensor models, so a
//! whole simulated beamline can be made deterministic with one seed.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded RNG wrapper for reproducible random behavior
pub struct SimRng {
    inner: Mutex<ChaCha8Rng>,
}

impl SimRng {
    /// Create a new RNG with optional seed.
    /// If seed is None, uses a random seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// Create a deterministic RNG.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Some(seed))
    }

    /// Generate a random f64 value in the range [0.0, 1.0)
    pub fn next_f64(&self) -> f64 {
        self.inner.lock().gen()
    }

    /// Generate `n` values in [0.0, 1.0) under a single lock.
    pub fn uniform_samples(&self, n: usize) -> Vec<f64> {
        let mut rng = self.inner.lock();
        (0..n).map(|_| rng.gen::<f64>()).collect()
    }

    /// Generate a random value in the given range
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.inner.lock().gen_range(range)
    }

    /// Either `-1.0` or `1.0` with equal probability.
    pub fn sign(&self) -> f64 {
        if self.inner.lock().gen::<bool>() {
            1.0
        } else {
            -1.0
        }
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for SimRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimRng")
            .field("inner", &"<Mutex<ChaCha8Rng>>")
            .finish()
    }
}

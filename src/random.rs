//! Process-wide deterministic PRNG (component B).
//!
//! `StdRng` is seeded once and stashed behind a `OnceLock<Mutex<_>>`. Every caller — belief
//! sampling, UCB tie-breaking, a domain's own `plan_action_under_current_hypothesis`, the
//! reference rollout heuristic — goes through this single handle, so a full `plan()` call is
//! reproducible given the same seed and call order. Tests re-seed it between scenarios.

use std::sync::{Mutex, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

static RNG: OnceLock<Mutex<StdRng>> = OnceLock::new();

/// A thin, zero-sized handle onto the process-wide PRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSource;

impl RandomSource {
    /// (Re-)seeds the process-wide PRNG. Safe to call more than once; later calls replace the
    /// generator's state in place, which is how tests get deterministic re-runs.
    pub fn seed(seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        match RNG.set(Mutex::new(rng)) {
            Ok(()) => {}
            Err(_) => *RNG.get().expect("just failed to set, so it's set").lock().unwrap() = StdRng::seed_from_u64(seed),
        }
        Self
    }

    /// Returns a handle onto the PRNG, lazily seeding it from entropy-free seed `0` if nothing
    /// has seeded it yet (a caller that cares about reproducibility should call [`Self::seed`]
    /// first).
    pub fn handle() -> Self {
        RNG.get_or_init(|| Mutex::new(StdRng::seed_from_u64(0)));
        Self
    }

    fn with_rng<T>(self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mutex = RNG.get_or_init(|| Mutex::new(StdRng::seed_from_u64(0)));
        let mut guard = mutex.lock().unwrap();
        f(&mut guard)
    }

    /// Uniform sample in `[0, 1)`.
    pub fn uniform(self) -> f64 {
        self.with_rng(|r| r.random::<f64>())
    }

    /// Uniform index in `[0, n)`. Panics if `n == 0`.
    pub fn gen_index(self, n: usize) -> usize {
        assert!(n > 0, "cannot sample an index from an empty range");
        self.with_rng(|r| r.random_range(0..n))
    }

    /// Picks uniformly among `candidates` (by value, not by index). Panics if empty.
    pub fn choose<'a, T>(self, candidates: &'a [T]) -> &'a T {
        let idx = self.gen_index(candidates.len());
        &candidates[idx]
    }

    /// Samples an index from a (not necessarily normalized) discrete distribution over
    /// `weights`. Falls back to a uniform pick if the weights sum to zero or are non-finite.
    pub fn sample_categorical(self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return self.gen_index(weights.len());
        }
        let target = self.uniform() * total;
        let mut acc = 0.0;
        for (idx, w) in weights.iter().enumerate() {
            acc += w;
            if acc >= target {
                return idx;
            }
        }
        weights.len() - 1
    }
}

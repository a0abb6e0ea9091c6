//! Random sources for gameplay rolls
//!
//! Every roll the engine makes goes through [`RandomSource`]. Matches use a
//! seeded ChaCha RNG so runs are reproducible; tests use [`ScriptedDice`] to
//! force particular outcomes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::collections::VecDeque;

/// Uniform source of values in `[0, 1)`
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Bernoulli trial: succeeds when the draw is below `probability`
    fn chance(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }

    /// Uniform index in `0..len`; `len` must be non-zero
    fn pick_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick_index on empty set");
        let idx = (self.next_unit() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}

impl RandomSource for ChaCha12Rng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Seeded ChaCha source used for real matches
pub fn seeded(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Replays a fixed list of draws, then falls back to a seeded RNG
///
/// A draw of `0.0` makes any `chance(p)` with `p > 0` succeed and picks
/// index 0; a draw of `0.99` fails `chance(p)` for `p <= 0.99` and picks
/// the last index.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    script: VecDeque<f64>,
    fallback: ChaCha12Rng,
    consumed: usize,
}

impl ScriptedDice {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        ScriptedDice {
            script: draws.into_iter().collect(),
            fallback: ChaCha12Rng::seed_from_u64(0),
            consumed: 0,
        }
    }

    /// Append more draws to the end of the script
    pub fn push(&mut self, draws: impl IntoIterator<Item = f64>) {
        self.script.extend(draws);
    }

    /// Draws still queued in the script
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Total draws taken so far (scripted and fallback)
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedDice {
    fn next_unit(&mut self) -> f64 {
        self.consumed += 1;
        match self.script.pop_front() {
            Some(draw) => draw.clamp(0.0, 0.999_999),
            None => self.fallback.gen::<f64>(),
        }
    }
}

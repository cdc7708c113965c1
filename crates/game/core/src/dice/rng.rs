//! Deterministic random number sources for dice rolls.
//!
//! Every roll in the engine flows through a [`DiceSource`]. Battles normally
//! use [`SeededDice`], a counter-driven stream over the PCG oracle, so a given
//! seed always replays the same battle. Tests use [`ScriptedDice`] to pin
//! exact face values.

use std::collections::VecDeque;

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides.max(1)) + 1
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Compute a deterministic per-roll seed.
///
/// * `battle_seed` - Seed fixed at battle start
/// * `counter` - Monotonic roll counter within the battle
/// * `stream` - Independent stream selector (one per dice source)
pub fn compute_seed(battle_seed: u64, counter: u64, stream: u32) -> u64 {
    // SplitMix64 / FxHash style mixing
    let mut hash = battle_seed;
    hash ^= counter.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Source of individual die faces.
pub trait DiceSource: Send {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u8) -> u8;
}

/// Seeded, replayable dice stream.
#[derive(Clone, Debug)]
pub struct SeededDice<R = PcgRng> {
    rng: R,
    seed: u64,
    stream: u32,
    counter: u64,
}

impl SeededDice<PcgRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_oracle(PcgRng, seed, 0)
    }
}

impl<R: RngOracle> SeededDice<R> {
    pub fn with_oracle(rng: R, seed: u64, stream: u32) -> Self {
        Self {
            rng,
            seed,
            stream,
            counter: 0,
        }
    }

    /// Number of dice rolled so far.
    pub fn rolls(&self) -> u64 {
        self.counter
    }
}

impl<R: RngOracle> DiceSource for SeededDice<R> {
    fn roll_die(&mut self, sides: u8) -> u8 {
        let seed = compute_seed(self.seed, self.counter, self.stream);
        self.counter += 1;
        self.rng.roll_die(seed, sides as u32) as u8
    }
}

/// Dice source that replays a fixed list of faces.
///
/// Once the script is exhausted it keeps returning `fallback`, which makes
/// scenarios that would otherwise loop forever observable in tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    fallback: u8,
    consumed: usize,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: 1,
            consumed: 0,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, face: u8) -> Self {
        self.fallback = face;
        self
    }

    /// Append more faces to the script.
    pub fn push(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.faces.extend(faces);
    }

    /// Faces consumed so far, including fallbacks.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u8) -> u8 {
        self.consumed += 1;
        self.faces
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(1, sides.max(1))
    }
}

impl<D: DiceSource + ?Sized> DiceSource for Box<D> {
    fn roll_die(&mut self, sides: u8) -> u8 {
        (**self).roll_die(sides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_replay_identically() {
        let mut a = SeededDice::new(42);
        let mut b = SeededDice::new(42);
        let left: Vec<u8> = (0..32).map(|_| a.roll_die(6)).collect();
        let right: Vec<u8> = (0..32).map(|_| b.roll_die(6)).collect();
        assert_eq!(left, right);
        assert!(left.iter().all(|face| (1..=6).contains(face)));
        assert_eq!(a.rolls(), 32);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededDice::new(1);
        let mut b = SeededDice::new(2);
        let left: Vec<u8> = (0..32).map(|_| a.roll_die(6)).collect();
        let right: Vec<u8> = (0..32).map(|_| b.roll_die(6)).collect();
        assert_ne!(left, right);
    }

    #[test]
    fn scripted_dice_fall_back_when_exhausted() {
        let mut dice = ScriptedDice::new([6, 3]).with_fallback(2);
        assert_eq!(dice.roll_die(6), 6);
        assert_eq!(dice.roll_die(6), 3);
        assert_eq!(dice.roll_die(6), 2);
        assert_eq!(dice.consumed(), 3);
    }
}

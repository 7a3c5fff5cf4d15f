//! Deterministic linear congruential RNG.
//!
//! The generator's entire state is one `u32` that is stored verbatim in the
//! save file, so the simulation can be resumed mid-stream from any snapshot.
//! A third-party RNG would make the integer state an implementation detail;
//! here it is part of the persisted format, so the LCG is spelled out.

/// Linear congruential generator with Numerical Recipes constants.
///
/// `state_{n+1} = 1664525 * state_n + 1013904223 (mod 2^32)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    /// Creates a generator seeded with the given 32-bit state.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Current raw state. Feeding this back into [`Lcg::new`] resumes the
    /// sequence exactly where it left off.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advances the generator and returns a float in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        f64::from(self.state) / f64::from(u32::MAX)
    }

    /// Advances the generator and returns a float in `[min, max)`.
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Advances the generator and returns an integer in `[0, max)`.
    ///
    /// Returns 0 when `max` is 0.
    pub fn next_int(&mut self, max: u32) -> u32 {
        (self.next() * f64::from(max)).floor() as u32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

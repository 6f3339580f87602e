//! Injectable randomness for consequence selection.
//!
//! The event engine never reaches for a global generator. It draws from a
//! [`RandomSource`], which every `rand` generator implements, so sessions
//! are reproducible from a seed and tests can script exact rolls with
//! [`ScriptedRolls`].

use rand::Rng;

/// A source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    /// Next uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Values outside `[0, 1)` are clamped into range. An empty script always
/// yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    rolls: Vec<f64>,
    cursor: usize,
}

impl ScriptedRolls {
    /// Largest value below 1.0 a scripted roll is clamped to.
    const MAX_ROLL: f64 = 1.0 - f64::EPSILON;

    /// Script the given draws.
    pub const fn new(rolls: Vec<f64>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// A source that always returns `roll`.
    pub fn constant(roll: f64) -> Self {
        Self::new(vec![roll])
    }
}

impl RandomSource for ScriptedRolls {
    fn next_unit(&mut self) -> f64 {
        let Some(&roll) = self.rolls.get(self.cursor) else {
            return 0.0;
        };
        self.cursor = self
            .cursor
            .saturating_add(1)
            .checked_rem(self.rolls.len())
            .unwrap_or(0);
        if roll.is_nan() {
            0.0
        } else {
            roll.clamp(0.0, Self::MAX_ROLL)
        }
    }
}

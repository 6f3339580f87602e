//! Game clock and the pause handshake.
//!
//! The clock is the single source of game time for a session. Time is
//! measured in simulation seconds and only moves forward, except on an
//! explicit [`GameClock::reset`].
//!
//! # Design Principles
//!
//! - Wall-clock time never enters the simulation. The caller converts real
//!   elapsed time into a delta and passes it to [`GameClock::advance`].
//! - A paused clock ignores deltas. Presenting an event pauses the clock;
//!   resolving it restores whatever paused state preceded the event.

use tracing::debug;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The delta is negative, NaN, or infinite.
    #[error("invalid time delta: {delta}")]
    InvalidDelta {
        /// The rejected delta in seconds.
        delta: f64,
    },

    /// An absolute time earlier than the current time was requested.
    #[error("game time cannot move backwards: current {current}, requested {requested}")]
    NonMonotonic {
        /// Game time before the call.
        current: f64,
        /// Requested game time.
        requested: f64,
    },
}

/// Pause/resume control over the surrounding game loop.
///
/// The event engine pauses time while a choice is pending and resumes it
/// afterwards, but only if time was running when the event was presented.
pub trait TimeControl {
    /// Current game time in seconds.
    fn now(&self) -> f64;

    /// Whether time advancement is suspended.
    fn is_paused(&self) -> bool;

    /// Suspend time advancement.
    fn pause(&mut self);

    /// Resume time advancement.
    fn resume(&mut self);
}

/// Monotonic game clock measured in simulation seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameClock {
    /// Elapsed game time in seconds.
    game_time: f64,
    /// Whether deltas are currently ignored.
    paused: bool,
}

impl GameClock {
    /// Create a running clock at game time zero.
    pub const fn new() -> Self {
        Self {
            game_time: 0.0,
            paused: false,
        }
    }

    /// Create a clock at an explicit time (state restoration and tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDelta`] if `game_time` is negative or
    /// not finite.
    pub fn starting_at(game_time: f64) -> Result<Self, ClockError> {
        validate(game_time)?;
        Ok(Self {
            game_time,
            paused: false,
        })
    }

    /// Return the current game time.
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Advance by `delta` seconds. Returns the new game time.
    ///
    /// A paused clock accepts the call and stays where it is.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDelta`] if `delta` is negative or not
    /// finite.
    pub fn advance(&mut self, delta: f64) -> Result<f64, ClockError> {
        validate(delta)?;
        if !self.paused {
            self.game_time += delta;
        }
        Ok(self.game_time)
    }

    /// Jump to an absolute game time, ignoring the paused state.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NonMonotonic`] if `game_time` lies before the
    /// current time, or [`ClockError::InvalidDelta`] if it is not finite.
    pub fn advance_to(&mut self, game_time: f64) -> Result<f64, ClockError> {
        validate(game_time)?;
        if game_time < self.game_time {
            return Err(ClockError::NonMonotonic {
                current: self.game_time,
                requested: game_time,
            });
        }
        self.game_time = game_time;
        Ok(self.game_time)
    }

    /// Rewind to zero and unpause. The only way game time moves backwards.
    pub fn reset(&mut self) {
        debug!(from = self.game_time, "Game clock reset");
        *self = Self::new();
    }
}

impl TimeControl for GameClock {
    fn now(&self) -> f64 {
        self.game_time
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }
}

fn validate(seconds: f64) -> Result<(), ClockError> {
    if seconds.is_finite() && seconds >= 0.0 {
        Ok(())
    } else {
        Err(ClockError::InvalidDelta { delta: seconds })
    }
}

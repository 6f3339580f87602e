//! Game clock, requirement evaluation, and event resolution for the Tycoon
//! simulation.
//!
//! This crate wraps the [`ModifierLedger`] with everything a running
//! session needs: a game clock with a pause handshake, the simulation state
//! that requirements read and events write, and the event resolution state
//! machine.
//!
//! # Modules
//!
//! - [`clock`] -- Game clock and the [`TimeControl`] pause handshake.
//! - [`config`] -- Configuration loading from `tycoon-config.yaml`.
//! - [`state`] -- [`StateSnapshot`] / [`SimulationState`] traits and the
//!   in-memory [`GameState`].
//! - [`requirements`] -- Pure requirement and condition evaluation.
//! - [`random`] -- [`RandomSource`] for injectable randomness.
//! - [`selection`] -- Weighted consequence draw and default choice.
//! - [`events`] -- The [`EventEngine`] state machine.
//! - [`catalog`] -- Authored events loaded from JSON.
//! - [`session`] -- [`GameSession`], which fixes the per-tick ordering.
//!
//! # Usage
//!
//! ```
//! use tycoon_core::config::EngineConfig;
//! use tycoon_core::session::GameSession;
//! use tycoon_types::Metric;
//!
//! let mut session = GameSession::new(&EngineConfig::default());
//! let summary = session.advance(1.0);
//! assert!(summary.is_ok());
//! assert!((session.effective(Metric::ServiceRooms, 2.0) - 2.0).abs() < 1e-9);
//! ```
//!
//! [`ModifierLedger`]: tycoon_ledger::ModifierLedger
//! [`TimeControl`]: clock::TimeControl
//! [`StateSnapshot`]: state::StateSnapshot
//! [`SimulationState`]: state::SimulationState
//! [`GameState`]: state::GameState
//! [`RandomSource`]: random::RandomSource
//! [`EventEngine`]: events::EventEngine
//! [`GameSession`]: session::GameSession

pub mod catalog;
pub mod clock;
pub mod config;
pub mod events;
pub mod random;
pub mod requirements;
pub mod selection;
pub mod session;
pub mod state;

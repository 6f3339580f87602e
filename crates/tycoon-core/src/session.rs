//! Game session: one clock, one ledger, one event engine, one state.
//!
//! The session enforces the per-tick ordering the rest of the simulation
//! relies on:
//!
//! 1. advance the clock (a paused clock stays put)
//! 2. ledger expiration sweep
//! 3. event sweep (expired event effects, due delayed consequences)
//!
//! Only after [`GameSession::advance`] returns may mechanics read effective
//! values through [`GameSession::effective`], so an effect never influences
//! the tick in which it expired.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};
use tycoon_ledger::{CalculationBreakdown, ModifierLedger};
use tycoon_types::{ChoiceId, EffectId, GameEvent, Metric};

use crate::clock::{ClockError, GameClock, TimeControl};
use crate::config::{EconomyConfig, EngineConfig};
use crate::events::{EventContext, EventEngine, EventError, Resolution, ResolvedDelayedOutcome};
use crate::random::RandomSource;
use crate::state::GameState;

/// Summary of a single `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Tick counter after this call.
    pub tick: u64,
    /// Game time after this call.
    pub game_time: f64,
    /// Whether the clock was paused (no time elapsed, no sweeps ran).
    pub paused: bool,
    /// Effects removed by the ledger sweep.
    pub expired_effects: Vec<EffectId>,
    /// Event effects removed by the event sweep.
    pub expired_event_effects: Vec<EffectId>,
    /// Delayed consequences fired this tick.
    pub delayed_outcomes: Vec<ResolvedDelayedOutcome>,
}

/// Owns every per-session collaborator.
#[derive(Debug)]
pub struct GameSession<R = SmallRng> {
    clock: GameClock,
    ledger: ModifierLedger,
    events: EventEngine,
    state: GameState,
    economy: EconomyConfig,
    rng: R,
    tick: u64,
}

impl GameSession<SmallRng> {
    /// Start a session from configuration, seeding the generator from
    /// `session.seed`.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_rng(
            config.economy.clone(),
            SmallRng::seed_from_u64(config.session.seed),
        )
    }
}

impl<R: RandomSource> GameSession<R> {
    /// Start a session with an explicit random source.
    pub fn with_rng(economy: EconomyConfig, rng: R) -> Self {
        Self {
            clock: GameClock::new(),
            ledger: ModifierLedger::new(),
            events: EventEngine::new(),
            state: GameState::new(&economy),
            economy,
            rng,
            tick: 0,
        }
    }

    /// Advance game time by `delta` seconds and run the sweeps.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDelta`] if `delta` is negative or not
    /// finite. Nothing is swept in that case.
    pub fn advance(&mut self, delta: f64) -> Result<TickSummary, ClockError> {
        if self.clock.is_paused() {
            return Ok(TickSummary {
                tick: self.tick,
                game_time: self.clock.now(),
                paused: true,
                expired_effects: Vec::new(),
                expired_event_effects: Vec::new(),
                delayed_outcomes: Vec::new(),
            });
        }

        let now = self.clock.advance(delta)?;
        self.tick = self.tick.saturating_add(1);
        self.state.game_time = now;

        let expired_effects = self.ledger.tick(now);
        let sweep = self.events.tick(EventContext {
            state: &mut self.state,
            ledger: &mut self.ledger,
            clock: &mut self.clock,
        });

        debug!(
            tick = self.tick,
            game_time = now,
            expired = expired_effects.len(),
            fired = sweep.fired.len(),
            "Session tick"
        );

        Ok(TickSummary {
            tick: self.tick,
            game_time: now,
            paused: false,
            expired_effects,
            expired_event_effects: sweep.expired,
            delayed_outcomes: sweep.fired,
        })
    }

    /// Effective value of `metric` for a configured base value.
    pub fn effective(&self, metric: Metric, base: f64) -> f64 {
        self.ledger.calculate(metric, base)
    }

    /// Audit trail for `metric`.
    pub fn breakdown(&self, metric: Metric, base: f64) -> CalculationBreakdown {
        self.ledger.calculate_detailed(metric, base)
    }

    /// Offer an event and pause time.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::AlreadyPending`] if another event is pending.
    pub fn present_event(&mut self, event: GameEvent) -> Result<(), EventError> {
        self.events.present_event(event, &mut self.clock)
    }

    /// Resolve the pending event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if nothing is pending or the choice does not
    /// belong to the pending event.
    pub fn resolve_choice(&mut self, choice_id: &ChoiceId) -> Result<Resolution, EventError> {
        self.events.resolve_choice(
            choice_id,
            EventContext {
                state: &mut self.state,
                ledger: &mut self.ledger,
                clock: &mut self.clock,
            },
            &mut self.rng,
        )
    }

    /// Drain delayed outcomes fired since the last call.
    pub fn take_resolved_outcomes(&mut self) -> Vec<ResolvedDelayedOutcome> {
        self.events.take_resolved_outcomes()
    }

    /// Pause time outside of any event.
    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Resume time.
    pub fn resume(&mut self) {
        self.clock.resume();
    }

    /// Tear the session down to its starting point.
    ///
    /// Clears every effect, drops pending and scheduled events, rewinds the
    /// clock, and rebuilds the state from the economy configuration. The
    /// random source keeps its position.
    pub fn reset(&mut self) {
        let cleared = self.ledger.clear_all();
        self.ledger.set_time(0.0);
        self.events.reset();
        self.clock.reset();
        self.state = GameState::new(&self.economy);
        self.tick = 0;
        info!(cleared, "Session reset");
    }

    /// Tick counter.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The game clock.
    pub const fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The modifier ledger.
    pub const fn ledger(&self) -> &ModifierLedger {
        &self.ledger
    }

    /// Mutable ledger access for upgrade, staff and marketing producers.
    pub const fn ledger_mut(&mut self) -> &mut ModifierLedger {
        &mut self.ledger
    }

    /// The event engine.
    pub const fn events(&self) -> &EventEngine {
        &self.events
    }

    /// The simulation state.
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state access for simulation mechanics.
    pub const fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }
}

//! Event director: decides when to offer events and when to stop waiting
//! for the player.
//!
//! The director is the headless stand-in for the UI. Every game-time
//! interval it draws one eligible event from the catalog and presents it,
//! which pauses the clock. Notice events are resolved on the spot. Other
//! events wait for a decision; once they have been pending for the
//! configured real-time timeout the director takes the default choice on
//! the player's behalf.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};
use tycoon_core::catalog::EventCatalog;
use tycoon_core::config::EventsConfig;
use tycoon_core::events::Resolution;
use tycoon_core::random::RandomSource;
use tycoon_core::selection::default_choice;
use tycoon_core::session::GameSession;
use tycoon_core::state::StateSnapshot;
use tycoon_types::EventId;

use crate::error::EngineError;

/// Offsets the director's generator from the session's so the two draw
/// independent streams from one configured seed.
const DIRECTOR_SEED_SALT: u64 = 0x5EED_D1EC;

/// Something the director did during a step.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectorAction {
    /// An event was presented and time is paused.
    Offered {
        /// The presented event.
        event_id: EventId,
        /// Its headline.
        title: String,
    },
    /// The pending event was resolved with its default choice.
    Resolved(Resolution),
}

/// Paces event offers and auto-selects stale choices.
#[derive(Debug)]
pub struct Director {
    offer_interval: f64,
    auto_select_after: Duration,
    next_offer_at: f64,
    pending_for: Duration,
    stall_reported: bool,
    rng: SmallRng,
}

impl Director {
    /// Create a director from the events configuration.
    ///
    /// Invalid intervals fall back to zero: offer on every idle step, and
    /// auto-select immediately.
    pub fn new(config: &EventsConfig, seed: u64) -> Self {
        let offer_interval = if config.offer_interval_seconds.is_finite() {
            config.offer_interval_seconds.max(0.0)
        } else {
            0.0
        };
        let auto_select_after =
            Duration::try_from_secs_f64(config.auto_select_after_seconds).unwrap_or(Duration::ZERO);

        Self {
            offer_interval,
            auto_select_after,
            next_offer_at: offer_interval,
            pending_for: Duration::ZERO,
            stall_reported: false,
            rng: SmallRng::seed_from_u64(seed ^ DIRECTOR_SEED_SALT),
        }
    }

    /// Game time at which the next offer becomes due.
    pub const fn next_offer_at(&self) -> f64 {
        self.next_offer_at
    }

    /// Run one director step after the session has advanced.
    ///
    /// `elapsed` is the real time since the previous step and only counts
    /// toward the auto-select timeout while a choice is pending.
    pub fn step<R: RandomSource>(
        &mut self,
        session: &mut GameSession<R>,
        catalog: &EventCatalog,
        elapsed: Duration,
    ) -> Result<Vec<DirectorAction>, EngineError> {
        let mut actions = Vec::new();

        if session.events().pending_event().is_some() {
            self.pending_for = self.pending_for.saturating_add(elapsed);
        } else if let Some(action) = self.maybe_offer(session, catalog)? {
            actions.push(action);
        }

        if let Some(resolution) = self.maybe_auto_select(session)? {
            actions.push(DirectorAction::Resolved(resolution));
        }

        Ok(actions)
    }

    fn maybe_offer<R: RandomSource>(
        &mut self,
        session: &mut GameSession<R>,
        catalog: &EventCatalog,
    ) -> Result<Option<DirectorAction>, EngineError> {
        let now = session.clock().game_time();
        if now < self.next_offer_at {
            return Ok(None);
        }
        self.next_offer_at = now + self.offer_interval;

        let Some(event) = catalog
            .pick(
                session.state(),
                session.events().retired_events(),
                &mut self.rng,
            )
            .cloned()
        else {
            return Ok(None);
        };

        info!(
            event = event.id.as_str(),
            title = %event.title,
            category = ?event.category,
            game_time = now,
            "Event offered"
        );

        let action = DirectorAction::Offered {
            event_id: event.id.clone(),
            title: event.title.clone(),
        };
        session.present_event(event)?;
        self.pending_for = Duration::ZERO;
        self.stall_reported = false;
        Ok(Some(action))
    }

    fn maybe_auto_select<R: RandomSource>(
        &mut self,
        session: &mut GameSession<R>,
    ) -> Result<Option<Resolution>, EngineError> {
        let Some(event) = session.events().pending_event() else {
            return Ok(None);
        };

        let due = event.category.auto_resolves() || self.pending_for >= self.auto_select_after;
        if !due {
            return Ok(None);
        }

        let available_time = session.state().available_time();
        let Some(choice) = default_choice(event, available_time) else {
            if !self.stall_reported {
                warn!(
                    event = event.id.as_str(),
                    available_time,
                    "No choice fits the remaining founder time; waiting for the player"
                );
                self.stall_reported = true;
            }
            return Ok(None);
        };
        let choice_id = choice.id.clone();

        let resolution = session.resolve_choice(&choice_id)?;
        info!(
            event = resolution.event_id.as_str(),
            choice = resolution.choice_id.as_str(),
            consequence = resolution.consequence_id.as_ref().map(|c| c.as_str()),
            "Default choice taken"
        );
        self.pending_for = Duration::ZERO;
        self.stall_reported = false;
        Ok(Some(resolution))
    }
}

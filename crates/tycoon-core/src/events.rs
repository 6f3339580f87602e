//! Event resolution engine.
//!
//! A small state machine driven by the game loop:
//!
//! ```text
//! Idle --present_event--> ChoicePending --resolve_choice--> Idle
//!                                              |
//!                                              +--> delayed outcome scheduled
//!                                                   (fires once, on a later tick)
//! ```
//!
//! Presenting an event pauses time; resolving it restores the paused state
//! that preceded the event. Resolution charges the choice's upfront costs,
//! draws a weighted consequence, applies its immediate effects, registers
//! its temporary effects in the [`ModifierLedger`], and schedules its
//! delayed consequence. [`EventEngine::tick`] removes event effects whose
//! time is up and fires due delayed consequences against the state at fire
//! time.
//!
//! Authoring mistakes never abort a resolution: they are logged and the
//! engine falls back (first consequence, no-op effect). Caller-contract
//! violations are rejected with [`EventError`] and leave every piece of
//! state untouched.

use std::collections::{BTreeSet, VecDeque};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};
use tycoon_ledger::{EffectBuilder, ModifierLedger};
use tycoon_types::{
    ChoiceId, ConsequenceId, DelayedConsequence, DelayedConsequenceId, EffectId, EffectSource,
    EventEffect, EventId, GameEvent, SourceCategory, TemporaryEffect,
};

use crate::clock::TimeControl;
use crate::random::RandomSource;
use crate::requirements::evaluate_all;
use crate::selection::select_consequence;
use crate::state::SimulationState;

/// Number of resolutions kept in the history.
pub const HISTORY_LIMIT: usize = 64;

/// Errors for calls that break the engine's contract.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// An event is already waiting for a choice.
    #[error("event {pending} is already pending; cannot present {offered}")]
    AlreadyPending {
        /// The event waiting for a choice.
        pending: EventId,
        /// The event that was offered.
        offered: EventId,
    },

    /// `resolve_choice` was called with nothing pending.
    #[error("no event is pending")]
    NoPendingEvent,

    /// The choice does not belong to the pending event.
    #[error("event {event} has no choice {choice}")]
    UnknownChoice {
        /// The pending event.
        event: EventId,
        /// The rejected choice.
        choice: ChoiceId,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Binds a ledger effect registered by an event to its own expiry time.
///
/// The event engine removes the effect when `expires_at` passes, whether or
/// not the ledger's own sweep got there first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEventEffect {
    /// The ledger effect.
    pub effect_id: EffectId,
    /// The event that registered it.
    pub event_id: EventId,
    /// Absolute game time of expiry. `None` for permanent effects.
    pub expires_at: Option<f64>,
}

/// Outcome of one `resolve_choice` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// The resolved event.
    pub event_id: EventId,
    /// The choice taken.
    pub choice_id: ChoiceId,
    /// The drawn consequence. `None` when the choice had none.
    pub consequence_id: Option<ConsequenceId>,
    /// Text of the drawn consequence.
    pub description: Option<String>,
    /// Whether the draw fell back to the first consequence.
    pub fallback_used: bool,
    /// Ledger effects registered by this resolution.
    pub effect_ids: Vec<EffectId>,
    /// Delayed consequence scheduled by this resolution.
    pub scheduled: Option<DelayedConsequenceId>,
    /// Game time of resolution.
    pub resolved_at: f64,
}

/// A delayed consequence that has fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDelayedOutcome {
    /// The fired delayed consequence.
    pub delayed_id: DelayedConsequenceId,
    /// The event that scheduled it.
    pub event_id: EventId,
    /// Whether the success requirements held at fire time.
    pub succeeded: bool,
    /// Success or failure label for display.
    pub label: Option<String>,
    /// Ledger effects registered when it fired.
    pub effect_ids: Vec<EffectId>,
    /// Game time it fired.
    pub fired_at: f64,
}

/// What one engine sweep did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSweep {
    /// Event effects removed because their expiry passed.
    pub expired: Vec<EffectId>,
    /// Delayed consequences that fired.
    pub fired: Vec<ResolvedDelayedOutcome>,
}

/// Observable phase of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePhase {
    /// Nothing pending.
    Idle,
    /// An event waits for a choice.
    ChoicePending {
        /// The pending event.
        event_id: EventId,
    },
    /// No choice pending, but delayed consequences are scheduled.
    DelayedPending {
        /// Number of scheduled delayed consequences.
        count: usize,
    },
}

/// Mutable collaborators a resolution or sweep writes to.
pub struct EventContext<'a> {
    /// Simulation state receiving cash, experience, time and flag writes.
    pub state: &'a mut dyn SimulationState,
    /// Ledger receiving metric effects.
    pub ledger: &'a mut ModifierLedger,
    /// Clock providing game time and the pause handshake.
    pub clock: &'a mut dyn TimeControl,
}

#[derive(Debug, Clone)]
struct PendingEvent {
    event: GameEvent,
    was_paused: bool,
    presented_at: f64,
}

#[derive(Debug, Clone)]
struct ScheduledDelayed {
    delayed: DelayedConsequence,
    event_id: EventId,
    source: EffectSource,
    fires_at: f64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The event resolution state machine for one game session.
#[derive(Debug, Default)]
pub struct EventEngine {
    pending: Option<PendingEvent>,
    active_effects: Vec<ActiveEventEffect>,
    scheduled: Vec<ScheduledDelayed>,
    outcomes: Vec<ResolvedDelayedOutcome>,
    history: VecDeque<Resolution>,
    retired: BTreeSet<EventId>,
}

impl EventEngine {
    /// Create an idle engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> EnginePhase {
        if let Some(pending) = &self.pending {
            EnginePhase::ChoicePending {
                event_id: pending.event.id.clone(),
            }
        } else if self.scheduled.is_empty() {
            EnginePhase::Idle
        } else {
            EnginePhase::DelayedPending {
                count: self.scheduled.len(),
            }
        }
    }

    /// The event waiting for a choice, if any.
    pub fn pending_event(&self) -> Option<&GameEvent> {
        self.pending.as_ref().map(|p| &p.event)
    }

    /// Game time at which the pending event was presented.
    pub fn pending_since(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.presented_at)
    }

    /// Event effects currently tracked for explicit cleanup.
    pub fn active_effects(&self) -> &[ActiveEventEffect] {
        &self.active_effects
    }

    /// Number of scheduled delayed consequences.
    pub const fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    /// Most recent resolutions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Resolution> {
        self.history.iter()
    }

    /// Events flagged `once` that have already been resolved.
    pub const fn retired_events(&self) -> &BTreeSet<EventId> {
        &self.retired
    }

    /// Drain the delayed outcomes fired since the last call.
    pub fn take_resolved_outcomes(&mut self) -> Vec<ResolvedDelayedOutcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Offer `event` to the player and pause time.
    ///
    /// Remembers whether time was already paused so resolution can restore
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::AlreadyPending`] if another event is waiting
    /// for a choice. Nothing changes in that case.
    pub fn present_event(
        &mut self,
        event: GameEvent,
        clock: &mut dyn TimeControl,
    ) -> Result<(), EventError> {
        if let Some(pending) = &self.pending {
            warn!(
                pending = pending.event.id.as_str(),
                offered = event.id.as_str(),
                "Event presented while another is pending"
            );
            return Err(EventError::AlreadyPending {
                pending: pending.event.id.clone(),
                offered: event.id,
            });
        }

        if event.choices.is_empty() {
            warn!(event = event.id.as_str(), "Event has no choices");
        }

        let was_paused = clock.is_paused();
        clock.pause();
        info!(
            event = event.id.as_str(),
            category = ?event.category,
            was_paused,
            "Event presented"
        );
        self.pending = Some(PendingEvent {
            event,
            was_paused,
            presented_at: clock.now(),
        });
        Ok(())
    }

    /// Resolve the pending event with `choice_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::NoPendingEvent`] if nothing is pending, or
    /// [`EventError::UnknownChoice`] if the pending event has no such
    /// choice. The event stays pending and nothing is applied in either
    /// case.
    pub fn resolve_choice<R>(
        &mut self,
        choice_id: &ChoiceId,
        ctx: EventContext<'_>,
        rng: &mut R,
    ) -> Result<Resolution, EventError>
    where
        R: RandomSource + ?Sized,
    {
        let Some(pending) = self.pending.as_ref() else {
            warn!(choice = choice_id.as_str(), "Choice resolved with no pending event");
            return Err(EventError::NoPendingEvent);
        };
        if pending.event.choice(choice_id).is_none() {
            warn!(
                event = pending.event.id.as_str(),
                choice = choice_id.as_str(),
                "Choice does not belong to pending event"
            );
            return Err(EventError::UnknownChoice {
                event: pending.event.id.clone(),
                choice: choice_id.clone(),
            });
        }
        let PendingEvent {
            event, was_paused, ..
        } = self.pending.take().ok_or(EventError::NoPendingEvent)?;
        let choice = event
            .choice(choice_id)
            .ok_or_else(|| EventError::UnknownChoice {
                event: event.id.clone(),
                choice: choice_id.clone(),
            })?;

        let now = ctx.clock.now();
        let source = EffectSource::new(
            SourceCategory::Event,
            event.id.as_str(),
            event.title.as_str(),
        );

        // 1. Upfront costs
        if let Some(cost) = choice.cost {
            ctx.state.apply_cash(Decimal::ZERO.saturating_sub(cost));
        }
        if let Some(seconds) = choice.time_cost
            && seconds.is_finite()
            && seconds > 0.0
        {
            ctx.state.adjust_time(-seconds);
        }
        if let Some(flag) = &choice.sets_flag {
            ctx.state.set_flag(flag.clone(), true);
        }

        // 2. Weighted draw
        let selection = select_consequence(&choice.consequences, rng);
        if selection.is_none() {
            warn!(
                event = event.id.as_str(),
                choice = choice_id.as_str(),
                "Choice has no consequences; applying nothing"
            );
        }

        let mut effect_ids = Vec::new();
        let mut scheduled = None;

        if let Some(selection) = selection {
            let consequence = selection.consequence;

            // 3. Immediate effects
            effect_ids.extend(apply_effects(
                &consequence.effects,
                &source,
                ctx.state,
                ctx.ledger,
                now,
            ));

            // 4. Temporary effects
            for temporary in &consequence.temporary_effects {
                if let Some(active) =
                    register_temporary(temporary, &source, &event.id, ctx.ledger, now)
                {
                    effect_ids.push(active.effect_id);
                    self.active_effects.push(active);
                }
            }

            // 5. Delayed consequence
            if let Some(delayed) = &consequence.delayed_consequence {
                let fires_at = now + sanitize_delay(delayed);
                debug!(
                    delayed = delayed.id.as_str(),
                    fires_at,
                    "Delayed consequence scheduled"
                );
                scheduled = Some(delayed.id.clone());
                self.scheduled.push(ScheduledDelayed {
                    delayed: delayed.clone(),
                    event_id: event.id.clone(),
                    source: source.clone(),
                    fires_at,
                });
            }
        }

        // 6. Resolved
        if !was_paused {
            ctx.clock.resume();
        }
        if event.once {
            self.retired.insert(event.id.clone());
        }

        let resolution = Resolution {
            event_id: event.id.clone(),
            choice_id: choice_id.clone(),
            consequence_id: selection.map(|s| s.consequence.id.clone()),
            description: selection.and_then(|s| s.consequence.description.clone()),
            fallback_used: selection.is_some_and(|s| s.fallback),
            effect_ids,
            scheduled,
            resolved_at: now,
        };

        info!(
            event = resolution.event_id.as_str(),
            choice = resolution.choice_id.as_str(),
            consequence = ?resolution.consequence_id,
            effects = resolution.effect_ids.len(),
            "Event resolved"
        );

        if self.history.len() >= HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(resolution.clone());
        Ok(resolution)
    }

    /// Sweep expired event effects and fire due delayed consequences.
    ///
    /// Delayed consequences are evaluated against the state as it is now,
    /// not as it was when they were scheduled. Each fires exactly once.
    pub fn tick(&mut self, ctx: EventContext<'_>) -> EventSweep {
        let now = ctx.clock.now();
        let mut sweep = EventSweep::default();

        let mut kept = Vec::with_capacity(self.active_effects.len());
        for active in self.active_effects.drain(..) {
            match active.expires_at {
                Some(expires_at) if expires_at <= now => {
                    // The ledger's own sweep may have removed it already.
                    let _ = ctx.ledger.remove(active.effect_id);
                    sweep.expired.push(active.effect_id);
                }
                _ => kept.push(active),
            }
        }
        self.active_effects = kept;

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled)
            .into_iter()
            .partition(|s| s.fires_at <= now);
        self.scheduled = waiting;

        for entry in due {
            let outcome = fire_delayed(entry, ctx.state, ctx.ledger, now);
            self.outcomes.push(outcome.clone());
            sweep.fired.push(outcome);
        }

        if !sweep.expired.is_empty() || !sweep.fired.is_empty() {
            debug!(
                expired = sweep.expired.len(),
                fired = sweep.fired.len(),
                now,
                "Event sweep"
            );
        }
        sweep
    }

    /// Drop all pending, scheduled, and tracked state. The ledger is not
    /// touched; clear its event category separately.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Effect application
// ---------------------------------------------------------------------------

fn apply_effects(
    effects: &[EventEffect],
    source: &EffectSource,
    state: &mut dyn SimulationState,
    ledger: &mut ModifierLedger,
    now: f64,
) -> Vec<EffectId> {
    let mut registered = Vec::new();
    for effect in effects {
        match effect {
            EventEffect::Cash { amount } => state.apply_cash(*amount),
            EventEffect::Experience { amount } => state.add_experience(*amount),
            EventEffect::Time { seconds } => state.adjust_time(*seconds),
            EventEffect::Flag { id, value } => state.set_flag(id.clone(), *value),
            EventEffect::Metric {
                metric,
                kind,
                value,
                priority,
            } => {
                let builder = EffectBuilder::new(source.clone(), *metric, *kind)
                    .value(*value)
                    .priority(*priority)
                    .created_at(now);
                match ledger.record(builder) {
                    Ok(id) => registered.push(id),
                    Err(e) => warn!(
                        source = source.source_id.as_str(),
                        metric = %metric,
                        error = %e,
                        "Skipping invalid metric effect"
                    ),
                }
            }
        }
    }
    registered
}

fn register_temporary(
    temporary: &TemporaryEffect,
    source: &EffectSource,
    event_id: &EventId,
    ledger: &mut ModifierLedger,
    now: f64,
) -> Option<ActiveEventEffect> {
    let builder = EffectBuilder::new(source.clone(), temporary.metric, temporary.kind)
        .value(temporary.value)
        .priority(temporary.priority)
        .duration_seconds(temporary.duration_seconds)
        .created_at(now);

    match ledger.record(builder) {
        Ok(effect_id) => {
            let expires_at = temporary
                .duration_seconds
                .is_finite()
                .then(|| now + temporary.duration_seconds);
            Some(ActiveEventEffect {
                effect_id,
                event_id: event_id.clone(),
                expires_at,
            })
        }
        Err(e) => {
            warn!(
                event = event_id.as_str(),
                metric = %temporary.metric,
                error = %e,
                "Skipping invalid temporary effect"
            );
            None
        }
    }
}

fn sanitize_delay(delayed: &DelayedConsequence) -> f64 {
    if delayed.delay_seconds.is_finite() && delayed.delay_seconds >= 0.0 {
        delayed.delay_seconds
    } else {
        warn!(
            delayed = delayed.id.as_str(),
            delay = delayed.delay_seconds,
            "Invalid delay; firing on next sweep"
        );
        0.0
    }
}

fn fire_delayed(
    entry: ScheduledDelayed,
    state: &mut dyn SimulationState,
    ledger: &mut ModifierLedger,
    now: f64,
) -> ResolvedDelayedOutcome {
    let ScheduledDelayed {
        delayed,
        event_id,
        source,
        ..
    } = entry;

    let succeeded = evaluate_all(&delayed.success_requirements, &*state);
    let (effects, label) = if succeeded {
        (delayed.success_effects.as_slice(), delayed.success_label)
    } else {
        (
            delayed.failure_effects.as_deref().unwrap_or_default(),
            delayed.failure_label,
        )
    };

    let effect_ids = apply_effects(effects, &source, state, ledger, now);
    info!(
        delayed = delayed.id.as_str(),
        event = event_id.as_str(),
        succeeded,
        "Delayed consequence fired"
    );

    ResolvedDelayedOutcome {
        delayed_id: delayed.id,
        event_id,
        succeeded,
        label,
        effect_ids,
        fired_at: now,
    }
}

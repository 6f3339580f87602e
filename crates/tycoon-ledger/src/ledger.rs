//! The modifier ledger: the single store of every active effect.
//!
//! The [`ModifierLedger`] is constructed per game session and handed to the
//! simulation loop and to every producer. It owns the effect collection
//! outright; producers only hold [`EffectId`]s or their
//! `(category, source_id)` pair.
//!
//! # Design
//!
//! - **Insert/remove only**: effects are never edited in place.
//! - **Game clock only**: creation stamps and expiry use simulation seconds
//!   supplied by the caller through [`ModifierLedger::tick`] and
//!   [`ModifierLedger::set_time`]; wall-clock time is never consulted.
//! - **Observable**: every mutation publishes a [`LedgerChange`] on a
//!   broadcast channel. Dropping the receiver unsubscribes.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use tycoon_types::{Effect, EffectId, Metric, SourceCategory, SourceId};

use crate::calculation::{compose, CalculationBreakdown};
use crate::constraints::ConstraintTable;
use crate::{EffectBuilder, LedgerError};

/// Capacity of the change notification channel.
///
/// A subscriber that falls behind by more than this many messages receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest change.
const CHANGE_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

/// A mutation of the ledger, published to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerChange {
    /// An effect was inserted (or replaced one with the same id).
    Added {
        /// The inserted effect.
        id: EffectId,
        /// The metric it modifies.
        metric: Metric,
    },
    /// An effect was removed by id.
    Removed {
        /// The removed effect.
        id: EffectId,
    },
    /// Every effect from one source was removed.
    SourceRemoved {
        /// Source family.
        category: SourceCategory,
        /// Source key.
        source_id: SourceId,
        /// Number of effects removed.
        count: usize,
    },
    /// Every effect of one category was removed.
    CategoryCleared {
        /// The cleared family.
        category: SourceCategory,
        /// Number of effects removed.
        count: usize,
    },
    /// The expiration sweep removed effects.
    Expired {
        /// The expired effects.
        ids: Vec<EffectId>,
    },
    /// The ledger was emptied.
    Cleared {
        /// Number of effects removed.
        count: usize,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The store and calculator for all active effects of one game session.
#[derive(Debug)]
pub struct ModifierLedger {
    /// All effects, in insertion order.
    effects: Vec<Effect>,
    /// Bounds applied as the last composition step.
    constraints: ConstraintTable,
    /// Latest game time observed through `tick` or `set_time`.
    current_time: f64,
    /// Change notification sender.
    tx: broadcast::Sender<LedgerChange>,
}

impl ModifierLedger {
    /// Create an empty ledger with the standard constraint table.
    pub fn new() -> Self {
        Self::with_constraints(ConstraintTable::standard())
    }

    /// Create an empty ledger with a custom constraint table.
    pub fn with_constraints(constraints: ConstraintTable) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            effects: Vec::new(),
            constraints,
            current_time: 0.0,
            tx,
        }
    }

    /// Return the number of active effects.
    pub const fn len(&self) -> usize {
        self.effects.len()
    }

    /// Return whether the ledger holds no effects.
    pub const fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// The constraint table in use.
    pub const fn constraints(&self) -> &ConstraintTable {
        &self.constraints
    }

    /// The game time used to stamp effects recorded without one.
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the ledger's clock reading without sweeping.
    ///
    /// Used after a session reset and by producers that record effects
    /// between ticks.
    pub const fn set_time(&mut self, game_time: f64) {
        self.current_time = game_time;
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerChange> {
        self.tx.subscribe()
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Insert an effect.
    ///
    /// Reusing an id replaces the earlier effect: the newer one moves to
    /// the end of insertion order. This is a caller error and is logged.
    pub fn add(&mut self, effect: Effect) -> EffectId {
        let id = effect.id;
        let metric = effect.metric;

        if let Some(pos) = self.effects.iter().position(|e| e.id == id) {
            warn!(effect_id = %id, "Effect id reused; replacing earlier effect");
            self.effects.remove(pos);
        }

        debug!(
            effect_id = %id,
            metric = %metric,
            kind = ?effect.kind,
            value = effect.value,
            source = effect.source.source_id.as_str(),
            "Effect added"
        );
        self.effects.push(effect);
        self.publish(LedgerChange::Added { id, metric });
        id
    }

    /// Build and insert an effect, stamping it with the ledger's current
    /// game time when the builder carries no creation time.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the builder fails validation. Nothing is
    /// inserted in that case.
    pub fn record(&mut self, builder: EffectBuilder) -> Result<EffectId, LedgerError> {
        let effect = builder.build(self.current_time)?;
        Ok(self.add(effect))
    }

    /// Remove an effect by id. Returns whether anything was removed.
    ///
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: EffectId) -> bool {
        let Some(pos) = self.effects.iter().position(|e| e.id == id) else {
            return false;
        };
        self.effects.remove(pos);
        debug!(effect_id = %id, "Effect removed");
        self.publish(LedgerChange::Removed { id });
        true
    }

    /// Remove every effect whose source matches both `category` and
    /// `source_id`. Returns the number removed.
    pub fn remove_by_source(&mut self, category: SourceCategory, source_id: &SourceId) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !e.source.matches(category, source_id));
        let count = before.saturating_sub(self.effects.len());

        if count > 0 {
            debug!(
                category = category.as_str(),
                source_id = source_id.as_str(),
                count,
                "Source effects removed"
            );
            self.publish(LedgerChange::SourceRemoved {
                category,
                source_id: source_id.clone(),
                count,
            });
        }
        count
    }

    /// Remove every effect of `category`. Returns the number removed.
    pub fn clear_category(&mut self, category: SourceCategory) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| e.source.category != category);
        let count = before.saturating_sub(self.effects.len());

        if count > 0 {
            debug!(category = category.as_str(), count, "Category cleared");
            self.publish(LedgerChange::CategoryCleared { category, count });
        }
        count
    }

    /// Remove every effect.
    pub fn clear_all(&mut self) -> usize {
        let count = self.effects.len();
        self.effects.clear();
        if count > 0 {
            self.publish(LedgerChange::Cleared { count });
        }
        count
    }

    /// Expiration sweep.
    ///
    /// Removes every effect with `created_at + duration <= now`, records
    /// `now` as the ledger's clock reading, and publishes one
    /// [`LedgerChange::Expired`] if anything was removed. Returns the ids
    /// of the expired effects.
    pub fn tick(&mut self, now: f64) -> Vec<EffectId> {
        self.current_time = now;

        let mut expired = Vec::new();
        self.effects.retain(|e| {
            if e.is_expired_at(now) {
                expired.push(e.id);
                false
            } else {
                true
            }
        });

        if !expired.is_empty() {
            debug!(count = expired.len(), now, "Effects expired");
            self.publish(LedgerChange::Expired {
                ids: expired.clone(),
            });
        }
        expired
    }

    // -- Queries ------------------------------------------------------------

    /// Look up an effect by id.
    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// All effects, in insertion order.
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Effects modifying `metric`, in insertion order.
    pub fn effects_for(&self, metric: Metric) -> Vec<&Effect> {
        self.effects.iter().filter(|e| e.metric == metric).collect()
    }

    /// Effects contributed by one source, in insertion order.
    pub fn effects_from(&self, category: SourceCategory, source_id: &SourceId) -> Vec<&Effect> {
        self.effects
            .iter()
            .filter(|e| e.source.matches(category, source_id))
            .collect()
    }

    /// Seconds until an effect expires, measured from the ledger's clock.
    ///
    /// `None` when the effect is unknown or permanent.
    pub fn remaining_seconds(&self, id: EffectId) -> Option<f64> {
        self.get(id)
            .and_then(|e| e.remaining_seconds(self.current_time))
    }

    // -- Calculation --------------------------------------------------------

    /// Effective value of `metric` for a caller-supplied base value.
    ///
    /// Pure over the current ledger contents: repeated calls with the same
    /// inputs return the same result.
    pub fn calculate(&self, metric: Metric, base: f64) -> f64 {
        let effects = self.effects_for(metric);
        compose(
            metric,
            base,
            &effects,
            &self.constraints.get(metric),
            |_, _| {},
        )
    }

    /// Same computation as [`calculate`](Self::calculate), returning the
    /// ordered audit trail for display.
    pub fn calculate_detailed(&self, metric: Metric, base: f64) -> CalculationBreakdown {
        let effects = self.effects_for(metric);
        let mut steps = Vec::new();
        let mut contributors = Vec::new();

        let final_value = compose(
            metric,
            base,
            &effects,
            &self.constraints.get(metric),
            |step, effect| {
                if let Some(effect) = effect {
                    contributors.push(effect.source.clone());
                }
                steps.push(step);
            },
        );

        CalculationBreakdown {
            metric,
            base_value: base,
            steps,
            final_value,
            contributors,
        }
    }

    fn publish(&self, change: LedgerChange) {
        // Err only when there are no subscribers.
        let receivers = self.tx.send(change).unwrap_or(0);
        debug!(receivers, "Ledger change published");
    }
}

impl Default for ModifierLedger {
    fn default() -> Self {
        Self::new()
    }
}

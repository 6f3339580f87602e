//! Simulation state seen by the requirement evaluator and written by the
//! event engine.
//!
//! Two traits split the concern: [`StateSnapshot`] is the read interface
//! the evaluator consumes, [`SimulationState`] adds the writes an event
//! consequence may perform. [`GameState`] is the in-memory implementation
//! used by [`GameSession`](crate::session::GameSession) and the tests.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::debug;
use tycoon_types::{ConditionId, FlagId, NamedCondition, StaffRoleId, UpgradeId};

use crate::config::EconomyConfig;

/// Read-only view of the simulation state.
///
/// Implementations must be cheap to query: the evaluator reads them for
/// every requirement of every candidate event on every tick.
pub trait StateSnapshot {
    /// Cash on hand.
    fn cash(&self) -> Decimal;

    /// Accumulated experience points.
    fn experience(&self) -> i64;

    /// Level derived from experience, starting at 1.
    fn level(&self) -> u32;

    /// Cumulative expenses since the session started.
    fn total_expenses(&self) -> Decimal;

    /// Cumulative revenue since the session started.
    fn total_revenue(&self) -> Decimal;

    /// Elapsed game time in seconds.
    fn game_time(&self) -> f64;

    /// Founder time still available, in seconds.
    fn available_time(&self) -> f64;

    /// Value of a story flag. Unknown flags read as `false`.
    fn flag(&self, id: &FlagId) -> bool;

    /// Look up a designer-authored named condition.
    fn named_condition(&self, id: &ConditionId) -> Option<&NamedCondition>;

    /// Owned level of an upgrade. Zero when not owned.
    fn upgrade_level(&self, id: &UpgradeId) -> u32;

    /// Hired head count of a staff role.
    fn staff_count(&self, id: &StaffRoleId) -> u32;
}

/// Writes an event consequence can perform on the simulation.
pub trait SimulationState: StateSnapshot {
    /// Apply a signed cash delta. Positive amounts book revenue, negative
    /// amounts book expenses.
    fn apply_cash(&mut self, amount: Decimal);

    /// Apply a signed experience delta.
    fn add_experience(&mut self, amount: i64);

    /// Apply a signed founder time delta, in seconds.
    fn adjust_time(&mut self, seconds: f64);

    /// Write a story flag.
    fn set_flag(&mut self, id: FlagId, value: bool);
}

// ---------------------------------------------------------------------------
// In-memory state
// ---------------------------------------------------------------------------

/// In-memory game state for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Cash on hand.
    pub cash: Decimal,
    /// Cumulative revenue.
    pub total_revenue: Decimal,
    /// Cumulative expenses.
    pub total_expenses: Decimal,
    /// Accumulated experience.
    pub experience: i64,
    /// Founder time still available, in seconds.
    pub available_time: f64,
    /// Elapsed game time, mirrored from the clock each tick.
    pub game_time: f64,
    /// Story flags.
    pub flags: BTreeMap<FlagId, bool>,
    /// Named conditions available to requirements.
    pub conditions: BTreeMap<ConditionId, NamedCondition>,
    /// Owned upgrade levels.
    pub upgrades: BTreeMap<UpgradeId, u32>,
    /// Hired staff per role.
    pub staff: BTreeMap<StaffRoleId, u32>,
    /// Experience needed for level 2, 3, and so on.
    pub level_thresholds: Vec<i64>,
}

impl GameState {
    /// Build the starting state from economy configuration.
    pub fn new(economy: &EconomyConfig) -> Self {
        Self {
            cash: economy.starting_cash,
            total_revenue: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            experience: 0,
            available_time: economy.starting_time_budget,
            game_time: 0.0,
            flags: BTreeMap::new(),
            conditions: BTreeMap::new(),
            upgrades: BTreeMap::new(),
            staff: BTreeMap::new(),
            level_thresholds: economy.level_thresholds.clone(),
        }
    }

    /// Register a named condition, replacing any with the same id.
    pub fn define_condition(&mut self, condition: NamedCondition) {
        self.conditions.insert(condition.id.clone(), condition);
    }

    /// Set the owned level of an upgrade.
    pub fn set_upgrade_level(&mut self, id: UpgradeId, level: u32) {
        self.upgrades.insert(id, level);
    }

    /// Set the head count of a staff role.
    pub fn set_staff_count(&mut self, id: StaffRoleId, count: u32) {
        self.staff.insert(id, count);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}

impl StateSnapshot for GameState {
    fn cash(&self) -> Decimal {
        self.cash
    }

    fn experience(&self) -> i64 {
        self.experience
    }

    fn level(&self) -> u32 {
        let reached = self
            .level_thresholds
            .iter()
            .filter(|&&threshold| self.experience >= threshold)
            .count();
        u32::try_from(reached).map_or(u32::MAX, |n| n.saturating_add(1))
    }

    fn total_expenses(&self) -> Decimal {
        self.total_expenses
    }

    fn total_revenue(&self) -> Decimal {
        self.total_revenue
    }

    fn game_time(&self) -> f64 {
        self.game_time
    }

    fn available_time(&self) -> f64 {
        self.available_time
    }

    fn flag(&self, id: &FlagId) -> bool {
        self.flags.get(id).copied().unwrap_or(false)
    }

    fn named_condition(&self, id: &ConditionId) -> Option<&NamedCondition> {
        self.conditions.get(id)
    }

    fn upgrade_level(&self, id: &UpgradeId) -> u32 {
        self.upgrades.get(id).copied().unwrap_or(0)
    }

    fn staff_count(&self, id: &StaffRoleId) -> u32 {
        self.staff.get(id).copied().unwrap_or(0)
    }
}

impl SimulationState for GameState {
    fn apply_cash(&mut self, amount: Decimal) {
        self.cash = self.cash.saturating_add(amount);
        if amount.is_sign_negative() {
            self.total_expenses = self.total_expenses.saturating_add(amount.abs());
        } else {
            self.total_revenue = self.total_revenue.saturating_add(amount);
        }
        debug!(amount = %amount, cash = %self.cash, "Cash applied");
    }

    fn add_experience(&mut self, amount: i64) {
        self.experience = self.experience.saturating_add(amount);
    }

    fn adjust_time(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.available_time = (self.available_time + seconds).max(0.0);
        }
    }

    fn set_flag(&mut self, id: FlagId, value: bool) {
        debug!(flag = id.as_str(), value, "Flag set");
        self.flags.insert(id, value);
    }
}

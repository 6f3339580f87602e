//! Enumeration types for the Tycoon simulation.
//!
//! Every enumeration here is closed: adding a metric or an effect kind is a
//! compile-time change, so every `match` over them is checked for
//! exhaustiveness.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// A named numeric quantity whose effective value is derived by the
/// modifier ledger from a base value and the active effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    // --- Lead flow ---
    /// Seconds between two customer spawns. Larger percent bonuses
    /// shrink the interval (inverted-rate family).
    SpawnIntervalSeconds,
    /// Spawn rate expressed as a percentage of the industry baseline.
    SpawnRatePercent,
    /// Probability that a lead converts into a paying customer (0..1).
    ConversionRate,

    // --- Service ---
    /// Multiplier applied to service speed.
    ServiceSpeedMultiplier,
    /// Number of service rooms available at once (integer).
    ServiceRooms,
    /// Probability that a served customer leaves happy (0..1).
    HappyProbability,

    // --- Revenue ---
    /// Multiplier applied to every service payment.
    ServiceRevenueMultiplier,
    /// Flat bonus added to every service payment.
    ServiceRevenueFlatBonus,
    /// Multiplier applied to reputation gains.
    ReputationMultiplier,

    // --- Costs and time ---
    /// Recurring expenses charged each game month.
    MonthlyExpenses,
    /// Founder working hours available per month (integer).
    FounderWorkingTime,

    // --- Service tier mix ---
    /// Selection weight of high-tier services.
    HighTierServiceWeight,
    /// Selection weight of mid-tier services.
    MidTierServiceWeight,
    /// Selection weight of low-tier services.
    LowTierServiceWeight,
}

impl Metric {
    /// Every metric, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::SpawnIntervalSeconds,
        Self::SpawnRatePercent,
        Self::ConversionRate,
        Self::ServiceSpeedMultiplier,
        Self::ServiceRooms,
        Self::HappyProbability,
        Self::ServiceRevenueMultiplier,
        Self::ServiceRevenueFlatBonus,
        Self::ReputationMultiplier,
        Self::MonthlyExpenses,
        Self::FounderWorkingTime,
        Self::HighTierServiceWeight,
        Self::MidTierServiceWeight,
        Self::LowTierServiceWeight,
    ];

    /// Whether percent and multiply effects divide instead of multiply.
    ///
    /// Interval-style metrics shrink when a producer grants a bonus, so a
    /// `+50%` spawn bonus turns a 10 s interval into `10 / 1.5` seconds.
    pub const fn is_inverted_rate(self) -> bool {
        matches!(self, Self::SpawnIntervalSeconds)
    }

    /// Stable label for logging and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpawnIntervalSeconds => "spawnIntervalSeconds",
            Self::SpawnRatePercent => "spawnRatePercent",
            Self::ConversionRate => "conversionRate",
            Self::ServiceSpeedMultiplier => "serviceSpeedMultiplier",
            Self::ServiceRooms => "serviceRooms",
            Self::HappyProbability => "happyProbability",
            Self::ServiceRevenueMultiplier => "serviceRevenueMultiplier",
            Self::ServiceRevenueFlatBonus => "serviceRevenueFlatBonus",
            Self::ReputationMultiplier => "reputationMultiplier",
            Self::MonthlyExpenses => "monthlyExpenses",
            Self::FounderWorkingTime => "founderWorkingTime",
            Self::HighTierServiceWeight => "highTierServiceWeight",
            Self::MidTierServiceWeight => "midTierServiceWeight",
            Self::LowTierServiceWeight => "lowTierServiceWeight",
        }
    }
}

impl core::fmt::Display for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Effect kinds and sources
// ---------------------------------------------------------------------------

/// How an effect's value combines with a metric.
///
/// The ledger folds kinds in declaration order: every `Add`, then the
/// summed `Percent`, then each `Multiply`, then the winning `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EffectKind {
    /// Flat addition to the running value.
    Add,
    /// Percentage points, summed across effects before applying.
    Percent,
    /// Multiplicative factor applied individually.
    Multiply,
    /// Replaces the running value outright; highest priority wins.
    Set,
}

/// The family of producer that contributed an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum SourceCategory {
    /// A purchased upgrade.
    Upgrade,
    /// A running marketing campaign.
    Marketing,
    /// A hired staff member.
    Staff,
    /// A resolved game event.
    Event,
}

impl SourceCategory {
    /// Stable label for logging and display.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Marketing => "marketing",
            Self::Staff => "staff",
            Self::Event => "event",
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Presentation category of a game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum EventCategory {
    /// A chance to invest for an upside.
    Opportunity,
    /// A threat the player must respond to.
    Risk,
    /// A story beat with trade-offs between choices.
    Dilemma,
    /// An announcement that resolves without a player decision.
    Notice,
}

impl EventCategory {
    /// Whether events of this category skip the pending-choice surface.
    pub const fn auto_resolves(self) -> bool {
        matches!(self, Self::Notice)
    }
}

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// Comparison applied between an observed value and a requirement target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ComparisonOperator {
    /// Strictly greater than.
    #[serde(rename = ">")]
    GreaterThan,
    /// Strictly less than.
    #[serde(rename = "<")]
    LessThan,
    /// Equal within floating-point tolerance.
    #[serde(rename = "==")]
    Equal,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// Less than or equal.
    #[serde(rename = "<=")]
    LessOrEqual,
}

/// Tolerance used by [`ComparisonOperator::Equal`].
const EQUALITY_TOLERANCE: f64 = 1e-9;

impl ComparisonOperator {
    /// Apply the comparison `observed <op> target`.
    pub const fn holds(self, observed: f64, target: f64) -> bool {
        match self {
            Self::GreaterThan => observed > target,
            Self::LessThan => observed < target,
            Self::Equal => (observed - target).abs() <= EQUALITY_TOLERANCE,
            Self::GreaterOrEqual => observed >= target,
            Self::LessOrEqual => observed <= target,
        }
    }

    /// The symbol used in authored content.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equal => "==",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

/// A numeric quantity of the simulation state that requirements can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum Observable {
    /// Cash on hand.
    Cash,
    /// Accumulated experience points.
    Experience,
    /// Level derived from experience.
    Level,
    /// Cumulative expenses paid since the session started.
    TotalExpenses,
    /// Cumulative revenue earned since the session started.
    TotalRevenue,
    /// Elapsed game time in seconds.
    GameTime,
    /// Founder time still available to spend, in seconds.
    AvailableTime,
    /// Any observable this build does not recognize.
    #[serde(other)]
    Unknown,
}

//! Modifier ledger and metric composition for the Tycoon simulation.
//!
//! Every effective metric value in the simulation is derived here. Upgrades,
//! staff, marketing campaigns and events register [`Effect`]s; simulation
//! mechanics never read a configured base value directly but ask the ledger
//! for `calculate(metric, base)`.
//!
//! # Architecture
//!
//! - [`constraints`] -- Static per-metric bounds and integer rounding.
//! - [`builder`] -- The [`EffectBuilder`] for validated effect construction.
//! - [`calculation`] -- The five-step composition fold and its audit trail.
//! - [`ledger`] -- The [`ModifierLedger`]: effect storage, lifecycle,
//!   expiration sweep, and change notifications.
//!
//! # Composition Order
//!
//! For one metric, with `value` starting at the caller's base:
//!
//! ```text
//! 1. value += sum(Add)
//! 2. value *= 1 + sum(Percent) / 100        (inverted: value /= max(0.01, ..))
//! 3. value *= m for each Multiply           (inverted: value /= max(0.01, |m|))
//! 4. value  = highest-priority Set, if any
//! 5. round and clamp to the metric constraint
//! ```
//!
//! # Usage
//!
//! ```
//! use tycoon_ledger::{EffectBuilder, ModifierLedger};
//! use tycoon_types::{EffectKind, EffectSource, Metric, SourceCategory};
//!
//! let mut ledger = ModifierLedger::new();
//! let source = EffectSource::new(SourceCategory::Upgrade, "coffee", "Coffee machine");
//!
//! ledger
//!     .record(EffectBuilder::new(source, Metric::SpawnRatePercent, EffectKind::Add).value(2.0))
//!     .ok();
//!
//! assert!((ledger.calculate(Metric::SpawnRatePercent, 10.0) - 12.0).abs() < 1e-9);
//! ```
//!
//! [`Effect`]: tycoon_types::Effect

pub mod builder;
pub mod calculation;
pub mod constraints;
pub mod ledger;

// Re-export primary types at crate root.
pub use builder::EffectBuilder;
pub use calculation::{CalculationBreakdown, CalculationStep};
pub use constraints::{ConstraintTable, MetricConstraint};
pub use ledger::{LedgerChange, ModifierLedger};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when building an effect.
///
/// The ledger itself never fails once an effect exists; validation happens
/// at construction.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The modifier value is NaN or infinite.
    #[error("effect value must be finite, got {value}")]
    NonFiniteValue {
        /// The invalid value.
        value: f64,
    },

    /// The duration is negative or NaN.
    #[error("effect duration must be non-negative, got {duration}")]
    InvalidDuration {
        /// The invalid duration in seconds.
        duration: f64,
    },

    /// The creation timestamp is NaN or infinite.
    #[error("effect creation time must be finite, got {created_at}")]
    InvalidCreatedAt {
        /// The invalid timestamp.
        created_at: f64,
    },
}

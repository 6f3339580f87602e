//! Shared type definitions for the Tycoon business simulation.
//!
//! This crate is the single source of truth for the data flowing between
//! the modifier ledger, the requirement evaluator, and the event engine.
//! Ledger-facing types are exported to `TypeScript` via `ts-rs` so the
//! dashboard can render effect breakdowns.
//!
//! # Modules
//!
//! - [`ids`] -- Effect UUIDs and authored content keys
//! - [`enums`] -- Closed enumerations (metrics, effect kinds, categories, operators)
//! - [`effects`] -- Ledger effect records
//! - [`requirements`] -- Requirement gates and named conditions
//! - [`content`] -- Events, choices, consequences, delayed consequences

pub mod content;
pub mod effects;
pub mod enums;
pub mod ids;
pub mod requirements;

// Re-export all public types at crate root for convenience.
pub use content::{Choice, Consequence, DelayedConsequence, EventEffect, GameEvent, TemporaryEffect};
pub use effects::{Effect, EffectSource};
pub use enums::{
    ComparisonOperator, EffectKind, EventCategory, Metric, Observable, SourceCategory,
};
pub use ids::{
    ChoiceId, ConditionId, ConsequenceId, DelayedConsequenceId, EffectId, EventId, FlagId,
    SourceId, StaffRoleId, UpgradeId,
};
pub use requirements::{NamedCondition, Requirement};

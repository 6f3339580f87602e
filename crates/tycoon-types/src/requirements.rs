//! Requirement records gating content visibility and delayed outcomes.
//!
//! A requirement list is read with AND semantics. The evaluator itself
//! lives in `tycoon-core`; this module only defines the wire shapes
//! authored by the content console.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ComparisonOperator, Observable};
use crate::ids::{ConditionId, FlagId, StaffRoleId, UpgradeId};

const fn default_expected() -> bool {
    true
}

/// A boolean gate over simulation state.
///
/// Wire shape: `{"type": "flag", "id": "...", "expected": true}` and so on.
/// Unknown `type` tags deserialize into [`Requirement::Unknown`], which the
/// evaluator treats as unmet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Requirement {
    /// A story flag must read as `expected`. Missing flags read as `false`.
    Flag {
        /// The flag to look up.
        id: FlagId,
        /// The value the flag must have.
        #[serde(default = "default_expected")]
        expected: bool,
    },

    /// A designer-authored named condition must evaluate to `expected`.
    Condition {
        /// The named condition to evaluate.
        id: ConditionId,
        /// The result the condition must produce.
        #[serde(default = "default_expected")]
        expected: bool,
    },

    /// A numeric observable compared against a target.
    Metric {
        /// The quantity to observe.
        id: Observable,
        /// Comparison to apply. Required for the requirement to hold.
        #[serde(default)]
        operator: Option<ComparisonOperator>,
        /// Target value. Required for the requirement to hold.
        #[serde(default)]
        value: Option<f64>,
        /// The result the comparison must produce.
        #[serde(default = "default_expected")]
        expected: bool,
    },

    /// Ownership or level of an upgrade.
    ///
    /// With `operator` and `value`, the owned level is compared. Without,
    /// "owns at least one level" is compared against `expected`.
    Upgrade {
        /// The upgrade to look up.
        id: UpgradeId,
        /// Optional level comparison.
        #[serde(default)]
        operator: Option<ComparisonOperator>,
        /// Optional level target.
        #[serde(default)]
        value: Option<f64>,
        /// Expected ownership when no comparison is given.
        #[serde(default = "default_expected")]
        expected: bool,
    },

    /// Head count of a staff role.
    ///
    /// With `operator` and `value`, the hired count is compared. Without,
    /// "has hired at least one" is compared against `expected`.
    Staff {
        /// The role to look up.
        id: StaffRoleId,
        /// Optional head-count comparison.
        #[serde(default)]
        operator: Option<ComparisonOperator>,
        /// Optional head-count target.
        #[serde(default)]
        value: Option<f64>,
        /// Expected hiring state when no comparison is given.
        #[serde(default = "default_expected")]
        expected: bool,
    },

    /// A requirement type this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl Requirement {
    /// A flag that must be set.
    pub fn flag(id: impl Into<FlagId>) -> Self {
        Self::Flag {
            id: id.into(),
            expected: true,
        }
    }

    /// A flag that must be unset or false.
    pub fn not_flag(id: impl Into<FlagId>) -> Self {
        Self::Flag {
            id: id.into(),
            expected: false,
        }
    }

    /// A numeric comparison over an observable.
    pub const fn metric(id: Observable, operator: ComparisonOperator, value: f64) -> Self {
        Self::Metric {
            id,
            operator: Some(operator),
            value: Some(value),
            expected: true,
        }
    }

    /// A named condition that must hold.
    pub fn condition(id: impl Into<ConditionId>) -> Self {
        Self::Condition {
            id: id.into(),
            expected: true,
        }
    }

    /// Short tag for log fields.
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Flag { .. } => "flag",
            Self::Condition { .. } => "condition",
            Self::Metric { .. } => "metric",
            Self::Upgrade { .. } => "upgrade",
            Self::Staff { .. } => "staff",
            Self::Unknown => "unknown",
        }
    }
}

/// A reusable `{metric, operator, value}` triple authored once and
/// referenced by [`Requirement::Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct NamedCondition {
    /// Key referenced by requirements.
    pub id: ConditionId,
    /// The quantity to observe.
    pub metric: Observable,
    /// Comparison to apply.
    pub operator: ComparisonOperator,
    /// Target value.
    pub value: f64,
}

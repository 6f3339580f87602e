//! Static per-metric bounds.
//!
//! Constraints are the last step of every composition: whatever effects
//! are active, a metric's computed value always lies inside its bounds.
//! The table is built once per session and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tycoon_types::Metric;

/// Bounds and rounding for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricConstraint {
    /// Inclusive lower bound.
    #[serde(default)]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub max: Option<f64>,
    /// Whether the value is rounded to the nearest integer.
    #[serde(default)]
    pub round_to_int: bool,
}

impl MetricConstraint {
    /// A constraint that leaves every value untouched.
    pub const UNBOUNDED: Self = Self {
        min: None,
        max: None,
        round_to_int: false,
    };

    /// Bounded on both sides.
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            round_to_int: false,
        }
    }

    /// Bounded below only.
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
            round_to_int: false,
        }
    }

    /// The same bounds, rounding to integers.
    #[must_use]
    pub const fn rounded(mut self) -> Self {
        self.round_to_int = true;
        self
    }

    /// Round (if flagged) and clamp `value` into the bounds.
    ///
    /// Rounding happens first so the clamp remains the final word. NaN
    /// maps to the lower bound, else the upper bound, else zero.
    pub fn apply(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min.or(self.max).unwrap_or(0.0);
        }
        let mut v = if self.round_to_int { value.round() } else { value };
        if let Some(min) = self.min
            && v < min
        {
            v = min;
        }
        if let Some(max) = self.max
            && v > max
        {
            v = max;
        }
        v
    }
}

/// Lookup from metric to its [`MetricConstraint`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTable {
    entries: BTreeMap<Metric, MetricConstraint>,
}

impl ConstraintTable {
    /// The constraints shipped with the game.
    pub fn standard() -> Self {
        let entries = Metric::ALL
            .iter()
            .map(|&metric| (metric, standard_constraint(metric)))
            .collect();
        Self { entries }
    }

    /// A table with no bounds on any metric.
    pub fn unbounded() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Replace the constraint for one metric.
    #[must_use]
    pub fn with(mut self, metric: Metric, constraint: MetricConstraint) -> Self {
        self.entries.insert(metric, constraint);
        self
    }

    /// The constraint for `metric`, unbounded when none is registered.
    pub fn get(&self, metric: Metric) -> MetricConstraint {
        self.entries
            .get(&metric)
            .copied()
            .unwrap_or(MetricConstraint::UNBOUNDED)
    }

    /// Apply the constraint for `metric` to `value`.
    pub fn apply(&self, metric: Metric, value: f64) -> f64 {
        self.get(metric).apply(value)
    }
}

impl Default for ConstraintTable {
    fn default() -> Self {
        Self::standard()
    }
}

const fn standard_constraint(metric: Metric) -> MetricConstraint {
    match metric {
        Metric::SpawnIntervalSeconds => MetricConstraint::at_least(0.5),
        Metric::ConversionRate | Metric::HappyProbability => MetricConstraint::between(0.0, 1.0),
        Metric::ServiceSpeedMultiplier => MetricConstraint::between(0.1, 10.0),
        Metric::ServiceRooms => MetricConstraint::between(1.0, 50.0).rounded(),
        Metric::FounderWorkingTime => MetricConstraint::at_least(0.0).rounded(),
        Metric::SpawnRatePercent
        | Metric::ServiceRevenueMultiplier
        | Metric::ReputationMultiplier
        | Metric::MonthlyExpenses
        | Metric::HighTierServiceWeight
        | Metric::MidTierServiceWeight
        | Metric::LowTierServiceWeight => MetricConstraint::at_least(0.0),
        Metric::ServiceRevenueFlatBonus => MetricConstraint::UNBOUNDED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn probability_is_clamped_to_unit_interval() {
        let table = ConstraintTable::standard();
        assert!(close(table.apply(Metric::HappyProbability, 1.4), 1.0));
        assert!(close(table.apply(Metric::HappyProbability, -0.2), 0.0));
        assert!(close(table.apply(Metric::HappyProbability, 0.65), 0.65));
    }

    #[test]
    fn nan_maps_to_a_bound() {
        assert!(close(MetricConstraint::between(0.0, 1.0).apply(f64::NAN), 0.0));
        assert!(close(MetricConstraint::at_least(2.0).apply(f64::NAN), 2.0));
        assert!(close(MetricConstraint::UNBOUNDED.apply(f64::NAN), 0.0));
    }

    #[test]
    fn rooms_are_rounded_then_clamped() {
        let table = ConstraintTable::standard();
        assert!(close(table.apply(Metric::ServiceRooms, 2.6), 3.0));
        assert!(close(table.apply(Metric::ServiceRooms, 0.2), 1.0));
        assert!(close(table.apply(Metric::ServiceRooms, 80.0), 50.0));
    }

    #[test]
    fn every_metric_has_a_standard_entry() {
        let table = ConstraintTable::standard();
        assert_eq!(table.entries.len(), Metric::ALL.len());
    }

    #[test]
    fn overrides_replace_standard_bounds() {
        let table = ConstraintTable::standard()
            .with(Metric::ServiceRooms, MetricConstraint::between(1.0, 4.0).rounded());
        assert!(close(table.apply(Metric::ServiceRooms, 9.0), 4.0));
    }

    #[test]
    fn unbounded_table_passes_values_through() {
        let table = ConstraintTable::unbounded();
        assert!(close(table.apply(Metric::HappyProbability, 7.5), 7.5));
    }
}

//! The metric composition fold.
//!
//! [`compose`] is the single implementation behind both
//! [`ModifierLedger::calculate`] and [`ModifierLedger::calculate_detailed`];
//! the detailed variant only passes a recorder that collects one
//! [`CalculationStep`] per applied effect. Keeping one fold means the audit
//! trail can never disagree with the value the simulation uses.
//!
//! [`ModifierLedger::calculate`]: crate::ModifierLedger::calculate
//! [`ModifierLedger::calculate_detailed`]: crate::ModifierLedger::calculate_detailed

use std::cmp::Reverse;

use serde::Serialize;
use tracing::warn;
use tycoon_types::{Effect, EffectId, EffectKind, EffectSource, Metric};

use crate::constraints::MetricConstraint;

/// Floor applied to every divisor of the inverted-rate family.
pub const MIN_DIVISOR: f64 = 0.01;

/// Label of the synthetic first step.
pub const BASE_STEP_LABEL: &str = "Base";

/// Label of the synthetic step recorded when clamping changed the value.
pub const CONSTRAINT_STEP_LABEL: &str = "Constraints applied";

/// One entry of a metric's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStep {
    /// Display label: the source name, or a synthetic label.
    pub label: String,
    /// The effect applied at this step. `None` for synthetic steps.
    pub effect_id: Option<EffectId>,
    /// Kind of the applied effect. `None` for synthetic steps.
    pub kind: Option<EffectKind>,
    /// The effect's own value (the base for the first step).
    pub operand: f64,
    /// Running value after this step.
    pub value_after: f64,
}

impl CalculationStep {
    fn synthetic(label: &str, value: f64) -> Self {
        Self {
            label: label.to_owned(),
            effect_id: None,
            kind: None,
            operand: value,
            value_after: value,
        }
    }

    fn applied(effect: &Effect, value_after: f64) -> Self {
        Self {
            label: effect.source.display_name.clone(),
            effect_id: Some(effect.id),
            kind: Some(effect.kind),
            operand: effect.value,
            value_after,
        }
    }
}

/// Ordered audit trail for one metric computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationBreakdown {
    /// The metric computed.
    pub metric: Metric,
    /// The caller's base value.
    pub base_value: f64,
    /// Steps in application order, starting with the base.
    pub steps: Vec<CalculationStep>,
    /// Result, identical to `calculate` for the same inputs.
    pub final_value: f64,
    /// Sources of every effect that produced a step, in step order.
    pub contributors: Vec<EffectSource>,
}

/// Fold `effects` over `base` for `metric`.
///
/// `effects` must already be filtered to `metric` and be in insertion
/// order. `record` receives every step as it is applied; pass a no-op
/// closure when no trail is needed.
pub fn compose<'a, F>(
    metric: Metric,
    base: f64,
    effects: &[&'a Effect],
    constraint: &MetricConstraint,
    mut record: F,
) -> f64
where
    F: FnMut(CalculationStep, Option<&'a Effect>),
{
    let mut value = if base.is_nan() {
        warn!(metric = %metric, "NaN base value; composing from zero");
        0.0
    } else {
        base
    };
    record(CalculationStep::synthetic(BASE_STEP_LABEL, value), None);
    let start = value;

    // `ModifierLedger::add` takes effects unvalidated.
    let effects: Vec<&'a Effect> = effects
        .iter()
        .copied()
        .filter(|effect| {
            let usable = effect.value.is_finite();
            if !usable {
                warn!(
                    metric = %metric,
                    effect_id = %effect.id,
                    value = effect.value,
                    "Non-finite effect value; skipping effect"
                );
            }
            usable
        })
        .collect();
    let effects = effects.as_slice();

    let inverted = metric.is_inverted_rate();

    // 1. Add
    for &effect in effects.iter().filter(|e| e.kind == EffectKind::Add) {
        value += effect.value;
        record(CalculationStep::applied(effect, value), Some(effect));
    }

    // 2. Percent: summed, applied once. Each step shows the running total.
    let before_percent = value;
    let mut percent_sum = 0.0;
    for &effect in effects.iter().filter(|e| e.kind == EffectKind::Percent) {
        percent_sum += effect.value;
        value = apply_percent(before_percent, percent_sum, inverted);
        record(CalculationStep::applied(effect, value), Some(effect));
    }

    // 3. Multiply: priority descending, ties in insertion order.
    let mut multiplies: Vec<&'a Effect> = effects
        .iter()
        .copied()
        .filter(|e| e.kind == EffectKind::Multiply)
        .collect();
    multiplies.sort_by_key(|e| Reverse(e.priority));
    for effect in multiplies {
        value = if inverted {
            value / effect.value.abs().max(MIN_DIVISOR)
        } else {
            value * effect.value
        };
        record(CalculationStep::applied(effect, value), Some(effect));
    }

    // 4. Set: the first effect holding the highest priority wins.
    if let Some(winner) = winning_set(effects) {
        value = winner.value;
        record(CalculationStep::applied(winner, value), Some(winner));
    }

    if value.is_nan() {
        warn!(metric = %metric, "Composition produced NaN; falling back to base");
        value = start;
    }

    // 5. Constraint
    let constrained = constraint.apply(value);
    if (constrained - value).abs() > f64::EPSILON {
        record(
            CalculationStep::synthetic(CONSTRAINT_STEP_LABEL, constrained),
            None,
        );
    }
    constrained
}

fn apply_percent(value: f64, percent_sum: f64, inverted: bool) -> f64 {
    let factor = 1.0 + percent_sum / 100.0;
    if inverted {
        value / factor.max(MIN_DIVISOR)
    } else {
        value * factor
    }
}

fn winning_set<'a>(effects: &[&'a Effect]) -> Option<&'a Effect> {
    let mut winner: Option<&'a Effect> = None;
    for &effect in effects.iter().filter(|e| e.kind == EffectKind::Set) {
        match winner {
            Some(current) if effect.priority <= current.priority => {}
            _ => winner = Some(effect),
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use tycoon_types::SourceCategory;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn effect(metric: Metric, kind: EffectKind, value: f64, priority: i32) -> Effect {
        Effect {
            id: EffectId::new(),
            source: EffectSource::new(SourceCategory::Upgrade, "u", format!("{kind:?} {value}")),
            metric,
            kind,
            value,
            priority,
            duration_seconds: None,
            created_at: 0.0,
        }
    }

    fn fold(metric: Metric, base: f64, effects: &[Effect]) -> f64 {
        let refs: Vec<&Effect> = effects.iter().collect();
        compose(metric, base, &refs, &MetricConstraint::UNBOUNDED, |_, _| {})
    }

    #[test]
    fn non_finite_effect_values_are_skipped() {
        let effects = [
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, f64::NAN, 0),
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Add, f64::INFINITY, 0),
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, 2.0, 0),
        ];
        assert!(close(fold(Metric::ServiceSpeedMultiplier, 1.5, &effects), 3.0));

        let set = [effect(Metric::ServiceSpeedMultiplier, EffectKind::Set, f64::NAN, 9)];
        assert!(close(fold(Metric::ServiceSpeedMultiplier, 1.5, &set), 1.5));
    }

    #[test]
    fn nan_from_finite_values_falls_back_to_base() {
        // inf * 0 is NaN even though each operand was finite at the source.
        let effects = [
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, f64::MAX, 1),
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, f64::MAX, 1),
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, 0.0, 0),
        ];
        assert!(close(fold(Metric::ServiceSpeedMultiplier, 2.0, &effects), 2.0));
    }

    #[test]
    fn no_effects_returns_base() {
        assert!(close(fold(Metric::SpawnRatePercent, 10.0, &[]), 10.0));
    }

    #[test]
    fn add_then_percent_on_ordinary_metric() {
        let effects = [
            effect(Metric::SpawnRatePercent, EffectKind::Percent, 50.0, 0),
            effect(Metric::SpawnRatePercent, EffectKind::Add, 2.0, 0),
        ];
        // Add applies before percent regardless of insertion order.
        assert!(close(fold(Metric::SpawnRatePercent, 10.0, &effects), 18.0));
    }

    #[test]
    fn inverted_metric_divides() {
        let effects = [
            effect(Metric::SpawnIntervalSeconds, EffectKind::Add, 2.0, 0),
            effect(Metric::SpawnIntervalSeconds, EffectKind::Percent, 50.0, 0),
        ];
        assert!(close(fold(Metric::SpawnIntervalSeconds, 10.0, &effects), 8.0));
    }

    #[test]
    fn percents_are_summed_not_compounded() {
        let effects = [
            effect(Metric::ServiceRevenueMultiplier, EffectKind::Percent, 10.0, 0),
            effect(Metric::ServiceRevenueMultiplier, EffectKind::Percent, 10.0, 0),
        ];
        assert!(close(fold(Metric::ServiceRevenueMultiplier, 100.0, &effects), 120.0));
    }

    #[test]
    fn multiplies_compound() {
        let effects = [
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, 2.0, 0),
            effect(Metric::ServiceSpeedMultiplier, EffectKind::Multiply, 1.5, 0),
        ];
        assert!(close(fold(Metric::ServiceSpeedMultiplier, 1.0, &effects), 3.0));
    }

    #[test]
    fn inverted_multiply_divides_by_absolute_value() {
        let effects = [effect(Metric::SpawnIntervalSeconds, EffectKind::Multiply, -2.0, 0)];
        assert!(close(fold(Metric::SpawnIntervalSeconds, 10.0, &effects), 5.0));
    }

    #[test]
    fn inverted_divisors_are_floored() {
        let percent = [effect(Metric::SpawnIntervalSeconds, EffectKind::Percent, -100.0, 0)];
        let value = fold(Metric::SpawnIntervalSeconds, 10.0, &percent);
        assert!(value.is_finite());
        assert!(close(value, 1000.0));

        let multiply = [effect(Metric::SpawnIntervalSeconds, EffectKind::Multiply, 0.0, 0)];
        let value = fold(Metric::SpawnIntervalSeconds, 10.0, &multiply);
        assert!(close(value, 1000.0));
    }

    #[test]
    fn highest_priority_set_wins_regardless_of_order() {
        let high_first = [
            effect(Metric::ServiceRooms, EffectKind::Set, 7.0, 5),
            effect(Metric::ServiceRooms, EffectKind::Set, 3.0, 1),
        ];
        let low_first = [
            effect(Metric::ServiceRooms, EffectKind::Set, 3.0, 1),
            effect(Metric::ServiceRooms, EffectKind::Set, 7.0, 5),
        ];
        assert!(close(fold(Metric::ServiceRooms, 2.0, &high_first), 7.0));
        assert!(close(fold(Metric::ServiceRooms, 2.0, &low_first), 7.0));
    }

    #[test]
    fn set_ties_keep_insertion_order() {
        let effects = [
            effect(Metric::ServiceRooms, EffectKind::Set, 4.0, 2),
            effect(Metric::ServiceRooms, EffectKind::Set, 9.0, 2),
        ];
        assert!(close(fold(Metric::ServiceRooms, 2.0, &effects), 4.0));
    }

    #[test]
    fn set_discards_earlier_steps() {
        let effects = [
            effect(Metric::ServiceRooms, EffectKind::Add, 10.0, 0),
            effect(Metric::ServiceRooms, EffectKind::Multiply, 3.0, 0),
            effect(Metric::ServiceRooms, EffectKind::Set, 4.0, 0),
        ];
        assert!(close(fold(Metric::ServiceRooms, 2.0, &effects), 4.0));
    }

    #[test]
    fn recorder_sees_base_and_each_effect() {
        let effects = [
            effect(Metric::SpawnRatePercent, EffectKind::Add, 2.0, 0),
            effect(Metric::SpawnRatePercent, EffectKind::Percent, 25.0, 0),
            effect(Metric::SpawnRatePercent, EffectKind::Percent, 25.0, 0),
        ];
        let refs: Vec<&Effect> = effects.iter().collect();
        let mut steps = Vec::new();
        let value = compose(
            Metric::SpawnRatePercent,
            10.0,
            &refs,
            &MetricConstraint::UNBOUNDED,
            |step, _| steps.push(step),
        );

        assert_eq!(steps.len(), 4);
        assert_eq!(steps.first().map(|s| s.label.as_str()), Some(BASE_STEP_LABEL));
        assert!(close(steps.get(2).map_or(0.0, |s| s.value_after), 15.0));
        assert!(close(steps.last().map_or(0.0, |s| s.value_after), value));
        assert!(close(value, 18.0));
    }

    #[test]
    fn constraint_step_only_when_clamped() {
        let effects = [effect(Metric::HappyProbability, EffectKind::Add, 0.9, 0)];
        let refs: Vec<&Effect> = effects.iter().collect();
        let bounds = MetricConstraint::between(0.0, 1.0);

        let mut labels = Vec::new();
        let value = compose(Metric::HappyProbability, 0.5, &refs, &bounds, |s, _| {
            labels.push(s.label);
        });
        assert!(close(value, 1.0));
        assert_eq!(labels.last().map(String::as_str), Some(CONSTRAINT_STEP_LABEL));

        let mut labels = Vec::new();
        let _ = compose(Metric::HappyProbability, 0.05, &refs, &bounds, |s, _| {
            labels.push(s.label);
        });
        assert!(!labels.iter().any(|l| l == CONSTRAINT_STEP_LABEL));
    }
}

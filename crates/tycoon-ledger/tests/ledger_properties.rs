//! Integration tests for the modifier ledger.
//!
//! Exercises the public API the way the simulation loop does: producers
//! record effects, the loop sweeps with the game clock, mechanics ask for
//! effective values. Covers composition order, expiry boundaries, source
//! removal, and change notifications.

#![allow(clippy::unwrap_used)]

use tokio::sync::broadcast::error::TryRecvError;
use tycoon_ledger::{
    ConstraintTable, EffectBuilder, LedgerChange, MetricConstraint, ModifierLedger,
};
use tycoon_types::{Effect, EffectId, EffectKind, EffectSource, Metric, SourceCategory, SourceId};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn upgrade(id: &str) -> EffectSource {
    EffectSource::new(SourceCategory::Upgrade, id, id)
}

fn record(ledger: &mut ModifierLedger, builder: EffectBuilder) -> EffectId {
    ledger.record(builder).unwrap()
}

#[test]
fn full_composition_order() {
    let mut ledger = ModifierLedger::with_constraints(ConstraintTable::unbounded());
    let metric = Metric::ServiceRevenueMultiplier;

    // Inserted out of composition order on purpose.
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("m"), metric, EffectKind::Multiply).value(2.0),
    );
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("p"), metric, EffectKind::Percent).value(10.0),
    );
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("a"), metric, EffectKind::Add).value(1.0),
    );

    // (1 + 1) * 1.1 * 2
    assert!(close(ledger.calculate(metric, 1.0), 4.4));

    record(
        &mut ledger,
        EffectBuilder::new(upgrade("s"), metric, EffectKind::Set).value(3.0),
    );
    assert!(close(ledger.calculate(metric, 1.0), 3.0));
}

#[test]
fn set_priority_beats_insertion_order() {
    let mut ledger = ModifierLedger::new();
    let metric = Metric::ConversionRate;

    record(
        &mut ledger,
        EffectBuilder::new(upgrade("high"), metric, EffectKind::Set)
            .value(0.9)
            .priority(5),
    );
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("low"), metric, EffectKind::Set)
            .value(0.2)
            .priority(1),
    );

    assert!(close(ledger.calculate(metric, 0.5), 0.9));
}

#[test]
fn set_value_is_still_constrained() {
    let mut ledger = ModifierLedger::new();
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("s"), Metric::HappyProbability, EffectKind::Set).value(1.7),
    );
    assert!(close(ledger.calculate(Metric::HappyProbability, 0.5), 1.0));
}

#[test]
fn constraint_bounds_hold_for_every_metric() {
    let mut ledger = ModifierLedger::new();
    for metric in Metric::ALL {
        record(
            &mut ledger,
            EffectBuilder::new(upgrade("huge"), metric, EffectKind::Add).value(-1_000.0),
        );
    }

    let table = ConstraintTable::standard();
    for metric in Metric::ALL {
        let value = ledger.calculate(metric, 1.0);
        let MetricConstraint { min, max, .. } = table.get(metric);
        assert!(min.is_none_or(|m| value >= m), "{metric} below min: {value}");
        assert!(max.is_none_or(|m| value <= m), "{metric} above max: {value}");
    }
}

#[test]
fn expiry_window_is_half_open() {
    let mut ledger = ModifierLedger::new();
    let metric = Metric::SpawnRatePercent;
    let id = record(
        &mut ledger,
        EffectBuilder::new(upgrade("flash"), metric, EffectKind::Add)
            .value(5.0)
            .created_at(10.0)
            .duration_seconds(20.0),
    );

    for t in [10.0, 15.0, 29.999] {
        assert!(ledger.tick(t).is_empty(), "expired early at {t}");
        assert!(close(ledger.calculate(metric, 10.0), 15.0));
    }

    assert_eq!(ledger.tick(30.0), vec![id]);
    assert!(close(ledger.calculate(metric, 10.0), 10.0));
    assert!(ledger.get(id).is_none());
}

#[test]
fn permanent_effects_survive_any_sweep() {
    let mut ledger = ModifierLedger::new();
    let id = record(
        &mut ledger,
        EffectBuilder::new(upgrade("forever"), Metric::ServiceRooms, EffectKind::Add).value(1.0),
    );

    assert!(ledger.tick(1.0e12).is_empty());
    assert!(ledger.get(id).is_some());
    assert!(ledger.remaining_seconds(id).is_none());
}

#[test]
fn removing_a_source_restores_base() {
    let mut ledger = ModifierLedger::new();
    let campaign = EffectSource::new(SourceCategory::Marketing, "radio", "Radio ad");
    let metric = Metric::SpawnRatePercent;

    record(
        &mut ledger,
        EffectBuilder::new(campaign.clone(), metric, EffectKind::Percent).value(40.0),
    );
    record(
        &mut ledger,
        EffectBuilder::new(campaign, metric, EffectKind::Add).value(3.0),
    );
    assert!(close(ledger.calculate(metric, 10.0), 18.2));

    let removed = ledger.remove_by_source(SourceCategory::Marketing, &SourceId::from("radio"));
    assert_eq!(removed, 2);
    assert!(close(ledger.calculate(metric, 10.0), 10.0));
}

#[test]
fn effects_from_and_for_filter_correctly() {
    let mut ledger = ModifierLedger::new();
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("a"), Metric::ServiceRooms, EffectKind::Add).value(1.0),
    );
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("a"), Metric::ConversionRate, EffectKind::Add).value(0.1),
    );
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("b"), Metric::ServiceRooms, EffectKind::Add).value(1.0),
    );

    assert_eq!(ledger.effects_for(Metric::ServiceRooms).len(), 2);
    assert_eq!(
        ledger
            .effects_from(SourceCategory::Upgrade, &SourceId::from("a"))
            .len(),
        2
    );
    assert_eq!(ledger.effects().len(), 3);
}

#[test]
fn one_notification_per_sweep() {
    let mut ledger = ModifierLedger::new();
    for _ in 0..3 {
        record(
            &mut ledger,
            EffectBuilder::new(upgrade("burst"), Metric::ServiceRooms, EffectKind::Add)
                .value(1.0)
                .created_at(0.0)
                .duration_seconds(5.0),
        );
    }

    let mut rx = ledger.subscribe();
    let expired = ledger.tick(5.0);
    assert_eq!(expired.len(), 3);

    assert_eq!(
        rx.try_recv().ok(),
        Some(LedgerChange::Expired { ids: expired })
    );
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn no_notification_for_noop_mutations() {
    let mut ledger = ModifierLedger::new();
    let mut rx = ledger.subscribe();

    assert!(!ledger.remove(EffectId::new()));
    assert_eq!(ledger.clear_category(SourceCategory::Event), 0);
    assert_eq!(
        ledger.remove_by_source(SourceCategory::Staff, &SourceId::from("nobody")),
        0
    );
    assert!(ledger.tick(100.0).is_empty());
    assert_eq!(ledger.clear_all(), 0);

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[test]
fn detailed_breakdown_serializes_for_display() {
    let mut ledger = ModifierLedger::new();
    record(
        &mut ledger,
        EffectBuilder::new(upgrade("espresso"), Metric::ServiceSpeedMultiplier, EffectKind::Multiply)
            .value(1.2),
    );

    let breakdown = ledger.calculate_detailed(Metric::ServiceSpeedMultiplier, 1.0);
    let json = serde_json::to_value(&breakdown).unwrap();

    assert_eq!(json["metric"], "serviceSpeedMultiplier");
    assert_eq!(json["steps"].as_array().unwrap().len(), 2);
    assert_eq!(json["steps"][1]["label"], "espresso");
}

#[test]
fn unvalidated_nan_effect_keeps_probability_in_range() {
    let mut ledger = ModifierLedger::new();
    let metric = Metric::HappyProbability;
    ledger.add(Effect {
        id: EffectId::new(),
        source: upgrade("broken"),
        metric,
        kind: EffectKind::Multiply,
        value: f64::NAN,
        priority: 0,
        duration_seconds: None,
        created_at: 0.0,
    });

    let value = ledger.calculate(metric, 0.5);
    assert!((0.0..=1.0).contains(&value), "value {value}");
    assert!(close(value, 0.5));

    let detailed = ledger.calculate_detailed(metric, 0.5);
    assert!(close(detailed.final_value, value));
}

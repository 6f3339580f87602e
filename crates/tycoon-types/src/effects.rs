//! Effect records held by the modifier ledger.
//!
//! An [`Effect`] is immutable once created: the ledger inserts and removes
//! effects but never edits one in place. Producers keep the [`EffectId`]
//! or their `(category, source_id)` pair to remove what they added.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EffectKind, Metric, SourceCategory};
use crate::ids::{EffectId, SourceId};

/// The producer of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct EffectSource {
    /// Producer family.
    pub category: SourceCategory,
    /// Producer key within the family.
    pub source_id: SourceId,
    /// Label shown in the effect breakdown.
    pub display_name: String,
}

impl EffectSource {
    /// Build a source record.
    pub fn new(
        category: SourceCategory,
        source_id: impl Into<SourceId>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            category,
            source_id: source_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Whether this source matches a `(category, source_id)` pair.
    pub fn matches(&self, category: SourceCategory, source_id: &SourceId) -> bool {
        self.category == category && &self.source_id == source_id
    }
}

/// One numeric modifier contributed by a single source toward one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Unique identifier within the ledger.
    pub id: EffectId,
    /// Producer of the effect.
    pub source: EffectSource,
    /// The metric being modified.
    pub metric: Metric,
    /// How the value combines with the metric.
    pub kind: EffectKind,
    /// The modifier value (points for `Percent`, a factor for `Multiply`).
    pub value: f64,
    /// Ordering key for `Multiply` and `Set` effects. Higher wins.
    #[serde(default)]
    pub priority: i32,
    /// Lifetime in game seconds. `None` means permanent.
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Game time (seconds) at which the effect was created.
    pub created_at: f64,
}

impl Effect {
    /// Absolute game time at which the effect stops contributing.
    ///
    /// Returns `None` for permanent effects and for non-finite durations.
    pub fn expires_at(&self) -> Option<f64> {
        self.duration_seconds
            .filter(|d| d.is_finite())
            .map(|d| self.created_at + d)
    }

    /// Whether the effect has run its course at game time `now`.
    ///
    /// The expiry boundary is inclusive: an effect created at `t0` with
    /// duration `d` is expired for every `now >= t0 + d`.
    pub fn is_expired_at(&self, now: f64) -> bool {
        self.expires_at().is_some_and(|end| end <= now)
    }

    /// Seconds left before expiry, clamped at zero. `None` when permanent.
    pub fn remaining_seconds(&self, now: f64) -> Option<f64> {
        self.expires_at().map(|end| (end - now).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(duration_seconds: Option<f64>) -> Effect {
        Effect {
            id: EffectId::new(),
            source: EffectSource::new(SourceCategory::Marketing, "flyers", "Flyer campaign"),
            metric: Metric::SpawnRatePercent,
            kind: EffectKind::Percent,
            value: 25.0,
            priority: 0,
            duration_seconds,
            created_at: 100.0,
        }
    }

    #[test]
    fn permanent_effect_never_expires() {
        let e = effect(None);
        assert_eq!(e.expires_at(), None);
        assert!(!e.is_expired_at(f64::MAX));
        assert_eq!(e.remaining_seconds(1_000.0), None);
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let e = effect(Some(30.0));
        assert!(!e.is_expired_at(129.9));
        assert!(e.is_expired_at(130.0));
        assert!(e.is_expired_at(500.0));
    }

    #[test]
    fn infinite_duration_is_permanent() {
        let e = effect(Some(f64::INFINITY));
        assert_eq!(e.expires_at(), None);
        assert!(!e.is_expired_at(1e12));
    }

    #[test]
    fn source_matching_requires_both_fields() {
        let source = EffectSource::new(SourceCategory::Upgrade, "coffee", "Coffee machine");
        assert!(source.matches(SourceCategory::Upgrade, &SourceId::from("coffee")));
        assert!(!source.matches(SourceCategory::Staff, &SourceId::from("coffee")));
        assert!(!source.matches(SourceCategory::Upgrade, &SourceId::from("tea")));
    }

    #[test]
    fn effect_wire_format_defaults_optional_fields() {
        let json = r#"{
            "id": "0191f2d8-8f5e-7c3a-9b1e-2a4c6d8e0f12",
            "source": {"category": "staff", "sourceId": "assistant", "displayName": "Assistant"},
            "metric": "serviceSpeedMultiplier",
            "kind": "Multiply",
            "value": 1.2,
            "createdAt": 0.0
        }"#;
        let parsed: Result<Effect, _> = serde_json::from_str(json);
        assert!(parsed.is_ok());
        let parsed = parsed.ok();
        assert_eq!(parsed.as_ref().map(|e| e.priority), Some(0));
        assert_eq!(parsed.and_then(|e| e.duration_seconds), None);
    }
}

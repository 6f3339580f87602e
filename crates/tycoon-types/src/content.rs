//! Authored event content: events, choices, consequences.
//!
//! These records arrive from the content console already validated and are
//! treated as read-only input by the event engine. Weights and durations
//! are still read defensively because authoring mistakes must never halt a
//! running session.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EffectKind, EventCategory, Metric};
use crate::ids::{ChoiceId, ConsequenceId, DelayedConsequenceId, EventId, FlagId};
use crate::requirements::Requirement;

/// An effect applied once, at the moment its consequence resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventEffect {
    /// Cash delta. Positive amounts are booked as revenue, negative as expense.
    Cash {
        /// Signed amount.
        #[ts(as = "String")]
        amount: Decimal,
    },
    /// Experience delta.
    Experience {
        /// Signed amount.
        amount: i64,
    },
    /// Founder time delta, in seconds.
    Time {
        /// Signed seconds.
        seconds: f64,
    },
    /// A permanent metric modifier registered in the ledger.
    Metric {
        /// Metric to modify.
        metric: Metric,
        /// How the value combines.
        kind: EffectKind,
        /// Modifier value.
        value: f64,
        /// Ordering key for `Multiply` and `Set`.
        #[serde(default)]
        priority: i32,
    },
    /// Set or clear a story flag.
    Flag {
        /// Flag to write.
        id: FlagId,
        /// New flag value.
        #[serde(default = "default_flag_value")]
        value: bool,
    },
}

const fn default_flag_value() -> bool {
    true
}

/// A metric modifier that lapses after a fixed number of game seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct TemporaryEffect {
    /// Metric to modify.
    pub metric: Metric,
    /// How the value combines.
    pub kind: EffectKind,
    /// Modifier value.
    pub value: f64,
    /// Ordering key for `Multiply` and `Set`.
    #[serde(default)]
    pub priority: i32,
    /// Lifetime in game seconds.
    pub duration_seconds: f64,
}

/// An outcome that resolves some time after its choice, branching on a
/// requirement check made at fire time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct DelayedConsequence {
    /// Authored key.
    pub id: DelayedConsequenceId,
    /// Game seconds between resolution of the choice and firing.
    pub delay_seconds: f64,
    /// Gate evaluated at fire time. Empty means the outcome always succeeds.
    #[serde(default)]
    pub success_requirements: Vec<Requirement>,
    /// Effects applied when the gate holds.
    #[serde(default)]
    pub success_effects: Vec<EventEffect>,
    /// Effects applied when the gate fails. `None` applies nothing.
    #[serde(default)]
    pub failure_effects: Option<Vec<EventEffect>>,
    /// Text shown while the outcome is pending.
    #[serde(default)]
    pub label: Option<String>,
    /// Text shown when the outcome succeeds.
    #[serde(default)]
    pub success_label: Option<String>,
    /// Text shown when the outcome fails.
    #[serde(default)]
    pub failure_label: Option<String>,
}

/// One weighted outcome of a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Consequence {
    /// Authored key.
    pub id: ConsequenceId,
    /// Relative selection weight. Negative weights count as zero.
    pub weight: f64,
    /// Text shown when this outcome is drawn.
    #[serde(default)]
    pub description: Option<String>,
    /// Effects applied immediately.
    #[serde(default)]
    pub effects: Vec<EventEffect>,
    /// Metric modifiers that lapse after their duration.
    #[serde(default)]
    pub temporary_effects: Vec<TemporaryEffect>,
    /// Outcome resolved after a delay.
    #[serde(default)]
    pub delayed_consequence: Option<DelayedConsequence>,
}

/// A player option within an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// Authored key.
    pub id: ChoiceId,
    /// Button text.
    pub label: String,
    /// Upfront cash cost, charged before the outcome is drawn.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub cost: Option<Decimal>,
    /// Upfront founder time cost in seconds.
    #[serde(default)]
    pub time_cost: Option<f64>,
    /// Flag set to `true` when this choice is taken.
    #[serde(default)]
    pub sets_flag: Option<FlagId>,
    /// Weighted outcomes.
    #[serde(default)]
    pub consequences: Vec<Consequence>,
}

impl Choice {
    /// Whether the founder time cost fits within `available_time`.
    ///
    /// Only a cost of zero or less is free. An infinite cost never fits,
    /// and a NaN cost is unpayable authored data.
    pub fn time_affordable(&self, available_time: f64) -> bool {
        self.time_cost.is_none_or(|cost| {
            if cost.is_nan() {
                false
            } else {
                cost <= 0.0 || (cost.is_finite() && cost <= available_time)
            }
        })
    }
}

/// A narrative event offered to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    /// Authored key.
    pub id: EventId,
    /// Headline.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub summary: Option<String>,
    /// Presentation category.
    pub category: EventCategory,
    /// Gate deciding whether the event may be offered.
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    /// Whether the event is retired after its first resolution.
    #[serde(default)]
    pub once: bool,
    /// Player options, in display order.
    pub choices: Vec<Choice>,
}

impl GameEvent {
    /// Look up a choice by key.
    pub fn choice(&self, id: &ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| &c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPLIER_STRIKE: &str = r#"{
        "id": "supplier_strike",
        "title": "Supplier strike",
        "category": "risk",
        "requirements": [{"type": "metric", "id": "gameTime", "operator": ">", "value": 60}],
        "choices": [
            {
                "id": "pay_premium",
                "label": "Pay the premium",
                "cost": 250,
                "consequences": [
                    {"id": "smooth", "weight": 1, "effects": [{"type": "experience", "amount": 5}]}
                ]
            },
            {
                "id": "wait_it_out",
                "label": "Wait it out",
                "timeCost": 3600,
                "consequences": [
                    {
                        "id": "slowdown",
                        "weight": 70,
                        "temporaryEffects": [
                            {"metric": "serviceSpeedMultiplier", "kind": "Multiply", "value": 0.8, "durationSeconds": 120}
                        ]
                    },
                    {
                        "id": "nothing",
                        "weight": 30,
                        "delayedConsequence": {
                            "id": "supplier_returns",
                            "delaySeconds": 300,
                            "successEffects": [{"type": "cash", "amount": -40.5}]
                        }
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn event_content_parses() {
        let event: Result<GameEvent, _> = serde_json::from_str(SUPPLIER_STRIKE);
        assert!(event.is_ok(), "{event:?}");
        let Ok(event) = event else { return };

        assert_eq!(event.category, EventCategory::Risk);
        assert_eq!(event.choices.len(), 2);
        assert!(!event.once);

        let pay = event.choice(&ChoiceId::from("pay_premium"));
        assert_eq!(pay.and_then(|c| c.cost), Some(Decimal::new(250, 0)));

        let wait = event.choice(&ChoiceId::from("wait_it_out"));
        let delayed = wait
            .and_then(|c| c.consequences.get(1))
            .and_then(|c| c.delayed_consequence.as_ref());
        assert_eq!(
            delayed.map(|d| d.success_effects.clone()),
            Some(vec![EventEffect::Cash {
                amount: Decimal::new(-405, 1)
            }])
        );
        assert_eq!(delayed.and_then(|d| d.failure_effects.clone()), None);
    }

    #[test]
    fn time_affordability() {
        let mut choice = Choice {
            id: ChoiceId::from("c"),
            label: "C".to_owned(),
            cost: None,
            time_cost: None,
            sets_flag: None,
            consequences: Vec::new(),
        };
        assert!(choice.time_affordable(0.0));

        choice.time_cost = Some(3600.0);
        assert!(!choice.time_affordable(1800.0));
        assert!(choice.time_affordable(3600.0));

        choice.time_cost = Some(-5.0);
        assert!(choice.time_affordable(0.0));
    }

    #[test]
    fn infinite_or_nan_time_cost_never_fits() {
        let mut choice = Choice {
            id: ChoiceId::from("c"),
            label: "C".to_owned(),
            cost: None,
            time_cost: Some(f64::INFINITY),
            sets_flag: None,
            consequences: Vec::new(),
        };
        assert!(!choice.time_affordable(1_000_000.0));
        assert!(!choice.time_affordable(f64::INFINITY));

        choice.time_cost = Some(f64::NAN);
        assert!(!choice.time_affordable(1_000_000.0));
    }
}

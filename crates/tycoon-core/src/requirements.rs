//! Requirement and condition evaluation.
//!
//! Pure and synchronous: evaluation reads a [`StateSnapshot`] and nothing
//! else, never mutates it, and never looks at wall-clock time. It runs for
//! every candidate event on every tick, so results must never be cached
//! across snapshots.
//!
//! Authoring mistakes (unknown requirement types, unknown observables, a
//! numeric requirement without operator or value, a dangling named
//! condition) are logged and evaluate to `false`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;
use tycoon_types::{ComparisonOperator, Observable, Requirement};

use crate::state::StateSnapshot;

/// Evaluate one requirement against `state`.
pub fn evaluate<S>(requirement: &Requirement, state: &S) -> bool
where
    S: StateSnapshot + ?Sized,
{
    match requirement {
        Requirement::Flag { id, expected } => state.flag(id) == *expected,

        Requirement::Condition { id, expected } => {
            let Some(condition) = state.named_condition(id) else {
                warn!(condition = id.as_str(), "Unknown named condition; requirement unmet");
                return false;
            };
            let Some(observed) = observe(condition.metric, state) else {
                return false;
            };
            condition.operator.holds(observed, condition.value) == *expected
        }

        Requirement::Metric {
            id,
            operator,
            value,
            expected,
        } => {
            let (Some(operator), Some(target)) = (operator, value) else {
                warn!(observable = ?id, "Metric requirement without operator or value");
                return false;
            };
            // An unobservable quantity stays unmet whatever `expected` says.
            observe(*id, state)
                .is_some_and(|observed| operator.holds(observed, *target) == *expected)
        }

        Requirement::Upgrade {
            id,
            operator,
            value,
            expected,
        } => compare_count(
            "upgrade",
            id.as_str(),
            state.upgrade_level(id),
            *operator,
            *value,
            *expected,
        ),

        Requirement::Staff {
            id,
            operator,
            value,
            expected,
        } => compare_count(
            "staff",
            id.as_str(),
            state.staff_count(id),
            *operator,
            *value,
            *expected,
        ),

        Requirement::Unknown => {
            warn!("Unknown requirement type; requirement unmet");
            false
        }
    }
}

/// AND-fold over `requirements`. An empty list holds vacuously.
pub fn evaluate_all<S>(requirements: &[Requirement], state: &S) -> bool
where
    S: StateSnapshot + ?Sized,
{
    requirements.iter().all(|r| evaluate(r, state))
}

/// Read a numeric observable from the snapshot.
///
/// Returns `None` (after logging) for observables this build does not
/// recognize.
pub fn observe<S>(observable: Observable, state: &S) -> Option<f64>
where
    S: StateSnapshot + ?Sized,
{
    match observable {
        Observable::Cash => state.cash().to_f64(),
        Observable::Experience => Decimal::from(state.experience()).to_f64(),
        Observable::Level => Some(f64::from(state.level())),
        Observable::TotalExpenses => state.total_expenses().to_f64(),
        Observable::TotalRevenue => state.total_revenue().to_f64(),
        Observable::GameTime => Some(state.game_time()),
        Observable::AvailableTime => Some(state.available_time()),
        Observable::Unknown => {
            warn!("Unknown observable; requirement unmet");
            None
        }
    }
}

/// Shared rule for upgrade and staff requirements.
///
/// With both `operator` and `value` the count is compared; with neither,
/// "at least one" is compared against `expected`. Half a comparison is an
/// authoring error.
fn compare_count(
    kind: &'static str,
    id: &str,
    count: u32,
    operator: Option<ComparisonOperator>,
    value: Option<f64>,
    expected: bool,
) -> bool {
    match (operator, value) {
        (Some(operator), Some(target)) => operator.holds(f64::from(count), target),
        (None, None) => (count > 0) == expected,
        _ => {
            warn!(kind, id, "Count requirement with operator but no value (or vice versa)");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use tycoon_types::{ConditionId, NamedCondition, StaffRoleId, UpgradeId};

    use super::*;
    use crate::state::{GameState, SimulationState};

    fn state() -> GameState {
        let mut state = GameState::default();
        state.cash = Decimal::new(2_500, 0);
        state.experience = 300;
        state.game_time = 120.0;
        state
    }

    #[test]
    fn flag_defaults_to_false() {
        let mut s = state();
        assert!(!evaluate(&Requirement::flag("opened"), &s));
        assert!(evaluate(&Requirement::not_flag("opened"), &s));

        s.set_flag("opened".into(), true);
        assert!(evaluate(&Requirement::flag("opened"), &s));
        assert!(!evaluate(&Requirement::not_flag("opened"), &s));
    }

    #[test]
    fn metric_comparisons() {
        let s = state();
        let cases = [
            (Observable::Cash, ComparisonOperator::GreaterOrEqual, 2_500.0, true),
            (Observable::Cash, ComparisonOperator::GreaterThan, 2_500.0, false),
            (Observable::Experience, ComparisonOperator::Equal, 300.0, true),
            (Observable::Level, ComparisonOperator::Equal, 3.0, true),
            (Observable::GameTime, ComparisonOperator::LessThan, 60.0, false),
            (Observable::TotalExpenses, ComparisonOperator::LessOrEqual, 0.0, true),
        ];
        for (observable, op, target, want) in cases {
            let req = Requirement::metric(observable, op, target);
            assert_eq!(evaluate(&req, &s), want, "{observable:?} {} {target}", op.symbol());
        }
    }

    #[test]
    fn incomplete_metric_requirement_fails_closed() {
        let req = Requirement::Metric {
            id: Observable::Cash,
            operator: Some(ComparisonOperator::GreaterThan),
            value: None,
            expected: true,
        };
        assert!(!evaluate(&req, &state()));
    }

    #[test]
    fn metric_requirement_honours_expected() {
        let s = state();
        let below = |target: f64| Requirement::Metric {
            id: Observable::GameTime,
            operator: Some(ComparisonOperator::GreaterOrEqual),
            value: Some(target),
            expected: false,
        };
        assert!(evaluate(&below(1_000_000.0), &s));
        assert!(!evaluate(&below(0.0), &s));

        let unobservable = Requirement::Metric {
            id: Observable::Unknown,
            operator: Some(ComparisonOperator::GreaterOrEqual),
            value: Some(0.0),
            expected: false,
        };
        assert!(!evaluate(&unobservable, &s));
    }

    #[test]
    fn unknown_requirement_and_observable_fail_closed() {
        let s = state();
        assert!(!evaluate(&Requirement::Unknown, &s));
        let req = Requirement::metric(Observable::Unknown, ComparisonOperator::GreaterOrEqual, 0.0);
        assert!(!evaluate(&req, &s));
    }

    #[test]
    fn named_condition_is_resolved_through_state() {
        let mut s = state();
        s.define_condition(NamedCondition {
            id: ConditionId::from("well_off"),
            metric: Observable::Cash,
            operator: ComparisonOperator::GreaterThan,
            value: 1_000.0,
        });

        assert!(evaluate(&Requirement::condition("well_off"), &s));
        let negated = Requirement::Condition {
            id: ConditionId::from("well_off"),
            expected: false,
        };
        assert!(!evaluate(&negated, &s));
        assert!(!evaluate(&Requirement::condition("missing"), &s));
    }

    #[test]
    fn upgrade_and_staff_counts() {
        let mut s = state();
        s.set_upgrade_level(UpgradeId::from("oven"), 2);
        s.set_staff_count(StaffRoleId::from("barista"), 1);

        let owns_oven = Requirement::Upgrade {
            id: UpgradeId::from("oven"),
            operator: None,
            value: None,
            expected: true,
        };
        let oven_level_three = Requirement::Upgrade {
            id: UpgradeId::from("oven"),
            operator: Some(ComparisonOperator::GreaterOrEqual),
            value: Some(3.0),
            expected: true,
        };
        let no_chef = Requirement::Staff {
            id: StaffRoleId::from("chef"),
            operator: None,
            value: None,
            expected: false,
        };
        let one_barista = Requirement::Staff {
            id: StaffRoleId::from("barista"),
            operator: Some(ComparisonOperator::Equal),
            value: Some(1.0),
            expected: true,
        };

        assert!(evaluate(&owns_oven, &s));
        assert!(!evaluate(&oven_level_three, &s));
        assert!(evaluate(&no_chef, &s));
        assert!(evaluate(&one_barista, &s));
    }

    #[test]
    fn evaluate_all_is_an_and_fold() {
        let s = state();
        let yes = Requirement::metric(Observable::Cash, ComparisonOperator::GreaterThan, 0.0);
        let no = Requirement::flag("never");

        assert!(evaluate_all(&[], &s));
        assert!(evaluate_all(&[yes.clone()], &s));
        assert!(!evaluate_all(&[yes.clone(), no.clone()], &s));
        assert!(!evaluate_all(&[no, yes], &s));
    }

    #[test]
    fn evaluation_does_not_mutate_state() {
        let s = state();
        let before = s.clone();
        let reqs = [
            Requirement::flag("x"),
            Requirement::metric(Observable::Level, ComparisonOperator::GreaterThan, 1.0),
        ];
        let _ = evaluate_all(&reqs, &s);
        assert_eq!(s, before);
    }
}

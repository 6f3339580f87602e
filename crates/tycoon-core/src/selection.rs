//! Weighted consequence selection and default choice picking.

use tracing::warn;
use tycoon_types::{Choice, Consequence, GameEvent};

use crate::random::RandomSource;

/// A drawn consequence and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    /// Position of the consequence in the choice's list.
    pub index: usize,
    /// The drawn consequence.
    pub consequence: &'a Consequence,
    /// Whether the draw fell back to the first consequence because no
    /// usable weight was authored.
    pub fallback: bool,
}

/// Weight used for selection: negative and non-finite weights count as 0.
fn effective_weight(consequence: &Consequence) -> f64 {
    if consequence.weight.is_finite() {
        consequence.weight.max(0.0)
    } else {
        0.0
    }
}

/// Draw one consequence with probability proportional to its weight.
///
/// `roll = uniform(0, total)`; the first consequence with positive weight
/// whose cumulative weight reaches the roll is chosen. When the total is
/// not positive, the first consequence is returned with `fallback` set.
/// Returns `None` only for an empty list.
pub fn select_consequence<'a, R>(
    consequences: &'a [Consequence],
    rng: &mut R,
) -> Option<Selection<'a>>
where
    R: RandomSource + ?Sized,
{
    let first = consequences.first()?;
    let total: f64 = consequences.iter().map(effective_weight).sum();

    if total <= 0.0 || !total.is_finite() {
        warn!(
            consequence = first.id.as_str(),
            count = consequences.len(),
            "No positive consequence weight; falling back to first consequence"
        );
        return Some(Selection {
            index: 0,
            consequence: first,
            fallback: true,
        });
    }

    let roll = rng.next_unit() * total;
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, consequence) in consequences.iter().enumerate() {
        let weight = effective_weight(consequence);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = index;
        if cumulative >= roll {
            return Some(Selection {
                index,
                consequence,
                fallback: false,
            });
        }
    }

    // Rounding left the roll a hair above the final cumulative sum.
    consequences.get(last_positive).map(|consequence| Selection {
        index: last_positive,
        consequence,
        fallback: false,
    })
}

/// The choice an auto-select collaborator may take on the player's behalf.
///
/// The first choice whose founder time cost fits `available_time`. Cash
/// costs are ignored: going into deficit is an allowed outcome. `None`
/// when every choice needs more time than is available.
pub fn default_choice(event: &GameEvent, available_time: f64) -> Option<&Choice> {
    for choice in &event.choices {
        if choice.time_cost.is_some_and(f64::is_nan) {
            warn!(
                event = event.id.as_str(),
                choice = choice.id.as_str(),
                "NaN time cost; choice is never taken by default"
            );
        }
    }
    event
        .choices
        .iter()
        .find(|choice| choice.time_affordable(available_time))
}

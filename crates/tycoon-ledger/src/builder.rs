//! Effect builder and validation.
//!
//! Provides an [`EffectBuilder`] that rejects non-finite values and negative
//! durations before an [`Effect`] ever reaches the ledger, so the composition
//! fold never has to second-guess its inputs.

use tycoon_types::{Effect, EffectId, EffectKind, EffectSource, Metric};

use crate::LedgerError;

// ---------------------------------------------------------------------------
// Effect builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`Effect`] values.
///
/// The creation time is optional: when it is not set, the ledger stamps the
/// effect with its own current game time (see
/// [`ModifierLedger::record`](crate::ModifierLedger::record)).
///
/// # Examples
///
/// ```
/// use tycoon_ledger::EffectBuilder;
/// use tycoon_types::{EffectKind, EffectSource, Metric, SourceCategory};
///
/// let source = EffectSource::new(SourceCategory::Marketing, "flyers", "Flyers");
/// let effect = EffectBuilder::new(source, Metric::SpawnRatePercent, EffectKind::Percent)
///     .value(25.0)
///     .duration_seconds(120.0)
///     .build(0.0);
///
/// assert!(effect.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EffectBuilder {
    id: Option<EffectId>,
    source: EffectSource,
    metric: Metric,
    kind: EffectKind,
    value: Option<f64>,
    priority: i32,
    duration_seconds: Option<f64>,
    created_at: Option<f64>,
}

impl EffectBuilder {
    /// Start building an effect from `source` on `metric`.
    pub const fn new(source: EffectSource, metric: Metric, kind: EffectKind) -> Self {
        Self {
            id: None,
            source,
            metric,
            kind,
            value: None,
            priority: 0,
            duration_seconds: None,
            created_at: None,
        }
    }

    /// Use a caller-chosen identifier instead of a fresh one.
    #[must_use]
    pub const fn id(mut self, id: EffectId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the modifier value.
    #[must_use]
    pub const fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the ordering key for `Multiply` and `Set` effects.
    #[must_use]
    pub const fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Limit the effect's lifetime. Without this the effect is permanent.
    #[must_use]
    pub const fn duration_seconds(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Stamp an explicit creation time.
    #[must_use]
    pub const fn created_at(mut self, game_time: f64) -> Self {
        self.created_at = Some(game_time);
        self
    }

    /// Validate inputs and produce an [`Effect`].
    ///
    /// `default_time` is used when no explicit creation time was set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if no value was set,
    /// [`LedgerError::NonFiniteValue`] if the value is NaN or infinite,
    /// [`LedgerError::InvalidDuration`] if the duration is negative or NaN,
    /// and [`LedgerError::InvalidCreatedAt`] if the creation time is not
    /// finite.
    pub fn build(self, default_time: f64) -> Result<Effect, LedgerError> {
        let value = self.value.ok_or(LedgerError::MissingField("value"))?;
        if !value.is_finite() {
            return Err(LedgerError::NonFiniteValue { value });
        }

        if let Some(duration) = self.duration_seconds
            && (duration.is_nan() || duration < 0.0)
        {
            return Err(LedgerError::InvalidDuration { duration });
        }

        let created_at = self.created_at.unwrap_or(default_time);
        if !created_at.is_finite() {
            return Err(LedgerError::InvalidCreatedAt { created_at });
        }

        Ok(Effect {
            id: self.id.unwrap_or_default(),
            source: self.source,
            metric: self.metric,
            kind: self.kind,
            value,
            priority: self.priority,
            duration_seconds: self.duration_seconds,
            created_at,
        })
    }
}

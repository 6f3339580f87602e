//! Event catalog: authored events loaded from JSON and filtered for offer.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::Rng;
use tracing::{debug, info};
use tycoon_types::{EventId, GameEvent};

use crate::requirements::evaluate_all;
use crate::state::StateSnapshot;

/// Errors that can occur when loading the event catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read the content file from disk.
    #[error("failed to read event content: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse JSON content.
    #[error("failed to parse event content: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// Two events share an id.
    #[error("duplicate event id: {id}")]
    DuplicateId {
        /// The repeated id.
        id: EventId,
    },
}

/// All authored events available to a session, in authoring order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    events: Vec<GameEvent>,
}

impl EventCatalog {
    /// Build a catalog, rejecting duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] on the first repeated id.
    pub fn new(events: Vec<GameEvent>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for event in &events {
            if !seen.insert(&event.id) {
                return Err(CatalogError::DuplicateId {
                    id: event.id.clone(),
                });
            }
        }
        Ok(Self { events })
    }

    /// Parse a JSON array of events.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] for malformed content and
    /// [`CatalogError::DuplicateId`] for repeated ids.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let events: Vec<GameEvent> = serde_json::from_str(json)?;
        Self::new(events)
    }

    /// Load a JSON array of events from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise
    /// as [`EventCatalog::from_json`].
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        info!(
            path = %path.display(),
            events = catalog.len(),
            "Event catalog loaded"
        );
        Ok(catalog)
    }

    /// Number of events.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the catalog is empty.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Look up an event by id.
    pub fn get(&self, id: &EventId) -> Option<&GameEvent> {
        self.events.iter().find(|e| &e.id == id)
    }

    /// Events per category, for display.
    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            let entry = counts.entry(format!("{:?}", event.category)).or_insert(0_usize);
            *entry = entry.saturating_add(1);
        }
        counts
    }

    /// Events whose requirements hold for `state`, skipping retired
    /// one-shot events.
    pub fn eligible<'a, S>(&'a self, state: &S, retired: &BTreeSet<EventId>) -> Vec<&'a GameEvent>
    where
        S: StateSnapshot + ?Sized,
    {
        self.events
            .iter()
            .filter(|e| !(e.once && retired.contains(&e.id)))
            .filter(|e| evaluate_all(&e.requirements, state))
            .collect()
    }

    /// Pick one eligible event uniformly at random.
    pub fn pick<'a, S>(
        &'a self,
        state: &S,
        retired: &BTreeSet<EventId>,
        rng: &mut impl Rng,
    ) -> Option<&'a GameEvent>
    where
        S: StateSnapshot + ?Sized,
    {
        let eligible = self.eligible(state, retired);
        if eligible.is_empty() {
            debug!("No eligible events");
            return None;
        }
        let idx = rng.random_range(0..eligible.len());
        eligible.get(idx).copied()
    }
}

//! Error types for the Tycoon engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the session
//! loop so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tycoon_core::config::ConfigError,
    },

    /// Event content could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: tycoon_core::catalog::CatalogError,
    },

    /// The game clock rejected a time step.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: tycoon_core::clock::ClockError,
    },

    /// Event presentation or resolution was rejected.
    #[error("event error: {source}")]
    Event {
        /// The underlying event error.
        #[from]
        source: tycoon_core::events::EventError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}

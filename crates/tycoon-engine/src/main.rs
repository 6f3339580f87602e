//! Headless session runner for the Tycoon simulation.
//!
//! Wires the game session to real time: loads configuration and event
//! content, then ticks the session at a fixed real-time interval while the
//! director offers events and takes default choices when nobody answers.
//! Runs until the configured tick limit or Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tycoon-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Load the event catalog
//! 4. Create the game session and the event director
//! 5. Attach the ledger change log
//! 6. Run the tick loop
//! 7. Log the final state

mod director;
mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tycoon_core::catalog::EventCatalog;
use tycoon_core::config::{EngineConfig, LoggingConfig};
use tycoon_core::session::{GameSession, TickSummary};
use tycoon_core::state::StateSnapshot;
use tycoon_ledger::LedgerChange;
use tycoon_types::Metric;

use crate::director::{Director, DirectorAction};
use crate::error::EngineError;

/// Ticks between status lines.
const STATUS_EVERY_TICKS: u64 = 60;

/// Multiplier metrics reported in status lines, all with base 1.0.
const STATUS_METRICS: [Metric; 3] = [
    Metric::ServiceSpeedMultiplier,
    Metric::ServiceRevenueMultiplier,
    Metric::ReputationMultiplier,
];

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or a tick fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!("tycoon-engine starting");
    match &loaded_from {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        seed = config.session.seed,
        tick_interval_ms = config.session.tick_interval_ms,
        seconds_per_tick = config.session.seconds_per_tick,
        max_ticks = ?config.session.max_ticks,
        "Session settings"
    );

    // 3. Load the event catalog.
    let catalog = load_catalog(&config.events.content_path)
        .with_context(|| format!("loading {}", config.events.content_path.display()))?;
    for (category, count) in catalog.count_by_category() {
        debug!(category = %category, count, "Catalog category");
    }

    // 4. Create the session and the director.
    let mut session = GameSession::new(&config);
    let mut director = Director::new(&config.events, config.session.seed);
    info!(
        cash = %session.state().cash(),
        level = session.state().level(),
        first_offer_at = director.next_offer_at(),
        "Session created"
    );

    // 5. Attach the ledger change log.
    let change_log = tokio::spawn(log_ledger_changes(session.ledger().subscribe()));

    // 6. Run the tick loop.
    run(&config, &catalog, &mut session, &mut director).await?;

    // 7. Log the final state.
    let state = session.state();
    info!(
        ticks = session.tick(),
        game_time = state.game_time(),
        cash = %state.cash(),
        revenue = %state.total_revenue(),
        expenses = %state.total_expenses(),
        experience = state.experience(),
        level = state.level(),
        resolved_events = session.events().history().count(),
        "Session finished"
    );

    drop(session);
    if let Err(e) = change_log.await {
        warn!(error = %e, "Ledger change log task failed");
    }
    Ok(())
}

/// Tick the session until the tick limit or Ctrl-C.
///
/// The limit counts loop iterations rather than session ticks so a run
/// stalled on an unanswerable event still terminates.
async fn run(
    config: &EngineConfig,
    catalog: &EventCatalog,
    session: &mut GameSession,
    director: &mut Director,
) -> Result<(), EngineError> {
    // A zero period would make the interval panic.
    let tick_interval = Duration::from_millis(config.session.tick_interval_ms.max(1));
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut iterations: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Shutdown requested");
                break;
            }
        }

        let summary = session.advance(config.session.seconds_per_tick)?;
        log_tick(&summary);

        for outcome in session.take_resolved_outcomes() {
            info!(
                delayed = outcome.delayed_id.as_str(),
                event = outcome.event_id.as_str(),
                succeeded = outcome.succeeded,
                label = outcome.label.as_deref().unwrap_or(""),
                effects = outcome.effect_ids.len(),
                "Delayed consequence fired"
            );
        }

        for action in director.step(session, catalog, tick_interval)? {
            if let DirectorAction::Resolved(resolution) = action {
                debug!(
                    event = resolution.event_id.as_str(),
                    effects = resolution.effect_ids.len(),
                    scheduled = resolution.scheduled.as_ref().map(|d| d.as_str()),
                    fallback = resolution.fallback_used,
                    "Resolution applied"
                );
            }
        }

        if !summary.paused && summary.tick.is_multiple_of(STATUS_EVERY_TICKS) {
            log_status(session);
        }

        iterations = iterations.saturating_add(1);
        if config.session.max_ticks.is_some_and(|max| iterations >= max) {
            info!(iterations, "Tick limit reached");
            break;
        }
    }

    Ok(())
}

/// Load configuration from `tycoon-config.yaml`.
///
/// Environment overrides apply either way. Returns the path the
/// configuration was read from, or `None` when the file does not exist and
/// defaults were used.
fn load_config() -> Result<(EngineConfig, Option<PathBuf>), EngineError> {
    let config_path = Path::new("tycoon-config.yaml");
    if config_path.exists() {
        let config = EngineConfig::from_file(config_path)?;
        Ok((config, Some(config_path.to_path_buf())))
    } else {
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Load the event catalog. A missing file yields an empty catalog so a
/// session can run without authored content.
fn load_catalog(path: &Path) -> Result<EventCatalog, EngineError> {
    if path.exists() {
        Ok(EventCatalog::from_file(path)?)
    } else {
        warn!(path = %path.display(), "Event content not found, no events will be offered");
        Ok(EventCatalog::default())
    }
}

fn log_tick(summary: &TickSummary) {
    if summary.paused {
        return;
    }
    if !summary.expired_effects.is_empty() || !summary.expired_event_effects.is_empty() {
        info!(
            tick = summary.tick,
            game_time = summary.game_time,
            expired = summary.expired_effects.len(),
            expired_event_effects = summary.expired_event_effects.len(),
            "Effects expired"
        );
    }
}

fn log_status(session: &GameSession) {
    let state = session.state();
    info!(
        tick = session.tick(),
        game_time = state.game_time(),
        cash = %state.cash(),
        experience = state.experience(),
        level = state.level(),
        available_time = state.available_time(),
        effects = session.ledger().len(),
        phase = ?session.events().phase(),
        "Status"
    );

    for metric in STATUS_METRICS {
        let breakdown = session.breakdown(metric, 1.0);
        match serde_json::to_string(&breakdown) {
            Ok(json) => debug!(metric = metric.as_str(), breakdown = %json, "Metric breakdown"),
            Err(e) => warn!(metric = metric.as_str(), error = %e, "Failed to encode breakdown"),
        }
    }
}

/// Log every ledger mutation until the ledger is dropped.
async fn log_ledger_changes(mut changes: broadcast::Receiver<LedgerChange>) {
    loop {
        match changes.recv().await {
            Ok(change) => match serde_json::to_string(&change) {
                Ok(json) => debug!(change = %json, "Ledger change"),
                Err(e) => warn!(error = %e, "Failed to encode ledger change"),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Ledger change log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

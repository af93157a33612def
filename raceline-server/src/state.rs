//! Application state shared across all request handlers.

use raceline_core::cache::StateCache;
use raceline_core::events::NotificationBus;
use raceline_core::market::MarketEngine;
use raceline_core::telemetry::TelemetrySubmitter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub engine: MarketEngine,
    pub bus: NotificationBus,
    pub submitter: TelemetrySubmitter,
    /// Flipped once the startup catch-up has completed.
    ready: Arc<AtomicBool>,
    /// Flips to `true` when the server starts shutting down.
    pub shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        engine: MarketEngine,
        bus: NotificationBus,
        submitter: TelemetrySubmitter,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            engine,
            bus,
            submitter,
            ready: Arc::new(AtomicBool::new(false)),
            shutdown_rx,
        }
    }

    pub fn cache(&self) -> &StateCache {
        self.engine.cache()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }
}

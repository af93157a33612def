//! Signal handling for graceful shutdown and config reload.

use crate::config::ConfigLoader;
use raceline_core::config::{ConfigStore, SyncConfig};
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::Notify;

/// Creates a future that completes when a shutdown signal is received.
///
/// Listens for SIGTERM and SIGINT (Ctrl+C). A handler that cannot be
/// installed is logged and never fires.
pub async fn shutdown_signal() {
    let sigterm = wait_for(SignalKind::terminate(), "SIGTERM");
    let sigint = wait_for(SignalKind::interrupt(), "SIGINT");

    tokio::select! {
        _ = sigterm => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint => {
            tracing::info!("Received SIGINT, initiating graceful shutdown");
        }
    }
}

async fn wait_for(kind: SignalKind, name: &'static str) {
    match signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::error!(signal = name, error = %e, "Failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Spawns a task that listens for SIGHUP and reloads the configuration.
///
/// Only the `[sync]` section is applied at runtime; the listeners pick it up
/// through their config watchers. Returns a Notify that stops the task.
pub fn spawn_config_reload_handler(
    config_loader: Arc<ConfigLoader>,
    sync_config_store: ConfigStore<SyncConfig>,
) -> Arc<Notify> {
    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(sighup) => sighup,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to install SIGHUP handler, config reload disabled"
                );
                return;
            }
        };

        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    tracing::info!(
                        path = ?config_loader.config_path(),
                        "Received SIGHUP, reloading configuration"
                    );
                    match config_loader.reload() {
                        Ok(loaded_config) => {
                            sync_config_store.update(loaded_config.sync).await;
                            tracing::info!(
                                max_poll_interval = ?loaded_config.sync.max_poll_interval,
                                "Configuration reloaded successfully"
                            );
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                _ = shutdown_notify_clone.notified() => {
                    tracing::debug!("Config reload handler shutting down");
                    break;
                }
            }
        }
    });

    shutdown_notify
}

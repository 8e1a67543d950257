//! # Cross-platform OS signal handling for the host driver.
//!
//! Provides [`wait_for_shutdown_signal`] an async helper that completes when the
//! process receives a termination signal, and [`cancel_on_shutdown_signal`] which
//! turns that signal into a cancelled [`CancellationToken`] for [`CycleDriver`](crate::CycleDriver).
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! The driver stops between cycles, never inside one: a work unit that already
//! started always runs to completion.

use tokio_util::sync::CancellationToken;

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = sigterm.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Cancels `token` once a termination signal arrives, or as soon as the token is
/// cancelled by someone else.
///
/// Signal registration failures are logged and treated as "never signalled".
pub async fn cancel_on_shutdown_signal(token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {},
        res = wait_for_shutdown_signal() => {
            match res {
                Ok(()) => tracing::info!("shutdown signal received"),
                Err(error) => {
                    tracing::warn!(%error, "failed to register shutdown signal handler");
                    token.cancelled().await;
                }
            }
            token.cancel();
        }
    }
}

//! # media-relay
//!
//! HTTP gateway that turns a social-media post URL into a media download link.
//!
//! The relay does not scrape anything itself. For each request it:
//! 1. expands short share links (`vm.tiktok.com/...`),
//! 2. runs the platform's scraping task on a remote task runner, first with a
//!    synchronous run-and-fetch call and, if that is unavailable, by starting
//!    a run and polling it to completion,
//! 3. retries once with the tilde-joined task identifier if the first
//!    identifier fails,
//! 4. picks a download link out of the first record the task produced.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_relay::{Config, wait_for_signal};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     media_relay::api::start_api_server(Arc::new(config), wait_for_signal()).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media link extraction from task output
pub mod extract;
/// Short-link expansion
pub mod redirect;
/// Remote task runner client, poller and invoker
pub mod runner;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, PlatformConfig, PollConfig, RunnerConfig};
pub use error::{ApiError, Error, InvocationError, Result, ToHttpStatus};
pub use redirect::RedirectResolver;
pub use runner::{Invoke, RunPoller, RunnerClient, TaskInvoker};
pub use types::{Extraction, MediaResponse, ResultRecord, RunStatus, TaskId};

/// Resolves when the process is asked to stop.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

/// Resolves when the process is asked to stop (Ctrl+C).
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

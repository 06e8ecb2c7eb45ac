//! Application state for the API server

use crate::Config;
use crate::error::Result;
use crate::redirect::RedirectResolver;
use crate::runner::{Invoke, RunnerClient, TaskInvoker};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones). Nothing in here is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    /// Configuration, including the runner token
    pub config: Arc<Config>,

    /// Runs tasks on the remote runner
    pub invoker: Arc<dyn Invoke>,

    /// Expands short links before invocation
    pub resolver: Arc<RedirectResolver>,
}

impl AppState {
    /// Create the state with the standard invoker and resolver for `config`
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = RunnerClient::new(&config.runner)?;
        let invoker = Arc::new(TaskInvoker::new(client, &config.poll));
        let resolver = Arc::new(RedirectResolver::new(&config.redirect)?);

        Ok(Self::with_parts(config, invoker, resolver))
    }

    /// Create the state from already-built collaborators
    pub fn with_parts(
        config: Arc<Config>,
        invoker: Arc<dyn Invoke>,
        resolver: Arc<RedirectResolver>,
    ) -> Self {
        Self {
            config,
            invoker,
            resolver,
        }
    }
}

//! Bounded, fixed-interval polling of a submitted run
//!
//! [`PollState`] holds the state (`status`, `attempts_remaining`) and is
//! transitioned by each status report; [`RunPoller`] drives it against a
//! [`RunStatusSource`], sleeping a fixed interval between queries. There is
//! no backoff and no jitter, and queries never overlap.

use crate::config::PollConfig;
use crate::error::InvocationError;
use crate::types::{RunReport, RunStatus};
use async_trait::async_trait;
use std::time::Duration;

/// Anything that can report the state of a run
#[async_trait]
pub trait RunStatusSource: Send + Sync {
    /// Query the current state of `run_id`
    async fn run_status(&self, run_id: &str, token: &str)
    -> Result<RunReport, InvocationError>;
}

/// Result of feeding one status report into [`PollState`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollStep {
    /// Run has not reached a terminal state; query again if budget remains
    Pending,
    /// Run succeeded; its dataset id
    Done(String),
}

/// State of one polling session
#[derive(Clone, Debug)]
pub struct PollState {
    run_id: String,
    status: Option<RunStatus>,
    attempts_remaining: u32,
    attempts_made: u32,
}

impl PollState {
    /// Start a session for `run_id` with `max_attempts` status queries
    pub fn new(run_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            run_id: run_id.into(),
            status: None,
            attempts_remaining: max_attempts,
            attempts_made: 0,
        }
    }

    /// Last status observed, if any
    pub fn status(&self) -> Option<&RunStatus> {
        self.status.as_ref()
    }

    /// Status queries still allowed
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Status queries performed so far
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Whether the query budget is used up
    pub fn is_exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }

    /// Consume one attempt with the report it produced
    ///
    /// `SUCCEEDED` finishes the session (or fails with `MissingDataset`),
    /// `FAILED` fails with `RunFailed`, anything else keeps it pending.
    pub fn observe(&mut self, report: RunReport) -> Result<PollStep, InvocationError> {
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        self.attempts_made += 1;
        self.status = report.run.status.clone();

        match self.status {
            Some(RunStatus::Succeeded) => report
                .run
                .default_dataset_id
                .filter(|id| !id.is_empty())
                .map(PollStep::Done)
                .ok_or_else(|| InvocationError::MissingDataset {
                    run_id: self.run_id.clone(),
                }),
            Some(RunStatus::Failed) => Err(InvocationError::RunFailed {
                run_id: self.run_id.clone(),
                payload: report.payload,
            }),
            _ => Ok(PollStep::Pending),
        }
    }

    /// The error reported once the budget is exhausted without a terminal status
    pub fn timeout(&self) -> InvocationError {
        InvocationError::PollTimeout {
            run_id: self.run_id.clone(),
            attempts: self.attempts_made,
        }
    }
}

/// Polls a run until it finishes or the attempt budget runs out
#[derive(Clone, Debug)]
pub struct RunPoller {
    max_attempts: u32,
    interval: Duration,
}

impl RunPoller {
    /// Create a poller with an explicit budget
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Wait for `run_id` to succeed and return its dataset id
    pub async fn poll<S>(
        &self,
        source: &S,
        run_id: &str,
        token: &str,
    ) -> Result<String, InvocationError>
    where
        S: RunStatusSource + ?Sized,
    {
        let mut state = PollState::new(run_id, self.max_attempts);

        while !state.is_exhausted() {
            let report = source.run_status(run_id, token).await?;

            if let PollStep::Done(dataset_id) = state.observe(report)? {
                tracing::debug!(
                    run_id,
                    attempts = state.attempts_made(),
                    "Run succeeded"
                );
                return Ok(dataset_id);
            }

            tracing::trace!(
                run_id,
                status = state.status().map(RunStatus::as_str).unwrap_or("unknown"),
                attempts_remaining = state.attempts_remaining(),
                "Run still pending"
            );

            if !state.is_exhausted() {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(state.timeout())
    }
}

impl From<&PollConfig> for RunPoller {
    fn from(config: &PollConfig) -> Self {
        Self::new(config.max_attempts, config.interval)
    }
}

impl Default for RunPoller {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

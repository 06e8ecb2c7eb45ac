//! Remote task runner integration
//!
//! - [`client`] - HTTP calls to the runner API
//! - [`poller`] - bounded polling of submitted runs
//! - [`invoker`] - synchronous attempt, submit-and-poll fallback, identifier retry

pub mod client;
pub mod invoker;
pub mod poller;

pub use client::RunnerClient;
pub use invoker::{
    Invoke, InvokeStrategy, SubmitAndPoll, SyncRun, TaskInvoker, invoke_with_alternate,
};
pub use poller::{PollState, PollStep, RunPoller, RunStatusSource};

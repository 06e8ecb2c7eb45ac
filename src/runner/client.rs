//! HTTP client for the remote task runner
//!
//! Wraps the four runner endpoints the relay needs:
//! - `POST /acts/{task}/run-sync-get-dataset` - run and return output in one call
//! - `POST /acts/{task}/runs` - start a run
//! - `GET /actor-runs/{run}` - run status
//! - `GET /datasets/{dataset}/items` - run output
//!
//! The token travels as the `token` query parameter on every call.

use super::poller::RunStatusSource;
use crate::config::RunnerConfig;
use crate::error::{InvocationError, Result};
use crate::types::{ResultRecord, RunRecord, RunReport, TaskId};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Output of the synchronous endpoint: a bare list, a wrapped list, or one record
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyncPayload {
    Items(Vec<ResultRecord>),
    Wrapped { items: Vec<ResultRecord> },
    Single(ResultRecord),
}

impl From<SyncPayload> for Vec<ResultRecord> {
    fn from(payload: SyncPayload) -> Self {
        match payload {
            SyncPayload::Items(items) | SyncPayload::Wrapped { items } => items,
            SyncPayload::Single(record) => vec![record],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartRunResponse {
    #[serde(default)]
    data: Option<RunRecord>,
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RunStatusResponse {
    #[serde(default)]
    data: Option<RunRecord>,
}

/// Typed access to the runner API
#[derive(Clone, Debug)]
pub struct RunnerClient {
    http: reqwest::Client,
    api_base: String,
}

impl RunnerClient {
    /// Create a client for the configured runner
    pub fn new(config: &RunnerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Run `task` on `url` and wait for its output in a single call
    pub async fn run_sync(
        &self,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> std::result::Result<Vec<ResultRecord>, InvocationError> {
        const OPERATION: &str = "run-sync-get-dataset";

        let response = self
            .http
            .post(self.endpoint(&format!("acts/{}/run-sync-get-dataset", task)))
            .query(&[("token", token)])
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let payload: SyncPayload = read_json(response, OPERATION).await?;
        Ok(payload.into())
    }

    /// Start a run of `task` on `url`, returning the run id
    pub async fn start_run(
        &self,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> std::result::Result<String, InvocationError> {
        const OPERATION: &str = "start run";

        let response = self
            .http
            .post(self.endpoint(&format!("acts/{}/runs", task)))
            .query(&[("token", token)])
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let started: StartRunResponse = read_json(response, OPERATION).await?;
        started
            .data
            .and_then(|run| run.id)
            .or(started.id)
            .filter(|id| !id.is_empty())
            .ok_or(InvocationError::MissingRunId)
    }

    /// Fetch the current state of a run
    ///
    /// Any JSON answer is a report, even one with an error status or without
    /// a usable `data` record; those come back status-less so the poller
    /// counts them as pending. Only transport failures and non-JSON bodies
    /// are errors.
    pub async fn run_status(
        &self,
        run_id: &str,
        token: &str,
    ) -> std::result::Result<RunReport, InvocationError> {
        const OPERATION: &str = "run status";

        let response = self
            .http
            .get(self.endpoint(&format!("actor-runs/{}", run_id)))
            .query(&[("token", token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let payload: serde_json::Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => {
                return Err(InvocationError::Rejected {
                    operation: OPERATION,
                    status: status.as_u16(),
                    body,
                });
            }
            Err(source) => {
                return Err(InvocationError::Decode {
                    operation: OPERATION,
                    source,
                });
            }
        };

        if !status.is_success() {
            tracing::debug!(
                run_id,
                status = status.as_u16(),
                "Run status query rejected, treating run as pending"
            );
        }

        let run = serde_json::from_value::<RunStatusResponse>(payload.clone())
            .ok()
            .and_then(|decoded| decoded.data)
            .unwrap_or_default();

        Ok(RunReport { run, payload })
    }

    /// Fetch the items of a dataset as cleaned JSON
    pub async fn dataset_items(
        &self,
        dataset_id: &str,
        token: &str,
    ) -> std::result::Result<Vec<ResultRecord>, InvocationError> {
        const OPERATION: &str = "dataset items";

        let response = self
            .http
            .get(self.endpoint(&format!("datasets/{}/items", dataset_id)))
            .query(&[("format", "json"), ("clean", "true"), ("token", token)])
            .send()
            .await?;

        read_json(response, OPERATION).await
    }
}

#[async_trait]
impl RunStatusSource for RunnerClient {
    async fn run_status(
        &self,
        run_id: &str,
        token: &str,
    ) -> std::result::Result<RunReport, InvocationError> {
        RunnerClient::run_status(self, run_id, token).await
    }
}

/// Check the status and decode the body, keeping the body text on rejection
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &'static str,
) -> std::result::Result<T, InvocationError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(InvocationError::Rejected {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| InvocationError::Decode { operation, source })
}

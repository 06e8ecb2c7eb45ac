//! Task invocation: synchronous attempt first, submit-and-poll as fallback
//!
//! Each way of obtaining a task's output is an [`InvokeStrategy`]. The
//! [`TaskInvoker`] tries its strategies in order and returns the first
//! success; the failure of the last strategy is what the caller sees.
//! [`invoke_with_alternate`] adds the caller-level retry with the
//! tilde-joined task identifier.

use super::client::RunnerClient;
use super::poller::RunPoller;
use crate::config::PollConfig;
use crate::error::InvocationError;
use crate::types::{ResultRecord, TaskId};
use async_trait::async_trait;

/// One way of running a task and collecting its output
#[async_trait]
pub trait InvokeStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run `task` against `url` and return its records
    async fn attempt(
        &self,
        client: &RunnerClient,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> Result<Vec<ResultRecord>, InvocationError>;
}

/// Run the task and receive its dataset in a single call
#[derive(Clone, Copy, Debug, Default)]
pub struct SyncRun;

#[async_trait]
impl InvokeStrategy for SyncRun {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn attempt(
        &self,
        client: &RunnerClient,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> Result<Vec<ResultRecord>, InvocationError> {
        client.run_sync(task, token, url).await
    }
}

/// Start a run, poll it to completion, then fetch its dataset
#[derive(Clone, Debug, Default)]
pub struct SubmitAndPoll {
    poller: RunPoller,
}

impl SubmitAndPoll {
    /// Create the strategy with the given polling budget
    pub fn new(poller: RunPoller) -> Self {
        Self { poller }
    }
}

#[async_trait]
impl InvokeStrategy for SubmitAndPoll {
    fn name(&self) -> &'static str {
        "submit_and_poll"
    }

    async fn attempt(
        &self,
        client: &RunnerClient,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> Result<Vec<ResultRecord>, InvocationError> {
        let run_id = client.start_run(task, token, url).await?;
        tracing::info!(task = %task, run_id = %run_id, "Started run, polling for completion");

        let dataset_id = self.poller.poll(client, &run_id, token).await?;
        tracing::debug!(task = %task, run_id = %run_id, dataset_id = %dataset_id, "Fetching dataset");

        client.dataset_items(&dataset_id, token).await
    }
}

/// Anything that can turn a task identifier and a URL into result records
#[async_trait]
pub trait Invoke: Send + Sync {
    /// Run `task` for `url` and return its output records
    async fn invoke(
        &self,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> Result<Vec<ResultRecord>, InvocationError>;
}

/// Runs a task through an ordered list of strategies
pub struct TaskInvoker {
    client: RunnerClient,
    strategies: Vec<Box<dyn InvokeStrategy>>,
}

impl TaskInvoker {
    /// Standard invoker: synchronous run, then submit-and-poll
    pub fn new(client: RunnerClient, poll: &PollConfig) -> Self {
        Self::with_strategies(
            client,
            vec![
                Box::new(SyncRun),
                Box::new(SubmitAndPoll::new(RunPoller::from(poll))),
            ],
        )
    }

    /// Invoker with an explicit strategy order
    pub fn with_strategies(client: RunnerClient, strategies: Vec<Box<dyn InvokeStrategy>>) -> Self {
        Self { client, strategies }
    }

    /// Names of the strategies, in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl std::fmt::Debug for TaskInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskInvoker")
            .field("client", &self.client)
            .field("strategies", &self.strategy_names())
            .finish()
    }
}

#[async_trait]
impl Invoke for TaskInvoker {
    async fn invoke(
        &self,
        task: &TaskId,
        token: &str,
        url: &str,
    ) -> Result<Vec<ResultRecord>, InvocationError> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.attempt(&self.client, task, token, url).await {
                Ok(records) => {
                    tracing::debug!(
                        task = %task,
                        strategy = strategy.name(),
                        records = records.len(),
                        "Task invocation succeeded"
                    );
                    return Ok(records);
                }
                Err(e) => {
                    tracing::warn!(
                        task = %task,
                        strategy = strategy.name(),
                        error = %e,
                        "Task invocation strategy failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(InvocationError::NoStrategies))
    }
}

/// Invoke `task`, retrying once with its tilde-joined encoding on failure
///
/// Identifiers without a `/` are never retried. On failure the identifier
/// of the last attempt is returned alongside its error.
pub async fn invoke_with_alternate<I>(
    invoker: &I,
    task: &TaskId,
    token: &str,
    url: &str,
) -> Result<Vec<ResultRecord>, (TaskId, InvocationError)>
where
    I: Invoke + ?Sized,
{
    let first = match invoker.invoke(task, token, url).await {
        Ok(records) => return Ok(records),
        Err(e) => e,
    };

    let Some(alternate) = task.alternate() else {
        return Err((task.clone(), first));
    };

    tracing::warn!(
        task = %task,
        alternate = %alternate,
        error = %first,
        "Invocation failed, retrying with alternate task identifier"
    );

    invoker
        .invoke(&alternate, token, url)
        .await
        .map_err(|e| (alternate, e))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every identifier it is asked to invoke; succeeds only for `accept`
    struct RecordingInvoker {
        accept: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingInvoker {
        fn new(accept: Option<&'static str>) -> Self {
            Self {
                accept,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Invoke for RecordingInvoker {
        async fn invoke(
            &self,
            task: &TaskId,
            _token: &str,
            _url: &str,
        ) -> Result<Vec<ResultRecord>, InvocationError> {
            self.calls.lock().unwrap().push(task.to_string());
            if self.accept == Some(task.as_str()) {
                Ok(vec![ResultRecord::new()])
            } else {
                Err(InvocationError::MissingRunId)
            }
        }
    }

    fn task(raw: &str) -> TaskId {
        TaskId::parse(raw).unwrap()
    }

    fn client_for(server: &MockServer) -> RunnerClient {
        RunnerClient::new(&RunnerConfig {
            api_base: server.uri(),
            token: None,
            request_timeout: None,
        })
        .unwrap()
    }

    fn fast_poll() -> PollConfig {
        PollConfig {
            max_attempts: 3,
            interval: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn failing_path_identifier_is_retried_once_with_tilde() {
        let invoker = RecordingInvoker::new(None);

        let (last, _) = invoke_with_alternate(&invoker, &task("owner/task"), "tok", "u")
            .await
            .unwrap_err();

        assert_eq!(invoker.calls(), vec!["owner/task", "owner~task"]);
        assert_eq!(last.as_str(), "owner~task");
    }

    #[tokio::test]
    async fn alternate_success_is_returned() {
        let invoker = RecordingInvoker::new(Some("owner~task"));

        let records = invoke_with_alternate(&invoker, &task("owner/task"), "tok", "u")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(invoker.calls().len(), 2);
    }

    #[tokio::test]
    async fn identifier_without_separator_is_never_retried() {
        let invoker = RecordingInvoker::new(None);

        let (last, _) = invoke_with_alternate(&invoker, &task("owner~task"), "tok", "u")
            .await
            .unwrap_err();

        assert_eq!(invoker.calls(), vec!["owner~task"]);
        assert_eq!(last.as_str(), "owner~task");
    }

    #[tokio::test]
    async fn first_success_skips_retry() {
        let invoker = RecordingInvoker::new(Some("owner/task"));

        invoke_with_alternate(&invoker, &task("owner/task"), "tok", "u")
            .await
            .unwrap();

        assert_eq!(invoker.calls(), vec!["owner/task"]);
    }

    #[tokio::test]
    async fn sync_success_skips_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/run-sync-get-dataset"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!([{"video": "https://x/1.mp4"}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/runs"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let invoker = TaskInvoker::new(client_for(&server), &fast_poll());
        let records = invoker
            .invoke(&task("owner~task"), "tok", "https://t.example/v/1")
            .await
            .unwrap();

        assert_eq!(records[0]["video"], "https://x/1.mp4");
    }

    #[tokio::test]
    async fn sync_failure_falls_back_to_submit_and_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/run-sync-get-dataset"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not supported"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/runs"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"data": {"id": "run-7"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/run-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"status": "RUNNING"}
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/run-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"status": "SUCCEEDED", "defaultDatasetId": "ds-7"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/ds-7/items"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"downloadUrl": "https://x/7.mp4"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let invoker = TaskInvoker::new(client_for(&server), &fast_poll());
        let records = invoker
            .invoke(&task("owner~task"), "tok", "https://t.example/v/7")
            .await
            .unwrap();

        assert_eq!(records[0]["downloadUrl"], "https://x/7.mp4");
    }

    #[tokio::test]
    async fn fallback_submit_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/run-sync-get-dataset"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/runs"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let invoker = TaskInvoker::new(client_for(&server), &fast_poll());
        let err = invoker
            .invoke(&task("owner~task"), "tok", "u")
            .await
            .unwrap_err();

        match err {
            InvocationError::Rejected {
                operation, status, ..
            } => {
                assert_eq!(operation, "start run");
                assert_eq!(status, 403);
            }
            other => panic!("expected rejected start, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn dataset_fetch_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/run-sync-get-dataset"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/acts/owner~task/runs"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"data": {"id": "r"}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/actor-runs/r"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"status": "SUCCEEDED", "defaultDatasetId": "ds"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/datasets/ds/items"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let invoker = TaskInvoker::new(client_for(&server), &fast_poll());
        let err = invoker
            .invoke(&task("owner~task"), "tok", "u")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InvocationError::Rejected {
                operation: "dataset items",
                status: 502,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_strategy_list_fails() {
        let server = MockServer::start().await;
        let invoker = TaskInvoker::with_strategies(client_for(&server), vec![]);

        let err = invoker
            .invoke(&task("owner~task"), "tok", "u")
            .await
            .unwrap_err();

        assert!(matches!(err, InvocationError::NoStrategies));
    }

    #[test]
    fn default_strategy_order() {
        let client = RunnerClient::new(&RunnerConfig::default()).unwrap();
        let invoker = TaskInvoker::new(client, &PollConfig::default());

        assert_eq!(invoker.strategy_names(), vec!["sync", "submit_and_poll"]);
    }
}

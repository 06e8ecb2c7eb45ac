//! Core types for media-relay

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One schema-less output item produced by a remote task
pub type ResultRecord = serde_json::Map<String, serde_json::Value>;

/// Identifier of a remote scraping task
///
/// The runner accepts two encodings of the same task: the path-segment form
/// (`owner/name`) and the tilde-joined form (`owner~name`). Nothing verifies
/// that both encodings resolve to the same task on the runner side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Separator of the path-segment encoding
    pub const PATH_SEPARATOR: char = '/';
    /// Separator of the tilde-joined encoding
    pub const TILDE_SEPARATOR: char = '~';

    /// Create a task identifier, rejecting blank input
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The identifier as sent to the runner
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tilde-joined encoding of this identifier, if it is in path-segment form
    ///
    /// Only the first separator is replaced.
    pub fn alternate(&self) -> Option<TaskId> {
        if self.0.contains(Self::PATH_SEPARATOR) {
            Some(Self(self.0.replacen(
                Self::PATH_SEPARATOR,
                &Self::TILDE_SEPARATOR.to_string(),
                1,
            )))
        } else {
            None
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a run as reported by the runner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    /// Run is executing
    Running,
    /// Run finished and its dataset is ready
    Succeeded,
    /// Run finished with an error
    Failed,
    /// Any other state (READY, ABORTED, TIMED-OUT, ...)
    Other(String),
}

impl RunStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::Other(s) => s,
        }
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "RUNNING" => RunStatus::Running,
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" => RunStatus::Failed,
            _ => RunStatus::Other(s),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The runner's view of one task execution
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// Run identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Current status; absent while the runner has not reported one
    #[serde(default)]
    pub status: Option<RunStatus>,
    /// Dataset holding the run's output, set once the run succeeds
    #[serde(default)]
    pub default_dataset_id: Option<String>,
}

/// A status report for a run: the decoded record plus the payload it came from
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Decoded run record
    pub run: RunRecord,
    /// Raw response body, surfaced when the run fails
    pub payload: serde_json::Value,
}

/// Outcome of probing the first result record for a media link
#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    /// The selected media URL, if any candidate field was present
    pub video: Option<String>,
    /// Name of the field the URL was taken from
    pub field: Option<&'static str>,
    /// The first result record, untouched
    pub raw: ResultRecord,
}

/// Response body of `GET /api/:platform`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MediaResponse {
    /// Extracted media download URL, or null when no candidate field matched
    pub video: Option<String>,
    /// The first record returned by the task, for manual inspection
    #[schema(value_type = Object)]
    pub raw: ResultRecord,
}

impl From<Extraction> for MediaResponse {
    fn from(extraction: Extraction) -> Self {
        Self {
            video: extraction.video,
            raw: extraction.raw,
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Created,
    Started,
    Passed,
    Failed,
    Errored,
    Canceled,
}

impl BuildState {
    pub const NOT_PASSING: [BuildState; 3] =
        [BuildState::Failed, BuildState::Errored, BuildState::Canceled];

    pub fn is_terminal_failure(&self) -> bool {
        Self::NOT_PASSING.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::Created => "created",
            BuildState::Started => "started",
            BuildState::Passed => "passed",
            BuildState::Failed => "failed",
            BuildState::Errored => "errored",
            BuildState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for BuildState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" | "queued" => BuildState::Created,
            "started" | "in_progress" => BuildState::Started,
            "passed" | "success" => BuildState::Passed,
            "failed" | "failure" => BuildState::Failed,
            "canceled" | "cancelled" => BuildState::Canceled,
            _ => BuildState::Errored,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: i64,
    pub vcs_system_id: i64,
    pub external_id: String,
    pub number: Option<u64>,
    pub state: BuildState,
    /// `None` when the build's revision was never mined, e.g. pull-request merges.
    pub commit_id: Option<i64>,
}

/// A build as reported by a CI service, keyed by the revision it ran on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalBuild {
    pub external_id: String,
    #[serde(default)]
    pub number: Option<u64>,
    pub state: BuildState,
    pub revision_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunPage {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub run_number: Option<u64>,
    pub head_sha: String,
    pub event: String,
    pub status: Option<String>,
    pub conclusion: Option<String>,
}

impl From<WorkflowRun> for ExternalBuild {
    fn from(run: WorkflowRun) -> Self {
        let state = match (run.status.as_deref(), run.conclusion.as_deref()) {
            (_, Some(conclusion)) => BuildState::from(conclusion),
            (Some(status), None) => BuildState::from(status),
            (None, None) => BuildState::Created,
        };
        Self {
            external_id: run.id.to_string(),
            number: run.run_number,
            state,
            revision_hash: run.head_sha,
        }
    }
}

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::github::GitHubClient;
use crate::models::{ExternalBuild, VcsSystem};
use crate::storage::HistoryStore;

/// Somewhere CI build results can be read from.
#[async_trait]
pub trait BuildSource: Send + Sync {
    async fn fetch_builds(&self) -> Result<Vec<ExternalBuild>>;
    fn name(&self) -> &str;
}

/// Completed GitHub Actions workflow runs of one repository.
pub struct GitHubActionsSource {
    client: GitHubClient,
    owner: String,
    repo: String,
    max_runs: Option<usize>,
    description: String,
}

impl GitHubActionsSource {
    pub fn new(client: GitHubClient, owner: &str, repo: &str) -> Self {
        Self {
            client,
            owner: owner.to_string(),
            repo: repo.to_string(),
            max_runs: None,
            description: format!("github-actions:{}/{}", owner, repo),
        }
    }

    pub fn with_max_runs(mut self, max_runs: Option<usize>) -> Self {
        self.max_runs = max_runs;
        self
    }
}

#[async_trait]
impl BuildSource for GitHubActionsSource {
    async fn fetch_builds(&self) -> Result<Vec<ExternalBuild>> {
        let runs = self
            .client
            .get_workflow_runs(&self.owner, &self.repo, self.max_runs)
            .await?;
        Ok(runs.into_iter().map(ExternalBuild::from).collect())
    }

    fn name(&self) -> &str {
        &self.description
    }
}

/// A JSON array of builds, for CI services without an importer.
///
/// ```json
/// [{"external_id": "812", "number": 812, "state": "failed", "revision_hash": "9fceb02..."}]
/// ```
pub struct JsonFileSource {
    path: PathBuf,
    description: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!("file:{}", path.display());
        Self { path, description }
    }
}

#[async_trait]
impl BuildSource for JsonFileSource {
    async fn fetch_builds(&self) -> Result<Vec<ExternalBuild>> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn name(&self) -> &str {
        &self.description
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub builds: usize,
    pub linked: usize,
}

/// Stores builds against the commits they ran on. Builds whose revision was
/// never mined are kept without a commit link.
pub fn store_builds(
    store: &dyn HistoryStore,
    vcs_system: &VcsSystem,
    builds: &[ExternalBuild],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for build in builds {
        let commit_id = store
            .commit_by_hash(vcs_system.id, &build.revision_hash)?
            .map(|commit| commit.id);
        if commit_id.is_some() {
            summary.linked += 1;
        } else {
            tracing::debug!(
                "Build {} ran on {}, which is not a mined commit",
                build.external_id,
                build.revision_hash
            );
        }
        store.upsert_build(vcs_system.id, build, commit_id)?;
        summary.builds += 1;
    }

    Ok(summary)
}

pub async fn import_builds(
    source: &dyn BuildSource,
    store: &dyn HistoryStore,
    vcs_system: &VcsSystem,
) -> Result<ImportSummary> {
    tracing::info!("Importing builds from {}", source.name());
    let builds = source.fetch_builds().await?;
    let summary = store_builds(store, vcs_system, &builds)?;
    tracing::info!(
        "Stored {} builds, {} linked to commits of {}",
        summary.builds,
        summary.linked,
        vcs_system.url
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildState, MinedCommit};
    use crate::storage::Storage;
    use chrono::DateTime;

    #[tokio::test]
    async fn test_json_file_builds_are_linked_by_revision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("builds.json");
        std::fs::write(
            &path,
            r#"[
                {"external_id": "1", "number": 1, "state": "passed", "revision_hash": "aaa"},
                {"external_id": "2", "state": "failed", "revision_hash": "bbb"},
                {"external_id": "3", "state": "errored", "revision_hash": "not-mined"}
            ]"#,
        )
        .unwrap();

        let storage = Storage::in_memory().unwrap();
        let vcs = storage.ensure_vcs_system("repo").unwrap();
        for (hash, parent) in [("aaa", None), ("bbb", Some("aaa"))] {
            let commit = MinedCommit {
                revision_hash: hash.to_string(),
                parents: parent.into_iter().map(str::to_string).collect(),
                committer_date: DateTime::from_timestamp(10, 0).unwrap(),
                message: String::new(),
            };
            storage.upsert_commit(vcs.id, &commit, false).unwrap();
        }

        let source = JsonFileSource::new(&path);
        let summary = import_builds(&source, &storage, &vcs).await.unwrap();
        assert_eq!(summary, ImportSummary { builds: 3, linked: 2 });

        // Importing again updates in place.
        import_builds(&source, &storage, &vcs).await.unwrap();
        let failing = storage.builds_not_passing(vcs.id).unwrap();
        assert_eq!(failing.len(), 2);
        assert_eq!(failing[0].state, BuildState::Failed);
        assert!(failing[0].commit_id.is_some());
        assert_eq!(failing[1].commit_id, None);
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let source = JsonFileSource::new("/nonexistent/builds.json");
        assert!(matches!(
            source.fetch_builds().await,
            Err(crate::error::Error::Io(_))
        ));
    }
}

pub mod sqlite;

use crate::error::Result;
use crate::models::{
    BuildRecord, BuildState, ChangeSummary, ClassificationTally, CommitChanges, CommitRecord,
    ExternalBuild, FileRecord, MinedCommit, VcsSystem,
};

pub use sqlite::Storage;

/// The lookups and writes the pipeline needs, and nothing more.
pub trait HistoryStore {
    fn ensure_vcs_system(&self, url: &str) -> Result<VcsSystem>;
    fn vcs_system_by_url(&self, url: &str) -> Result<Option<VcsSystem>>;

    fn upsert_commit(
        &self,
        vcs_system_id: i64,
        commit: &MinedCommit,
        is_bugfix: bool,
    ) -> Result<i64>;
    fn commit_by_hash(
        &self,
        vcs_system_id: i64,
        revision_hash: &str,
    ) -> Result<Option<CommitRecord>>;
    fn commit_by_id(&self, id: i64) -> Result<Option<CommitRecord>>;
    /// Newest committer date first.
    fn commits(&self, vcs_system_id: i64, bugfix_only: bool) -> Result<Vec<CommitRecord>>;

    fn upsert_build(
        &self,
        vcs_system_id: i64,
        build: &ExternalBuild,
        commit_id: Option<i64>,
    ) -> Result<i64>;
    /// Builds in a terminal state other than passed.
    fn builds_not_passing(&self, vcs_system_id: i64) -> Result<Vec<BuildRecord>>;
    fn build_by_commit_and_state(
        &self,
        vcs_system_id: i64,
        commit_id: i64,
        state: BuildState,
    ) -> Result<Option<BuildRecord>>;

    fn file_by_path(&self, vcs_system_id: i64, path: &str) -> Result<Option<FileRecord>>;
    fn insert_file(&self, vcs_system_id: i64, path: &str) -> Result<FileRecord>;

    fn upsert_commit_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
        summary: &ChangeSummary,
    ) -> Result<()>;
    fn upsert_file_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
        file_id: i64,
        tally: &ClassificationTally,
    ) -> Result<()>;
    /// Drops every per-file row of a pair.
    fn clear_file_changes(&self, old_commit_id: i64, new_commit_id: i64) -> Result<()>;
    fn commit_changes(
        &self,
        old_commit_id: i64,
        new_commit_id: i64,
    ) -> Result<Option<ChangeSummary>>;
    fn list_commit_changes(&self, vcs_system_id: i64) -> Result<Vec<CommitChanges>>;
}

pub mod git;

use std::path::Path;

use crate::error::Result;
use crate::models::{ChangedFilePair, MinedCommit};

pub use git::{history_url, GitBackend};

/// Read-only access to a revision history.
pub trait VersionControl {
    /// Full revision hash for any revision expression.
    fn resolve(&self, revision: &str) -> Result<String>;

    /// Tree-level diff. Additions and deletions carry `/dev/null` on the
    /// missing side. Order is the backend's.
    fn diff(&self, base: &str, target: &str) -> Result<Vec<ChangedFilePair>>;

    /// Writes `paths` as they are at `revision` below `destination`.
    fn checkout(&self, revision: &str, destination: &Path, paths: &[String]) -> Result<()>;

    /// `None` for a root commit.
    fn first_parent(&self, revision: &str) -> Result<Option<String>>;

    /// Every commit reachable from local branches and HEAD, newest first.
    fn commits(&self) -> Result<Vec<MinedCommit>>;

    /// Location recorded as the history's url in the store.
    fn url(&self) -> &str;
}

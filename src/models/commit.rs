use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path the tree diff reports for the missing side of an addition or deletion.
pub const DEV_NULL: &str = "/dev/null";

/// A tracked revision history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsSystem {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: i64,
    pub vcs_system_id: i64,
    pub revision_hash: String,
    pub parents: Vec<String>,
    pub committer_date: DateTime<Utc>,
    pub message: String,
    pub is_bugfix: bool,
}

impl CommitRecord {
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub fn to_ref(&self) -> CommitRef {
        CommitRef {
            id: self.id,
            revision_hash: self.revision_hash.clone(),
        }
    }
}

/// A commit as read from the repository, before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinedCommit {
    pub revision_hash: String,
    pub parents: Vec<String>,
    pub committer_date: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub id: i64,
    pub revision_hash: String,
}

/// Ordered (base, target) pair. Identity is `(base.id, target.id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPair {
    pub base: CommitRef,
    pub target: CommitRef,
}

impl CommitPair {
    pub fn new(base: CommitRef, target: CommitRef) -> Self {
        Self { base, target }
    }

    pub fn key(&self) -> (i64, i64) {
        (self.base.id, self.target.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFilePair {
    pub old_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub vcs_system_id: i64,
    pub path: String,
}

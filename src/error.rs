use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Distiller failed: {0}")]
    Distiller(String),

    #[error("Unclassified change: {change_kind} on {changed_entity}")]
    UnclassifiedChange {
        change_kind: String,
        changed_entity: String,
    },

    #[error("Commit not found in store: {0}")]
    CommitNotFound(String),

    #[error("No passing build found walking back from {revision}: {reason}")]
    BuildWalkExhausted { revision: String, reason: String },

    #[error("VCS system not found: {0}")]
    VcsSystemNotFound(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited(_) | Error::Network(_))
    }

    /// Errors scoped to a single commit pair. The batch logs these and moves on;
    /// everything else (storage in particular) aborts the run.
    pub fn is_pair_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Git(_)
                | Error::Io(_)
                | Error::Distiller(_)
                | Error::UnclassifiedChange { .. }
                | Error::CommitNotFound(_)
                | Error::BuildWalkExhausted { .. }
        )
    }
}

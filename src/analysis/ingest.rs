use regex::Regex;

use crate::error::{Error, Result};
use crate::models::VcsSystem;
use crate::storage::HistoryStore;
use crate::vcs::VersionControl;

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub vcs_system: VcsSystem,
    pub commits: usize,
    pub bugfixes: usize,
}

/// Copies a repository's commit graph into the store.
pub struct HistoryIngester<'a> {
    store: &'a dyn HistoryStore,
    bugfix_pattern: Regex,
}

impl<'a> HistoryIngester<'a> {
    pub fn new(store: &'a dyn HistoryStore, bugfix_pattern: &str) -> Result<Self> {
        let bugfix_pattern = Regex::new(bugfix_pattern)
            .map_err(|e| Error::Config(format!("invalid BUGFIX_PATTERN: {}", e)))?;
        Ok(Self {
            store,
            bugfix_pattern,
        })
    }

    pub fn is_bugfix(&self, message: &str) -> bool {
        self.bugfix_pattern.is_match(message)
    }

    /// Upserts every reachable commit. Running it again refreshes labels and
    /// adds new commits without duplicating anything.
    pub fn ingest(&self, vcs: &dyn VersionControl) -> Result<IngestSummary> {
        let vcs_system = self.store.ensure_vcs_system(vcs.url())?;
        let commits = vcs.commits()?;
        tracing::info!("Mining {} commits from {}", commits.len(), vcs_system.url);

        let mut bugfixes = 0;
        for commit in &commits {
            let is_bugfix = self.is_bugfix(&commit.message);
            if is_bugfix {
                bugfixes += 1;
            }
            self.store.upsert_commit(vcs_system.id, commit, is_bugfix)?;
        }

        tracing::info!(
            "Stored {} commits ({} bug fixes) for {}",
            commits.len(),
            bugfixes,
            vcs_system.url
        );

        Ok(IngestSummary {
            vcs_system,
            commits: commits.len(),
            bugfixes,
        })
    }
}

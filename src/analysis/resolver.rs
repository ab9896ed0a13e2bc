use crate::error::{Error, Result};
use crate::models::{BuildRecord, BuildState, CommitPair, CommitRecord, VcsSystem};
use crate::storage::HistoryStore;
use crate::vcs::VersionControl;

/// Which (base, target) pairs a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Every stored commit against its first parent.
    AllCommits,
    /// Like `AllCommits`, limited to commits labelled as bug fixes.
    BugfixCommits,
    /// Each failing build's commit against the nearest first-parent ancestor
    /// with a passing build.
    BuildLinked,
    /// One explicit pair of revision expressions.
    SinglePair { base: String, target: String },
}

pub type PairIter<'a> = Box<dyn Iterator<Item = Result<CommitPair>> + 'a>;

pub struct CommitPairResolver<'a> {
    store: &'a dyn HistoryStore,
    vcs: &'a dyn VersionControl,
    vcs_system: VcsSystem,
    policy: SelectionPolicy,
    max_walk_depth: Option<usize>,
}

impl<'a> CommitPairResolver<'a> {
    /// Fails when the backend's history has never been ingested.
    pub fn new(
        store: &'a dyn HistoryStore,
        vcs: &'a dyn VersionControl,
        policy: SelectionPolicy,
    ) -> Result<Self> {
        let vcs_system = store
            .vcs_system_by_url(vcs.url())?
            .ok_or_else(|| Error::VcsSystemNotFound(vcs.url().to_string()))?;

        Ok(Self {
            store,
            vcs,
            vcs_system,
            policy,
            max_walk_depth: None,
        })
    }

    pub fn with_max_walk_depth(mut self, depth: Option<usize>) -> Self {
        self.max_walk_depth = depth;
        self
    }

    pub fn vcs_system(&self) -> &VcsSystem {
        &self.vcs_system
    }

    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// A fresh pass over the policy's pairs. Errors in the outer `Result`
    /// concern the whole run; errors yielded by the iterator concern one pair.
    pub fn pairs(&self) -> Result<PairIter<'_>> {
        match &self.policy {
            SelectionPolicy::AllCommits => self.parent_pairs(false),
            SelectionPolicy::BugfixCommits => self.parent_pairs(true),
            SelectionPolicy::BuildLinked => self.build_pairs(),
            SelectionPolicy::SinglePair { base, target } => self.single_pair(base, target),
        }
    }

    fn parent_pairs(&self, bugfix_only: bool) -> Result<PairIter<'_>> {
        let commits = self.store.commits(self.vcs_system.id, bugfix_only)?;
        tracing::info!(
            "Found {} {}commits in {}",
            commits.len(),
            if bugfix_only { "bugfix " } else { "" },
            self.vcs_system.url
        );

        let iter = commits.into_iter().filter_map(move |commit| {
            let parent = commit.first_parent()?.to_string();
            Some(self.stored_commit(&parent).map(|base| {
                CommitPair::new(base.to_ref(), commit.to_ref())
            }))
        });
        Ok(Box::new(iter))
    }

    fn build_pairs(&self) -> Result<PairIter<'_>> {
        let builds = self.store.builds_not_passing(self.vcs_system.id)?;
        tracing::info!(
            "Found {} builds that did not pass in {}",
            builds.len(),
            self.vcs_system.url
        );

        let iter = builds.into_iter().filter_map(move |build| {
            let Some(commit_id) = build.commit_id else {
                tracing::debug!("Build {} is not linked to a commit", build.external_id);
                return None;
            };
            Some(self.walk_to_passing(&build, commit_id))
        });
        Ok(Box::new(iter))
    }

    fn single_pair(&self, base: &str, target: &str) -> Result<PairIter<'_>> {
        let base = self.vcs.resolve(base)?;
        let target = self.vcs.resolve(target)?;

        let pair = self.stored_commit(&base).and_then(|base| {
            Ok(CommitPair::new(base.to_ref(), self.stored_commit(&target)?.to_ref()))
        });
        Ok(Box::new(std::iter::once(pair)))
    }

    /// Follows the repository's first-parent chain from the failing commit
    /// until a stored commit with a passing build turns up.
    fn walk_to_passing(&self, build: &BuildRecord, commit_id: i64) -> Result<CommitPair> {
        let failing = self
            .store
            .commit_by_id(commit_id)?
            .ok_or_else(|| Error::CommitNotFound(format!("id {}", commit_id)))?;

        let mut current = failing.revision_hash.clone();
        let mut depth = 0;
        loop {
            let Some(parent) = self.vcs.first_parent(&current)? else {
                return Err(Error::BuildWalkExhausted {
                    revision: failing.revision_hash.clone(),
                    reason: format!("reached root {} (build {})", current, build.external_id),
                });
            };

            depth += 1;
            if self.max_walk_depth.is_some_and(|max| depth > max) {
                return Err(Error::BuildWalkExhausted {
                    revision: failing.revision_hash.clone(),
                    reason: format!("no passing build within {} commits", depth - 1),
                });
            }

            let candidate = self.stored_commit(&parent)?;
            let passed = self.store.build_by_commit_and_state(
                self.vcs_system.id,
                candidate.id,
                BuildState::Passed,
            )?;
            if passed.is_some() {
                tracing::debug!(
                    "Build {}: {} passed {} commits before {}",
                    build.external_id,
                    candidate.revision_hash,
                    depth,
                    failing.revision_hash
                );
                return Ok(CommitPair::new(candidate.to_ref(), failing.to_ref()));
            }
            current = candidate.revision_hash;
        }
    }

    fn stored_commit(&self, revision_hash: &str) -> Result<CommitRecord> {
        self.store
            .commit_by_hash(self.vcs_system.id, revision_hash)?
            .ok_or_else(|| Error::CommitNotFound(revision_hash.to_string()))
    }
}

//! `git2` backed history access. Nothing here shells out to `git`.

use chrono::DateTime;
use git2::{Delta, DiffFile, Oid, Repository, Sort};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::models::{ChangedFilePair, MinedCommit, DEV_NULL};
use crate::vcs::VersionControl;

pub struct GitBackend {
    repo: Repository,
    url: String,
    // Keeps a cloned repository alive for the backend's lifetime.
    _clone_dir: Option<TempDir>,
}

/// The url a history is stored under: the canonical path for local
/// repositories, the location as given otherwise.
pub fn history_url(location: &str) -> String {
    fs::canonicalize(location)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| location.to_string())
}

impl GitBackend {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)?;
        Ok(Self {
            repo,
            url: history_url(&path.to_string_lossy()),
            _clone_dir: None,
        })
    }

    pub fn clone_from(url: &str) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("changeclass-").tempdir()?;
        tracing::info!("Cloning {} into {}", url, dir.path().display());
        let repo = Repository::clone(url, dir.path())?;
        Ok(Self {
            repo,
            url: url.to_string(),
            _clone_dir: Some(dir),
        })
    }

    /// Opens a local repository, or clones anything that looks like a remote url.
    pub fn open_or_clone(location: &str) -> Result<Self> {
        if Path::new(location).exists() {
            Self::open(location)
        } else if location.contains("://") || location.starts_with("git@") {
            Self::clone_from(location)
        } else {
            Err(Error::Config(format!(
                "{} is neither a local repository nor a remote url",
                location
            )))
        }
    }

    fn commit_oid(&self, revision: &str) -> Result<Oid> {
        Ok(self.repo.revparse_single(revision)?.peel_to_commit()?.id())
    }

    fn write_blob(&self, oid: Oid, destination: &Path) -> Result<()> {
        let blob = self.repo.find_blob(oid)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, blob.content())?;
        Ok(())
    }
}

fn delta_path(file: &DiffFile<'_>) -> String {
    file.path()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEV_NULL.to_string())
}

impl VersionControl for GitBackend {
    fn resolve(&self, revision: &str) -> Result<String> {
        Ok(self.commit_oid(revision)?.to_string())
    }

    fn diff(&self, base: &str, target: &str) -> Result<Vec<ChangedFilePair>> {
        let base_tree = self.repo.revparse_single(base)?.peel_to_tree()?;
        let target_tree = self.repo.revparse_single(target)?.peel_to_tree()?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&base_tree), Some(&target_tree), None)?;

        let pairs = diff
            .deltas()
            .map(|delta| {
                let old_path = match delta.status() {
                    Delta::Added | Delta::Untracked => DEV_NULL.to_string(),
                    _ => delta_path(&delta.old_file()),
                };
                let new_path = match delta.status() {
                    Delta::Deleted => DEV_NULL.to_string(),
                    _ => delta_path(&delta.new_file()),
                };
                ChangedFilePair { old_path, new_path }
            })
            .collect();

        Ok(pairs)
    }

    fn checkout(&self, revision: &str, destination: &Path, paths: &[String]) -> Result<()> {
        let tree = self.repo.revparse_single(revision)?.peel_to_tree()?;
        for path in paths {
            let entry = tree.get_path(Path::new(path))?;
            self.write_blob(entry.id(), &destination.join(path))?;
        }
        Ok(())
    }

    fn first_parent(&self, revision: &str) -> Result<Option<String>> {
        let commit = self.repo.find_commit(self.commit_oid(revision)?)?;
        if commit.parent_count() == 0 {
            return Ok(None);
        }
        Ok(Some(commit.parent_id(0)?.to_string()))
    }

    fn commits(&self) -> Result<Vec<MinedCommit>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_glob("heads")?;
        if let Err(e) = revwalk.push_head() {
            tracing::debug!("HEAD not pushed to revwalk: {}", e);
        }
        revwalk.set_sorting(Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(MinedCommit {
                revision_hash: commit.id().to_string(),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
                committer_date: DateTime::from_timestamp(commit.committer().when().seconds(), 0)
                    .unwrap_or_default(),
                message: commit.message().unwrap_or_default().to_string(),
            });
        }

        Ok(commits)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
pub(crate) mod test_repo {
    use git2::{Repository, Signature, Time};
    use std::path::Path;
    use tempfile::TempDir;

    /// Throwaway repository with a deterministic commit clock.
    pub struct TestRepo {
        pub dir: TempDir,
        pub repo: Repository,
        clock: i64,
    }

    impl TestRepo {
        pub fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let repo = Repository::init(dir.path()).unwrap();
            Self {
                dir,
                repo,
                clock: 1_600_000_000,
            }
        }

        /// Commits on HEAD. A `None` content deletes the file.
        pub fn commit(&mut self, files: &[(&str, Option<&str>)], message: &str) -> String {
            let mut index = self.repo.index().unwrap();
            for (path, content) in files {
                let full = self.dir.path().join(path);
                match content {
                    Some(text) => {
                        if let Some(parent) = full.parent() {
                            std::fs::create_dir_all(parent).unwrap();
                        }
                        std::fs::write(&full, text).unwrap();
                        index.add_path(Path::new(path)).unwrap();
                    }
                    None => {
                        std::fs::remove_file(&full).unwrap();
                        index.remove_path(Path::new(path)).unwrap();
                    }
                }
            }
            index.write().unwrap();

            self.clock += 60;
            let signature =
                Signature::new("Test", "test@example.com", &Time::new(self.clock, 0)).unwrap();
            let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
            let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
            self.repo
                .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
                .unwrap()
                .to_string()
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }
    }
}

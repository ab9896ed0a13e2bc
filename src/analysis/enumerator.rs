use crate::error::Result;
use crate::models::{ChangedFilePair, DEV_NULL};
use crate::taxonomy::is_source_file;
use crate::vcs::VersionControl;

/// Lists the changed file pairs between two revisions that can be distilled.
pub struct DiffEnumerator<'a> {
    vcs: &'a dyn VersionControl,
    source_extensions: Vec<String>,
}

impl<'a> DiffEnumerator<'a> {
    pub fn new(vcs: &'a dyn VersionControl, source_extensions: Vec<String>) -> Self {
        Self {
            vcs,
            source_extensions,
        }
    }

    /// Modified source files only, in the backend's diff order. Additions,
    /// deletions and files of other types are dropped.
    pub fn changed_files(&self, base: &str, target: &str) -> Result<Vec<ChangedFilePair>> {
        let pairs = self.vcs.diff(base, target)?;

        let eligible = pairs
            .into_iter()
            .filter(|pair| {
                if pair.old_path == DEV_NULL || pair.new_path == DEV_NULL {
                    tracing::debug!(
                        "Skipping {} -> {}: file added or removed",
                        pair.old_path,
                        pair.new_path
                    );
                    return false;
                }
                if !is_source_file(&pair.old_path, &self.source_extensions)
                    || !is_source_file(&pair.new_path, &self.source_extensions)
                {
                    tracing::debug!(
                        "Skipping {} -> {}: not a source file",
                        pair.old_path,
                        pair.new_path
                    );
                    return false;
                }
                true
            })
            .collect();

        Ok(eligible)
    }
}

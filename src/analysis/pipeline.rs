use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::Path;

use crate::analysis::enumerator::DiffEnumerator;
use crate::analysis::resolver::CommitPairResolver;
use crate::config::PipelineConfig;
use crate::distiller::{distill, Distiller};
use crate::error::Result;
use crate::models::{Category, ChangeSummary, ClassificationTally, CommitPair};
use crate::storage::HistoryStore;
use crate::taxonomy::ChangeTaxonomy;
use crate::vcs::VersionControl;

/// Counts for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pairs stored with a tally.
    pub processed: usize,
    /// Pairs stored as not analyzed because no eligible file changed.
    pub not_analyzed: usize,
    /// Pairs skipped after a pair-scoped error.
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.processed + self.not_analyzed + self.failed
    }
}

/// Distills and classifies one file pair.
///
/// A pair the distiller finds nothing in still counts: it is recorded as a
/// single OTHER change.
pub fn classify_file_pair(
    distiller: &dyn Distiller,
    taxonomy: &ChangeTaxonomy,
    old_file: &Path,
    new_file: &Path,
) -> Result<ClassificationTally> {
    let changes = distill(distiller, old_file, new_file);
    if changes.is_empty() {
        return Ok([(Category::Other, 1)].into_iter().collect());
    }
    taxonomy.tally(&changes)
}

pub struct ClassificationPipeline<'a> {
    vcs: &'a dyn VersionControl,
    store: &'a dyn HistoryStore,
    distiller: &'a dyn Distiller,
    taxonomy: ChangeTaxonomy,
    enumerator: DiffEnumerator<'a>,
    vcs_system_id: i64,
    config: PipelineConfig,
}

impl<'a> ClassificationPipeline<'a> {
    pub fn new(
        vcs: &'a dyn VersionControl,
        store: &'a dyn HistoryStore,
        distiller: &'a dyn Distiller,
        vcs_system_id: i64,
        config: PipelineConfig,
    ) -> Self {
        Self {
            vcs,
            store,
            distiller,
            taxonomy: ChangeTaxonomy::new(),
            enumerator: DiffEnumerator::new(vcs, config.source_extensions.clone()),
            vcs_system_id,
            config,
        }
    }

    /// Classifies one pair and upserts the result under `(base.id, target.id)`.
    pub fn process(&self, pair: &CommitPair) -> Result<ChangeSummary> {
        let base = &pair.base.revision_hash;
        let target = &pair.target.revision_hash;

        let files = self.enumerator.changed_files(base, target)?;
        if self.config.per_file_results {
            self.store.clear_file_changes(pair.base.id, pair.target.id)?;
        }
        if files.is_empty() {
            tracing::info!("No source files changed between {} and {}", base, target);
            let summary = ChangeSummary::NotAnalyzed;
            self.store
                .upsert_commit_changes(pair.base.id, pair.target.id, &summary)?;
            return Ok(summary);
        }

        let old_dir = tempfile::Builder::new().prefix("changeclass-old-").tempdir()?;
        let new_dir = tempfile::Builder::new().prefix("changeclass-new-").tempdir()?;

        let old_paths: Vec<String> = files.iter().map(|f| f.old_path.clone()).collect();
        let new_paths: Vec<String> = files.iter().map(|f| f.new_path.clone()).collect();
        self.vcs.checkout(base, old_dir.path(), &old_paths)?;
        self.vcs.checkout(target, new_dir.path(), &new_paths)?;

        let mut tally = ClassificationTally::new();
        for file in &files {
            let file_tally = match classify_file_pair(
                self.distiller,
                &self.taxonomy,
                &old_dir.path().join(&file.old_path),
                &new_dir.path().join(&file.new_path),
            ) {
                Ok(file_tally) => file_tally,
                Err(e) if e.is_pair_recoverable() => {
                    tracing::warn!(
                        "Discarding {} between {} and {}: {}",
                        file.new_path,
                        base,
                        target,
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            tally.merge(&file_tally);

            if self.config.per_file_results {
                let record = match self.store.file_by_path(self.vcs_system_id, &file.new_path)? {
                    Some(record) => record,
                    None => self.store.insert_file(self.vcs_system_id, &file.new_path)?,
                };
                self.store.upsert_file_changes(
                    pair.base.id,
                    pair.target.id,
                    record.id,
                    &file_tally,
                )?;
            }
        }

        let summary = ChangeSummary::from_tally(tally);
        self.store
            .upsert_commit_changes(pair.base.id, pair.target.id, &summary)?;

        match summary.tally() {
            Some(tally) => tracing::info!(
                "{} -> {}: {} changes in {} files",
                base,
                target,
                tally.total(),
                files.len()
            ),
            None => tracing::info!("{} -> {}: nothing classified", base, target),
        }

        Ok(summary)
    }

    /// Processes every pair the resolver yields. Pair-scoped failures are
    /// logged and counted; anything else stops the run.
    pub fn run(&self, resolver: &CommitPairResolver<'_>) -> Result<RunSummary> {
        let pb = if self.config.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} pairs {msg}")
        {
            pb.set_style(style);
        }

        let mut summary = RunSummary::default();

        for item in resolver.pairs()? {
            pb.inc(1);

            let pair = match item {
                Ok(pair) => pair,
                Err(e) if e.is_pair_recoverable() => {
                    tracing::warn!("Skipping commit pair: {}", e);
                    summary.failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            pb.set_message(pair.target.revision_hash.clone());

            match self.process(&pair) {
                Ok(ChangeSummary::NotAnalyzed) => summary.not_analyzed += 1,
                Ok(ChangeSummary::Tally(_)) => summary.processed += 1,
                Err(e) if e.is_pair_recoverable() => {
                    tracing::warn!(
                        "Failed to classify {} -> {}: {}",
                        pair.base.revision_hash,
                        pair.target.revision_hash,
                        e
                    );
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        pb.finish_with_message("done");
        tracing::info!(
            "Classified {} pairs: {} stored, {} not analyzed, {} failed",
            summary.total(),
            summary.processed,
            summary.not_analyzed,
            summary.failed
        );

        Ok(summary)
    }
}

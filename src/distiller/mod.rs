pub mod memory;
pub mod parser;
pub mod process;

use std::path::Path;

use crate::error::Result;
use crate::models::AtomicChange;

pub use memory::InMemoryDistiller;
pub use process::ProcessDistiller;

/// Extracts atomic source changes between two versions of one file.
pub trait Distiller {
    fn extract(&self, old_file: &Path, new_file: &Path) -> Result<Vec<AtomicChange>>;
    fn name(&self) -> &str;
}

/// Runs the distiller on one file pair. Extraction failures are logged and
/// yield no changes so the surrounding commit pair keeps going.
pub fn distill(distiller: &dyn Distiller, old_file: &Path, new_file: &Path) -> Vec<AtomicChange> {
    tracing::debug!(
        "Distilling changes between {} and {}.",
        old_file.display(),
        new_file.display()
    );

    match distiller.extract(old_file, new_file) {
        Ok(changes) => changes,
        Err(e) => {
            tracing::warn!(
                "{} failed on {} -> {}: {}",
                distiller.name(),
                old_file.display(),
                new_file.display(),
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;

    #[test]
    fn test_distill_swallows_extractor_failure() {
        let distiller = InMemoryDistiller::new().fail_on("Broken.java", "syntax error");
        let changes = distill(&distiller, Path::new("a/Broken.java"), Path::new("b/Broken.java"));
        assert!(changes.is_empty());
    }

    #[test]
    fn test_distill_passes_changes_through() {
        let change = AtomicChange::new(ChangeKind::StatementInsert, "IF_STATEMENT");
        let distiller = InMemoryDistiller::new().with_changes("App.java", vec![change.clone()]);
        let changes = distill(&distiller, Path::new("a/App.java"), Path::new("b/App.java"));
        assert_eq!(changes, vec![change]);
    }
}

use std::collections::HashMap;
use std::path::Path;

use crate::distiller::Distiller;
use crate::error::{Error, Result};
use crate::models::AtomicChange;

#[derive(Debug, Clone)]
enum Scripted {
    Changes(Vec<AtomicChange>),
    Failure(String),
}

/// Distiller with canned answers, matched on the end of the new file's path.
/// Unscripted files distill to nothing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDistiller {
    scripts: HashMap<String, Scripted>,
}

impl InMemoryDistiller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changes(mut self, path_suffix: &str, changes: Vec<AtomicChange>) -> Self {
        self.scripts
            .insert(path_suffix.to_string(), Scripted::Changes(changes));
        self
    }

    pub fn fail_on(mut self, path_suffix: &str, message: &str) -> Self {
        self.scripts
            .insert(path_suffix.to_string(), Scripted::Failure(message.to_string()));
        self
    }

    fn lookup(&self, new_file: &Path) -> Option<&Scripted> {
        let path = new_file.to_string_lossy();
        self.scripts
            .iter()
            .filter(|(suffix, _)| path.ends_with(suffix.as_str()))
            .max_by_key(|(suffix, _)| suffix.len())
            .map(|(_, script)| script)
    }
}

impl Distiller for InMemoryDistiller {
    fn extract(&self, _old_file: &Path, new_file: &Path) -> Result<Vec<AtomicChange>> {
        match self.lookup(new_file) {
            Some(Scripted::Changes(changes)) => Ok(changes.clone()),
            Some(Scripted::Failure(message)) => Err(Error::Distiller(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

use std::path::Path;

use crate::models::DEV_NULL;

/// Lowercased extension of a repository path, if it has one.
pub fn source_extension(path: &str) -> Option<String> {
    if path == DEV_NULL {
        return None;
    }
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

pub fn is_source_file(path: &str, extensions: &[String]) -> bool {
    source_extension(path)
        .map(|ext| extensions.iter().any(|e| *e == ext))
        .unwrap_or(false)
}

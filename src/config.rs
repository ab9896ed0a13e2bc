use crate::error::{Error, Result};
use std::env;

pub const DEFAULT_BUGFIX_PATTERN: &str = r"(?i)\b(fix(e[sd])?|bug(s)?|defect|hotfix)\b";

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: Option<String>,
    pub database_path: String,
    pub distiller_command: Option<String>,
    pub source_extensions: Vec<String>,
    pub max_walk_depth: Option<usize>,
    pub per_file_results: bool,
    pub bugfix_pattern: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "changeclass.db".to_string());

        let distiller_command = env::var("DISTILLER_COMMAND").ok().filter(|c| !c.trim().is_empty());

        let source_extensions = env::var("SOURCE_EXTENSIONS")
            .map(|v| parse_extensions(&v))
            .unwrap_or_else(|_| vec!["java".to_string()]);
        if source_extensions.is_empty() {
            return Err(Error::Config(
                "SOURCE_EXTENSIONS must name at least one extension".to_string(),
            ));
        }

        let max_walk_depth = match env::var("MAX_WALK_DEPTH") {
            Ok(v) => Some(v.parse().map_err(|_| {
                Error::Config(format!("MAX_WALK_DEPTH is not a number: {}", v))
            })?),
            Err(_) => None,
        };

        let per_file_results = env::var("PER_FILE_RESULTS")
            .ok()
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let bugfix_pattern = env::var("BUGFIX_PATTERN")
            .unwrap_or_else(|_| DEFAULT_BUGFIX_PATTERN.to_string());

        Ok(Self {
            github_token,
            database_path,
            distiller_command,
            source_extensions,
            max_walk_depth,
            per_file_results,
            bugfix_pattern,
        })
    }
}

fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_extensions: Vec<String>,
    pub max_walk_depth: Option<usize>,
    pub per_file_results: bool,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_extensions: vec!["java".to_string()],
            max_walk_depth: None,
            per_file_results: false,
            show_progress: false,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            source_extensions: config.source_extensions.clone(),
            max_walk_depth: config.max_walk_depth,
            per_file_results: config.per_file_results,
            show_progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions("java, .KT,,"), vec!["java", "kt"]);
        assert!(parse_extensions(" , ").is_empty());
    }
}

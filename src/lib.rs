pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod distiller;
pub mod taxonomy;
pub mod vcs;
pub mod analysis;
pub mod storage;

pub use config::{Config, PipelineConfig};
pub use error::{Error, Result};
pub use github::GitHubClient;
pub use distiller::{Distiller, ProcessDistiller};
pub use taxonomy::ChangeTaxonomy;
pub use vcs::{GitBackend, VersionControl};
pub use analysis::{ClassificationPipeline, CommitPairResolver, HistoryIngester, SelectionPolicy};
pub use storage::{HistoryStore, Storage};

pub mod enumerator;
pub mod ingest;
pub mod pipeline;
pub mod resolver;

pub use enumerator::DiffEnumerator;
pub use ingest::{HistoryIngester, IngestSummary};
pub use pipeline::{classify_file_pair, ClassificationPipeline, RunSummary};
pub use resolver::{CommitPairResolver, SelectionPolicy};

pub mod builds;
pub mod client;
pub mod paginator;
pub mod rate_limiter;

pub use builds::{
    import_builds, store_builds, BuildSource, GitHubActionsSource, ImportSummary, JsonFileSource,
};
pub use client::{parse_repo_slug, GitHubClient};
pub use paginator::Paginator;
pub use rate_limiter::RateLimiter;

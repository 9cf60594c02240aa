// GitHub data sources.
// REST client for profiles and events, the contribution calendar client, and
// the readme-stats client.

pub mod api_types;
pub mod client;
pub mod contributions;
pub mod readme_stats;
pub mod types;

pub use client::GitHubClient;
pub use contributions::ContributionsClient;
pub use readme_stats::ReadmeStatsClient;
pub use types::*;

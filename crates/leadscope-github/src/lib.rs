//! Repository intelligence: the GitHub-facing enrichment adapter.

pub mod analysis;
pub mod client;
pub mod error;
pub mod types;

pub use client::GithubClient;
pub use error::GithubError;
pub use types::RepoSearchItem;

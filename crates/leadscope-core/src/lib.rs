//! Shared domain types and configuration for the leadscope workspace.

pub mod app_config;
pub mod config;
pub mod lead;
pub mod profile;
pub mod subject;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use lead::{
    Grade, JobStatus, LeadMetadata, LeadProfile, LeadSource, Priority, ScoreBreakdown, Scoring,
};
pub use profile::{
    CompanyProfile, ContactProfile, Contributor, Detection, EmailContact, EmailKind,
    EngagementProfile, OrganizationProfile, RepoAnalysis, RepoOwner, RepositoryProfile,
    SocialPlatform, SocialProof, TechCategory, TechnologyMap, TechnologyProfile, WebsiteMeta,
};
pub use subject::{normalize_website_key, RepoRef, Subject, SubjectError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Classifies adapter errors for the retry wrapper.
///
/// Transient conditions (network failures, timeouts, 5xx responses) report
/// `true` and are retried with backoff. Terminal conditions (not-found,
/// exhausted quotas, rejected credentials, malformed response bodies)
/// report `false` and are surfaced to the caller immediately.
pub trait RetryClass {
    fn is_retryable(&self) -> bool;
}

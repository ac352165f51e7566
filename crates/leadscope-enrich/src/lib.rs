//! The enrichment core: retry wrapper, TTL result cache, the pipeline
//! orchestrator, and the pure scoring engine.

pub mod cache;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod scoring;

pub use cache::TtlCache;
pub use pipeline::{EnrichError, EnrichmentService, ServiceConfig};
pub use progress::ProgressReporter;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use scoring::{categorize, filter_by_min_score, prioritize, score_lead, Categorized};

use leadscope_core::RetryClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("repository or resource not found: {resource}")]
    NotFound { resource: String },

    #[error("rate limited while fetching {resource}")]
    RateLimited { resource: String },

    #[error("credentials rejected by the GitHub API")]
    Unauthorized,

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GithubError {
    /// Terminal failures the pipeline surfaces as the job failure reason
    /// when the repository is the only requested source.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GithubError::NotFound { .. } | GithubError::RateLimited { .. } | GithubError::Unauthorized
        )
    }
}

impl RetryClass for GithubError {
    /// Network failures and 5xx responses are retryable; 401/403/404 and
    /// parse failures are not — retrying would return the same result.
    fn is_retryable(&self) -> bool {
        match self {
            GithubError::Http(_) => true,
            GithubError::UnexpectedStatus { status, .. } => *status >= 500,
            GithubError::NotFound { .. }
            | GithubError::RateLimited { .. }
            | GithubError::Unauthorized
            | GithubError::Deserialize { .. } => false,
        }
    }
}

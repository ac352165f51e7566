use leadscope_core::RetryClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebscanError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl RetryClass for WebscanError {
    /// Network failures (including timeouts) and 5xx responses are
    /// retryable; 4xx responses and unparseable URLs are not.
    fn is_retryable(&self) -> bool {
        match self {
            WebscanError::Http(_) => true,
            WebscanError::UnexpectedStatus { status, .. } => *status >= 500,
            WebscanError::InvalidUrl { .. } => false,
        }
    }
}

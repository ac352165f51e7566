//! Single-page fetch client shared by the website-facing adapters.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;

use crate::error::WebscanError;

/// A fetched page: the final URL, raw HTML, and lower-cased response headers.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    headers: BTreeMap<String, String>,
}

impl FetchedPage {
    #[must_use]
    pub fn new(url: &str, html: &str, headers: BTreeMap<String, String>) -> Self {
        Self {
            url: url.to_owned(),
            html: html.to_owned(),
            headers,
        }
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }
}

/// Ensures a website identifier is an absolute URL, defaulting to https.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    }
}

/// HTTP client for fetching lead websites.
///
/// One GET per call, no redirection limits beyond reqwest's default, and a
/// browser-like `User-Agent` (many marketing sites refuse unknown agents).
#[derive(Debug, Clone)]
pub struct PageClient {
    client: Client,
}

impl PageClient {
    /// Creates a `PageClient` with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`WebscanError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, WebscanError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches one page, returning the HTML body and response headers.
    ///
    /// The input may be a bare domain; it is normalized to an absolute
    /// https URL first.
    ///
    /// # Errors
    ///
    /// - [`WebscanError::Http`] — network failure or timeout.
    /// - [`WebscanError::UnexpectedStatus`] — any non-2xx response.
    pub async fn fetch(&self, raw_url: &str) -> Result<FetchedPage, WebscanError> {
        let url = normalize_url(raw_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(WebscanError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_owned()))
            })
            .collect();

        let html = response.text().await?;

        Ok(FetchedPage { url, html, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_defaults_to_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com "), "https://example.com");
    }

    #[test]
    fn normalize_url_keeps_explicit_schemes() {
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("x-powered-by".to_owned(), "Express".to_owned());
        let page = FetchedPage::new("https://example.com", "", headers);
        assert_eq!(page.header("X-Powered-By"), Some("Express"));
        assert!(page.has_header("x-powered-by"));
        assert!(!page.has_header("cf-ray"));
    }
}

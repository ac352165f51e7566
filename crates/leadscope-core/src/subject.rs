//! Subject identity: what a lead analysis runs against.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static REPO_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+/[A-Za-z0-9_-]+$").expect("valid repo regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubjectError {
    #[error("either a github repository or a website must be provided")]
    Empty,
    #[error("invalid github repository \"{0}\": expected owner/name")]
    InvalidRepo(String),
    #[error("invalid website \"{0}\": must be a non-empty identifier without whitespace")]
    InvalidWebsite(String),
}

/// A validated `owner/name` GitHub repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoRef {
    owner: String,
    name: String,
}

impl RepoRef {
    /// Parses and validates an `owner/name` string.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::InvalidRepo`] if the input does not match
    /// `owner/name` (alphanumerics, `-`, `_` in each segment).
    pub fn parse(raw: &str) -> Result<Self, SubjectError> {
        if !REPO_REF_RE.is_match(raw) {
            return Err(SubjectError::InvalidRepo(raw.to_owned()));
        }
        let (owner, name) = raw.split_once('/').ok_or_else(|| {
            // Unreachable given the regex, but avoids a panic path.
            SubjectError::InvalidRepo(raw.to_owned())
        })?;
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl TryFrom<String> for RepoRef {
    type Error = SubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepoRef> for String {
    fn from(value: RepoRef) -> Self {
        value.to_string()
    }
}

/// The enrichment target: a GitHub repository and/or a website.
///
/// At least one of the two is always present; construct through
/// [`Subject::new`] to keep that invariant. Immutable once a job exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub github: Option<RepoRef>,
    pub website: Option<String>,
}

impl Subject {
    /// Validates raw submission input into a `Subject`.
    ///
    /// # Errors
    ///
    /// - [`SubjectError::Empty`] if neither field is given.
    /// - [`SubjectError::InvalidRepo`] for a malformed repository reference.
    /// - [`SubjectError::InvalidWebsite`] for an empty or whitespace-bearing
    ///   website identifier.
    pub fn new(github: Option<&str>, website: Option<&str>) -> Result<Self, SubjectError> {
        let github = github
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(RepoRef::parse)
            .transpose()?;

        let website = match website.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) if raw.chars().any(char::is_whitespace) => {
                return Err(SubjectError::InvalidWebsite(raw.to_owned()));
            }
            Some(raw) => Some(raw.to_owned()),
            None => None,
        };

        if github.is_none() && website.is_none() {
            return Err(SubjectError::Empty);
        }

        Ok(Self { github, website })
    }

    /// The normalized identity used for cache keys and lead upserts.
    ///
    /// The repository reference wins when both are present (it is the more
    /// stable identifier); otherwise the normalized website is used.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match (&self.github, &self.website) {
            (Some(repo), _) => repo.to_string(),
            (None, Some(site)) => normalize_website_key(site),
            (None, None) => String::new(),
        }
    }
}

/// Normalizes a website identifier for use as a cache key: lower-cased,
/// scheme and `www.` stripped, trailing slash removed.
#[must_use]
pub fn normalize_website_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    let stripped = stripped.strip_prefix("www.").unwrap_or(stripped);
    stripped.trim_end_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_repo_ref() {
        let repo = RepoRef::parse("octocat/Hello-World").expect("valid ref");
        assert_eq!(repo.owner(), "octocat");
        assert_eq!(repo.name(), "Hello-World");
        assert_eq!(repo.to_string(), "octocat/Hello-World");
    }

    #[test]
    fn rejects_malformed_repo_refs() {
        for raw in ["octocat", "a/b/c", "", "owner/", "/name", "owner/na me"] {
            assert!(
                RepoRef::parse(raw).is_err(),
                "expected \"{raw}\" to be rejected"
            );
        }
    }

    #[test]
    fn subject_requires_at_least_one_field() {
        assert_eq!(Subject::new(None, None), Err(SubjectError::Empty));
        assert_eq!(Subject::new(Some(""), Some("   ")), Err(SubjectError::Empty));
    }

    #[test]
    fn subject_rejects_website_with_whitespace() {
        assert!(matches!(
            Subject::new(None, Some("examp le.com")),
            Err(SubjectError::InvalidWebsite(_))
        ));
    }

    #[test]
    fn cache_key_prefers_repo_over_website() {
        let subject =
            Subject::new(Some("octocat/Hello-World"), Some("https://example.com")).expect("valid");
        assert_eq!(subject.cache_key(), "octocat/Hello-World");
    }

    #[test]
    fn website_key_strips_scheme_www_and_trailing_slash() {
        assert_eq!(normalize_website_key("https://www.Example.COM/"), "example.com");
        assert_eq!(normalize_website_key("http://example.com"), "example.com");
        assert_eq!(normalize_website_key("Example.com/path/"), "example.com/path");
    }

    #[test]
    fn repo_ref_round_trips_through_serde() {
        let repo = RepoRef::parse("acme/widgets").expect("valid");
        let json = serde_json::to_string(&repo).expect("serialize");
        assert_eq!(json, "\"acme/widgets\"");
        let back: RepoRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, repo);
    }

    #[test]
    fn repo_ref_deserialization_validates() {
        let result: Result<RepoRef, _> = serde_json::from_str("\"not a repo\"");
        assert!(result.is_err());
    }
}

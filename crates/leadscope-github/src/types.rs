//! Wire types for the GitHub REST v3 API, deserialized leniently:
//! optional upstream fields default rather than failing the whole fetch.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOwner {
    pub login: String,
    /// `"User"` or `"Organization"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiLicense {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: ApiOwner,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub homepage: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub watchers_count: i64,
    #[serde(default)]
    pub open_issues_count: i64,
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub has_issues: bool,
    #[serde(default)]
    pub has_wiki: bool,
    pub license: Option<ApiLicense>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContributor {
    pub login: String,
    #[serde(default)]
    pub contributions: i64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiOrg {
    pub name: Option<String>,
    pub description: Option<String>,
    /// GitHub calls the organization website field `blog`.
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub public_repos: i64,
    #[serde(default)]
    pub followers: i64,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<ApiRepo>,
}

/// One repository search hit, trimmed for listing output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RepoSearchItem {
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: i64,
    pub language: Option<String>,
}

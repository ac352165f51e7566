use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};

use leadscope_core::profile::{Contributor, OrganizationProfile, RepoOwner, RepositoryProfile};
use leadscope_core::RepoRef;

use crate::analysis;
use crate::error::GithubError;
use crate::types::{ApiContributor, ApiOrg, ApiRepo, RepoSearchItem, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://api.github.com/";

/// How many top contributors to fetch per repository.
const CONTRIBUTOR_LIMIT: u32 = 10;

/// Client for the GitHub REST v3 API.
///
/// Manages the HTTP client, optional bearer token, and base URL. Use
/// [`GithubClient::new`] for production or [`GithubClient::with_base_url`]
/// to point at a mock server in tests.
pub struct GithubClient {
    client: Client,
    token: Option<String>,
    base_url: Url,
}

impl GithubClient {
    /// Creates a new client pointed at the production GitHub API.
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GithubError> {
        Self::with_base_url(token, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GithubError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GithubError::UnexpectedStatus`] if
    /// `base_url` is not parseable.
    pub fn with_base_url(
        token: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, GithubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Ensure the base URL ends with exactly one slash so joined paths
        // append rather than replace the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|_| GithubError::UnexpectedStatus {
            status: 0,
            url: base_url.to_owned(),
        })?;

        Ok(Self {
            client,
            token: token.map(ToOwned::to_owned),
            base_url,
        })
    }

    /// Fetches repository metadata and formats it into a
    /// [`RepositoryProfile`] skeleton (no languages/contributors/org yet,
    /// analysis zeroed). Most callers want [`GithubClient::analyze_repository`].
    ///
    /// # Errors
    ///
    /// - [`GithubError::NotFound`] — the repository does not exist (404).
    /// - [`GithubError::RateLimited`] — upstream quota exhausted (403/429).
    /// - [`GithubError::Unauthorized`] — rejected credentials (401).
    /// - [`GithubError::Http`] / [`GithubError::UnexpectedStatus`] /
    ///   [`GithubError::Deserialize`] — transport or response-shape failures.
    pub async fn get_repository(&self, repo: &RepoRef) -> Result<ApiRepo, GithubError> {
        let url = self.endpoint(&format!("repos/{}/{}", repo.owner(), repo.name()));
        let body = self.request_json(&url, &repo.to_string()).await?;
        serde_json::from_value(body).map_err(|e| GithubError::Deserialize {
            context: format!("repository {repo}"),
            source: e,
        })
    }

    /// Fetches the per-language byte histogram for a repository.
    ///
    /// # Errors
    ///
    /// Same classes as [`GithubClient::get_repository`].
    pub async fn get_languages(&self, repo: &RepoRef) -> Result<BTreeMap<String, i64>, GithubError> {
        let url = self.endpoint(&format!("repos/{}/{}/languages", repo.owner(), repo.name()));
        let body = self.request_json(&url, &repo.to_string()).await?;
        serde_json::from_value(body).map_err(|e| GithubError::Deserialize {
            context: format!("languages for {repo}"),
            source: e,
        })
    }

    /// Fetches the top contributors by contribution count (at most 10).
    ///
    /// # Errors
    ///
    /// Same classes as [`GithubClient::get_repository`].
    pub async fn get_contributors(&self, repo: &RepoRef) -> Result<Vec<Contributor>, GithubError> {
        let mut url = self.endpoint(&format!(
            "repos/{}/{}/contributors",
            repo.owner(),
            repo.name()
        ));
        url.query_pairs_mut()
            .append_pair("per_page", &CONTRIBUTOR_LIMIT.to_string());

        let body = self.request_json(&url, &repo.to_string()).await?;
        let raw: Vec<ApiContributor> =
            serde_json::from_value(body).map_err(|e| GithubError::Deserialize {
                context: format!("contributors for {repo}"),
                source: e,
            })?;

        Ok(raw
            .into_iter()
            .map(|c| Contributor {
                username: c.login,
                contributions: c.contributions,
                avatar: c.avatar_url,
                profile: c.html_url,
            })
            .collect())
    }

    /// Fetches the profile of an organization account.
    ///
    /// # Errors
    ///
    /// Same classes as [`GithubClient::get_repository`].
    pub async fn get_organization(&self, org: &str) -> Result<OrganizationProfile, GithubError> {
        let url = self.endpoint(&format!("orgs/{org}"));
        let body = self.request_json(&url, org).await?;
        let raw: ApiOrg = serde_json::from_value(body).map_err(|e| GithubError::Deserialize {
            context: format!("organization {org}"),
            source: e,
        })?;

        Ok(OrganizationProfile {
            name: raw.name,
            description: raw.description,
            website: raw.blog.filter(|b| !b.is_empty()),
            location: raw.location,
            email: raw.email,
            public_repos: raw.public_repos,
            followers: raw.followers,
            created_at: raw.created_at,
            avatar: raw.avatar_url,
        })
    }

    /// Searches repositories, returning trimmed listing items.
    ///
    /// # Errors
    ///
    /// Same classes as [`GithubClient::get_repository`].
    pub async fn search_repositories(
        &self,
        query: &str,
        sort: &str,
        order: &str,
        per_page: u32,
    ) -> Result<Vec<RepoSearchItem>, GithubError> {
        let mut url = self.endpoint("search/repositories");
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("sort", sort)
            .append_pair("order", order)
            .append_pair("per_page", &per_page.to_string());

        let body = self.request_json(&url, query).await?;
        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| GithubError::Deserialize {
                context: format!("repository search \"{query}\""),
                source: e,
            })?;

        Ok(response
            .items
            .into_iter()
            .map(|repo| RepoSearchItem {
                full_name: repo.full_name,
                description: repo.description,
                url: repo.html_url,
                stars: repo.stargazers_count,
                language: repo.language,
            })
            .collect())
    }

    /// Runs the full repository intelligence fetch.
    ///
    /// The repository itself is fetched first (its failure is the stage
    /// failure); languages, contributors, and — when the owner is an
    /// organization — the org profile are then fetched concurrently.
    /// Those secondary fetches degrade to empty/absent on error rather
    /// than failing the stage, logged at warn.
    ///
    /// # Errors
    ///
    /// Same classes as [`GithubClient::get_repository`], for the primary
    /// repository fetch only.
    pub async fn analyze_repository(
        &self,
        repo: &RepoRef,
        now: DateTime<Utc>,
    ) -> Result<RepositoryProfile, GithubError> {
        let raw = self.get_repository(repo).await?;
        let is_org = raw.owner.kind == "Organization";

        let (languages, contributors, organization) = futures::join!(
            self.get_languages(repo),
            self.get_contributors(repo),
            async {
                if is_org {
                    Some(self.get_organization(repo.owner()).await)
                } else {
                    None
                }
            }
        );

        let languages = languages.unwrap_or_else(|e| {
            tracing::warn!(repo = %repo, error = %e, "language fetch failed; continuing without");
            BTreeMap::new()
        });
        let contributors = contributors.unwrap_or_else(|e| {
            tracing::warn!(repo = %repo, error = %e, "contributor fetch failed; continuing without");
            Vec::new()
        });
        let organization = organization.and_then(|result| match result {
            Ok(org) => Some(org),
            Err(e) => {
                tracing::warn!(repo = %repo, error = %e, "organization fetch failed; continuing without");
                None
            }
        });

        Ok(build_profile(
            raw,
            languages,
            contributors,
            organization,
            now,
        ))
    }

    fn endpoint(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    /// Sends a GET request and maps HTTP status classes onto the error
    /// taxonomy before handing back the JSON body.
    async fn request_json(
        &self,
        url: &Url,
        resource: &str,
    ) -> Result<serde_json::Value, GithubError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(GithubError::NotFound {
                resource: resource.to_owned(),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(GithubError::Unauthorized);
        }
        // GitHub reports an exhausted quota as 403, occasionally 429.
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GithubError::RateLimited {
                resource: resource.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(GithubError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GithubError::Deserialize {
            context: format!("response body for {resource}"),
            source: e,
        })
    }
}

/// Folds the raw API responses into the domain [`RepositoryProfile`].
fn build_profile(
    raw: ApiRepo,
    languages: BTreeMap<String, i64>,
    contributors: Vec<Contributor>,
    organization: Option<OrganizationProfile>,
    now: DateTime<Utc>,
) -> RepositoryProfile {
    let language_names: Vec<String> = languages.keys().cloned().collect();
    let license = raw.license.map(|l| l.name);
    let homepage = raw.homepage.filter(|h| !h.is_empty());

    let analysis = analysis::analyze(
        raw.pushed_at,
        raw.stargazers_count,
        raw.forks_count,
        raw.watchers_count,
        raw.open_issues_count,
        homepage.as_deref(),
        license.as_deref(),
        &language_names,
        &contributors,
        now,
    );

    RepositoryProfile {
        id: raw.id,
        name: raw.name,
        full_name: raw.full_name,
        owner: RepoOwner {
            username: raw.owner.login,
            kind: raw.owner.kind,
            avatar: raw.owner.avatar_url,
            url: raw.owner.html_url,
        },
        description: raw.description,
        url: raw.html_url,
        homepage,
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        watchers: raw.watchers_count,
        open_issues: raw.open_issues_count,
        language: raw.language,
        topics: raw.topics,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
        pushed_at: raw.pushed_at,
        size: raw.size,
        has_issues: raw.has_issues,
        has_wiki: raw.has_wiki,
        license,
        languages,
        contributors,
        organization,
        analysis,
    }
}

//! The enrichment pipeline: sequences the four source adapters for one
//! subject, merges their outputs, and scores the result.
//!
//! Degradation is the rule, not the exception: any stage that fails
//! after retries becomes an absent sub-profile and the run continues —
//! a lead with partial data is still a lead. The only failures that
//! abort a run are terminal source-control errors when the repository
//! was the sole subject.

use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use leadscope_core::profile::{
    CompanyProfile, ContactProfile, OrganizationProfile, RepositoryProfile, TechnologyProfile,
};
use leadscope_core::{
    normalize_website_key, AppConfig, LeadMetadata, LeadProfile, LeadSource, RepoRef, Subject,
};
use leadscope_github::{GithubClient, GithubError};
use leadscope_webscan::{
    extract_contacts, research_company, CompanyHints, ContactHints, PageClient,
};

use crate::cache::TtlCache;
use crate::progress::ProgressReporter;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::scoring::score_lead;

/// Fixed progress checkpoints, reported at stage boundaries.
mod checkpoint {
    pub const START: u8 = 0;
    pub const REPO_START: u8 = 10;
    pub const REPO_DONE: u8 = 25;
    pub const TECH_START: u8 = 30;
    pub const TECH_DONE: u8 = 50;
    pub const CONTACT_START: u8 = 55;
    pub const CONTACT_DONE: u8 = 70;
    pub const COMPANY_START: u8 = 75;
    pub const COMPANY_DONE: u8 = 90;
    pub const SCORING: u8 = 95;
    pub const READY_TO_PERSIST: u8 = 98;
}

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("repository {repo} was not found upstream")]
    RepoNotFound { repo: String },

    #[error("rate limited by the source-control API while fetching {repo}")]
    RateLimited { repo: String },

    #[error("source-control API credentials were rejected")]
    Unauthorized,
}

/// Tuning knobs for one service instance.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub retry: RetryPolicy,
    pub cache_ttl: Duration,
}

impl ServiceConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            retry: RetryPolicy::new(
                config.retry_max_attempts,
                config.retry_base_delay_ms,
                config.retry_max_delay_ms,
            ),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Stateless enrichment service: clients in, lead profiles out.
///
/// Constructed once at process start and shared by reference between
/// worker loops; the caches are the only mutable state and are safe for
/// concurrent use.
pub struct EnrichmentService {
    github: GithubClient,
    pages: PageClient,
    retry: RetryPolicy,
    lead_cache: TtlCache<LeadProfile>,
    repo_cache: TtlCache<RepositoryProfile>,
    tech_cache: TtlCache<TechnologyProfile>,
    contact_cache: TtlCache<ContactProfile>,
    company_cache: TtlCache<CompanyProfile>,
}

impl EnrichmentService {
    #[must_use]
    pub fn new(github: GithubClient, pages: PageClient, config: ServiceConfig) -> Self {
        Self {
            github,
            pages,
            retry: config.retry,
            lead_cache: TtlCache::new(config.cache_ttl),
            repo_cache: TtlCache::new(config.cache_ttl),
            tech_cache: TtlCache::new(config.cache_ttl),
            contact_cache: TtlCache::new(config.cache_ttl),
            company_cache: TtlCache::new(config.cache_ttl),
        }
    }

    /// Runs the full pipeline for one subject.
    ///
    /// Stage order is fixed: repository → technology → contacts →
    /// company → scoring, with the homepage fallback decided immediately
    /// after the repository stage. Progress is reported at each
    /// checkpoint and never decreases.
    ///
    /// # Errors
    ///
    /// Returns [`EnrichError`] only for terminal source-control failures
    /// (not-found, rate-limit, credentials) on a subject with no website
    /// to fall back to. Everything else degrades.
    pub async fn enrich(
        &self,
        subject: &Subject,
        progress: &ProgressReporter,
    ) -> Result<LeadProfile, EnrichError> {
        let subject_key = subject.cache_key();
        progress.report(checkpoint::START);

        let lead_key = format!("lead:{subject_key}");
        if let Some(cached) = self.lead_cache.get(&lead_key).await {
            tracing::info!(subject = %subject_key, "lead cache hit; skipping fetch stages");
            progress.report(checkpoint::READY_TO_PERSIST);
            return Ok(cached);
        }

        let now = Utc::now();

        // Stage 1: repository intelligence.
        let mut repository: Option<RepositoryProfile> = None;
        if let Some(repo_ref) = &subject.github {
            progress.report(checkpoint::REPO_START);
            repository = self
                .repository_stage(repo_ref, subject.website.is_none())
                .await?;
            progress.report(checkpoint::REPO_DONE);
        }

        // The homepage fallback is an explicit decision taken exactly here,
        // before any website-dependent stage runs.
        let website = resolve_website(subject.website.as_deref(), repository.as_ref());

        let organization = repository.as_ref().and_then(|r| r.organization.clone());
        let company_seed = organization.as_ref().map(company_from_org);

        let mut technology: Option<TechnologyProfile> = None;
        let mut contact: Option<ContactProfile> = None;
        let mut company: Option<CompanyProfile> = company_seed.clone();

        if let Some(site) = &website {
            let site_key = normalize_website_key(site);

            // Stage 2: technology fingerprint.
            progress.report(checkpoint::TECH_START);
            technology = self.technology_stage(site, &site_key, now).await;
            progress.report(checkpoint::TECH_DONE);

            // Stage 3: contact extraction.
            progress.report(checkpoint::CONTACT_START);
            contact = Some(
                self.contact_stage(site, &site_key, organization.as_ref(), repository.as_ref())
                    .await,
            );
            progress.report(checkpoint::CONTACT_DONE);

            // Stage 4: company research.
            progress.report(checkpoint::COMPANY_START);
            company = self
                .company_stage(
                    site,
                    &site_key,
                    organization.as_ref(),
                    repository.as_ref(),
                    company_seed,
                    now,
                )
                .await;
            progress.report(checkpoint::COMPANY_DONE);
        }

        // Stage 5: scoring. Pure; a failure here would be a programming
        // error, not a degraded stage.
        progress.report(checkpoint::SCORING);
        let mut lead = LeadProfile {
            repository,
            technology,
            contact,
            company,
            engagement: None,
            metadata: LeadMetadata {
                analyzed_at: now,
                source: if subject.github.is_some() {
                    LeadSource::Github
                } else {
                    LeadSource::Website
                },
                url: website,
            },
            scoring: None,
        };
        lead.scoring = Some(score_lead(&lead, now));

        progress.report(checkpoint::READY_TO_PERSIST);
        self.lead_cache.insert(&lead_key, lead.clone()).await;

        Ok(lead)
    }

    /// Repository stage: cache, then retry-wrapped fetch.
    ///
    /// A terminal failure aborts the run only when there is no website
    /// to continue with; everything else degrades to `None`.
    async fn repository_stage(
        &self,
        repo_ref: &RepoRef,
        website_absent: bool,
    ) -> Result<Option<RepositoryProfile>, EnrichError> {
        let cache_key = format!("repo:{repo_ref}");
        if let Some(hit) = self.repo_cache.get(&cache_key).await {
            return Ok(Some(hit));
        }

        let fetched = retry_with_backoff(self.retry, || {
            self.github.analyze_repository(repo_ref, Utc::now())
        })
        .await;

        match fetched {
            Ok(profile) => {
                self.repo_cache.insert(&cache_key, profile.clone()).await;
                Ok(Some(profile))
            }
            Err(e) if e.is_terminal() && website_absent => Err(terminal_error(&e, repo_ref)),
            Err(e) => {
                tracing::warn!(stage = "repository", repo = %repo_ref, error = %e, "stage degraded");
                Ok(None)
            }
        }
    }

    async fn technology_stage(
        &self,
        site: &str,
        site_key: &str,
        now: chrono::DateTime<Utc>,
    ) -> Option<TechnologyProfile> {
        let cache_key = format!("tech:{site_key}");
        if let Some(hit) = self.tech_cache.get(&cache_key).await {
            return Some(hit);
        }

        let fetched = retry_with_backoff(self.retry, || {
            leadscope_webscan::detect_technologies(&self.pages, site, now)
        })
        .await;

        match fetched {
            Ok(profile) => {
                self.tech_cache.insert(&cache_key, profile.clone()).await;
                Some(profile)
            }
            Err(e) => {
                tracing::warn!(stage = "technology", site, error = %e, "stage degraded");
                None
            }
        }
    }

    /// Contact stage. The extractor itself never fails (a dead page
    /// degrades to an empty profile), so there is nothing to retry.
    async fn contact_stage(
        &self,
        site: &str,
        site_key: &str,
        organization: Option<&OrganizationProfile>,
        repository: Option<&RepositoryProfile>,
    ) -> ContactProfile {
        let cache_key = format!("contact:{site_key}");
        if let Some(hit) = self.contact_cache.get(&cache_key).await {
            return hit;
        }

        let hints = ContactHints {
            email: organization.and_then(|org| org.email.clone()),
            github_url: repository.map(|repo| repo.owner.url.clone()),
        };

        let profile = extract_contacts(&self.pages, site, &hints).await;
        self.contact_cache.insert(&cache_key, profile.clone()).await;
        profile
    }

    /// Company stage: page research merged over the organization seed.
    /// On failure the seed alone survives (it may be `None`).
    async fn company_stage(
        &self,
        site: &str,
        site_key: &str,
        organization: Option<&OrganizationProfile>,
        repository: Option<&RepositoryProfile>,
        seed: Option<CompanyProfile>,
        now: chrono::DateTime<Utc>,
    ) -> Option<CompanyProfile> {
        let cache_key = format!("company:{site_key}");
        if let Some(hit) = self.company_cache.get(&cache_key).await {
            return Some(merge_company(seed, hit));
        }

        let hints = CompanyHints {
            name: organization.and_then(|org| org.name.clone()),
            location: organization.and_then(|org| org.location.clone()),
            public_repos: organization.map(|org| org.public_repos),
            contributor_count: repository.map(|repo| repo.contributors.len()),
        };

        let fetched =
            retry_with_backoff(self.retry, || research_company(&self.pages, site, &hints, now))
                .await;

        match fetched {
            Ok(profile) => {
                self.company_cache.insert(&cache_key, profile.clone()).await;
                Some(merge_company(seed, profile))
            }
            Err(e) => {
                tracing::warn!(stage = "company", site, error = %e, "stage degraded");
                seed
            }
        }
    }
}

/// The homepage fallback: the explicit website always wins; a repository
/// homepage substitutes only when no website was given.
fn resolve_website(
    explicit: Option<&str>,
    repository: Option<&RepositoryProfile>,
) -> Option<String> {
    match explicit {
        Some(site) => Some(site.to_owned()),
        None => repository.and_then(|repo| repo.homepage.clone()),
    }
}

/// Seeds a company profile from the owning GitHub organization, used
/// when company research is skipped or fails.
fn company_from_org(org: &OrganizationProfile) -> CompanyProfile {
    CompanyProfile {
        domain: org
            .website
            .as_deref()
            .map(normalize_website_key)
            .map(|key| key.split('/').next().unwrap_or(&key).to_owned())
            .unwrap_or_default(),
        name: org.name.clone(),
        description: org.description.clone(),
        location: org.location.clone(),
        email: org.email.clone(),
        website: org.website.clone(),
        created_at: org.created_at,
        public_repos: Some(org.public_repos),
        followers: Some(org.followers),
        confidence: 0.5,
        ..CompanyProfile::default()
    }
}

/// Order-preserving merge: researched fields win, organization-derived
/// fields fill the gaps.
fn merge_company(seed: Option<CompanyProfile>, researched: CompanyProfile) -> CompanyProfile {
    let Some(seed) = seed else {
        return researched;
    };

    let mut merged = researched;
    merged.name = merged.name.or(seed.name);
    merged.description = merged.description.or(seed.description);
    merged.location = merged.location.or(seed.location);
    merged.email = merged.email.or(seed.email);
    merged.website = merged.website.or(seed.website);
    merged.created_at = merged.created_at.or(seed.created_at);
    merged.public_repos = merged.public_repos.or(seed.public_repos);
    merged.followers = merged.followers.or(seed.followers);
    if merged.domain.is_empty() {
        merged.domain = seed.domain;
    }
    merged
}

fn terminal_error(error: &GithubError, repo_ref: &RepoRef) -> EnrichError {
    match error {
        GithubError::RateLimited { .. } => EnrichError::RateLimited {
            repo: repo_ref.to_string(),
        },
        GithubError::Unauthorized => EnrichError::Unauthorized,
        _ => EnrichError::RepoNotFound {
            repo: repo_ref.to_string(),
        },
    }
}

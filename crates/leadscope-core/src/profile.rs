//! Typed sub-profiles produced by the four enrichment stages.
//!
//! Each stage yields one of these; the merged lead carries them as
//! `Option`s so a degraded stage is an absent field, never a sentinel.
//! Maps use `BTreeMap` so serialized output is stable across runs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Repository intelligence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    pub username: String,
    /// Upstream account kind, `"User"` or `"Organization"`.
    pub kind: String,
    pub avatar: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub username: String,
    pub contributions: i64,
    pub avatar: String,
    pub profile: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub public_repos: i64,
    pub followers: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub avatar: String,
}

/// Derived signals computed from the raw repository data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoAnalysis {
    /// Recency of pushes, stepped into [0.2, 1.0].
    pub activity_score: f64,
    /// Stars/forks/watchers blend, clamped to [0, 1].
    pub popularity_score: f64,
    pub tech_stack: Vec<String>,
    pub is_active: bool,
    pub is_popular: bool,
    pub team_size: usize,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryProfile {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub description: Option<String>,
    pub url: String,
    pub homepage: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub watchers: i64,
    pub open_issues: i64,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub size: i64,
    pub has_issues: bool,
    pub has_wiki: bool,
    pub license: Option<String>,
    /// Bytes of code per language.
    pub languages: BTreeMap<String, i64>,
    /// Top contributors by contribution count, at most 10.
    pub contributors: Vec<Contributor>,
    pub organization: Option<OrganizationProfile>,
    pub analysis: RepoAnalysis,
}

// ---------------------------------------------------------------------------
// Technology fingerprint
// ---------------------------------------------------------------------------

/// One detected technology with its fixed per-signal confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
}

impl Detection {
    #[must_use]
    pub fn new(name: &str, confidence: f64) -> Self {
        Self {
            name: name.to_owned(),
            confidence,
        }
    }
}

/// The eight fixed fingerprint categories, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechCategory {
    Frontend,
    Backend,
    Analytics,
    Hosting,
    Cms,
    Ecommerce,
    Marketing,
    Security,
}

impl TechCategory {
    pub const ALL: [TechCategory; 8] = [
        TechCategory::Frontend,
        TechCategory::Backend,
        TechCategory::Analytics,
        TechCategory::Hosting,
        TechCategory::Cms,
        TechCategory::Ecommerce,
        TechCategory::Marketing,
        TechCategory::Security,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TechCategory::Frontend => "frontend",
            TechCategory::Backend => "backend",
            TechCategory::Analytics => "analytics",
            TechCategory::Hosting => "hosting",
            TechCategory::Cms => "cms",
            TechCategory::Ecommerce => "ecommerce",
            TechCategory::Marketing => "marketing",
            TechCategory::Security => "security",
        }
    }
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnologyMap {
    pub frontend: Vec<Detection>,
    pub backend: Vec<Detection>,
    pub analytics: Vec<Detection>,
    pub hosting: Vec<Detection>,
    pub cms: Vec<Detection>,
    pub ecommerce: Vec<Detection>,
    pub marketing: Vec<Detection>,
    pub security: Vec<Detection>,
}

impl TechnologyMap {
    #[must_use]
    pub fn category(&self, category: TechCategory) -> &[Detection] {
        match category {
            TechCategory::Frontend => &self.frontend,
            TechCategory::Backend => &self.backend,
            TechCategory::Analytics => &self.analytics,
            TechCategory::Hosting => &self.hosting,
            TechCategory::Cms => &self.cms,
            TechCategory::Ecommerce => &self.ecommerce,
            TechCategory::Marketing => &self.marketing,
            TechCategory::Security => &self.security,
        }
    }

    /// All detections across every category, in fixed category order.
    pub fn iter_all(&self) -> impl Iterator<Item = &Detection> {
        TechCategory::ALL
            .into_iter()
            .flat_map(|c| self.category(c).iter())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter_all().next().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologyProfile {
    /// The absolute URL that was fetched.
    pub url: String,
    pub technologies: TechnologyMap,
    /// Arithmetic mean of every detection confidence; 0 when none.
    pub confidence: f64,
    /// One `"category: Name, Name"` line per non-empty category.
    pub summary: Vec<String>,
    pub detected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    General,
    Sales,
    Support,
    Personal,
    Admin,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailContact {
    pub email: String,
    pub kind: EmailKind,
    pub confidence: f64,
}

/// The fixed social platforms recognized by the contact extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Linkedin,
    Facebook,
    Instagram,
    Github,
    Youtube,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 6] = [
        SocialPlatform::Twitter,
        SocialPlatform::Linkedin,
        SocialPlatform::Facebook,
        SocialPlatform::Instagram,
        SocialPlatform::Github,
        SocialPlatform::Youtube,
    ];

    /// Hostname fragments that identify links to this platform.
    #[must_use]
    pub fn domains(self) -> &'static [&'static str] {
        match self {
            SocialPlatform::Twitter => &["twitter.com", "x.com"],
            SocialPlatform::Linkedin => &["linkedin.com"],
            SocialPlatform::Facebook => &["facebook.com"],
            SocialPlatform::Instagram => &["instagram.com"],
            SocialPlatform::Github => &["github.com"],
            SocialPlatform::Youtube => &["youtube.com"],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactProfile {
    pub emails: Vec<EmailContact>,
    pub phones: Vec<String>,
    pub social: BTreeMap<SocialPlatform, String>,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Company research
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebsiteMeta {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialProof {
    /// Raw customer count as it appeared on the page, commas stripped.
    pub customers: Option<String>,
    pub testimonials: Option<usize>,
    pub awards: Option<usize>,
    pub press_mentions: Option<usize>,
}

impl SocialProof {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customers.is_none()
            && self.testimonials.is_none()
            && self.awards.is_none()
            && self.press_mentions.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub domain: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// One of the fixed industry taxonomy entries, or "General".
    pub industry: Option<String>,
    pub location: Option<String>,
    pub founded_year: Option<i32>,
    /// Size bucket label, e.g. "Small (5-20 employees)".
    pub size: Option<String>,
    // Fields below are seeded from the owning GitHub organization when one
    // is known; page research never overwrites a present value.
    pub email: Option<String>,
    pub website: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub public_repos: Option<i64>,
    pub followers: Option<i64>,
    pub site: WebsiteMeta,
    pub business_model: Vec<String>,
    /// Up to 10 feature/benefit strings lifted from the page.
    pub features: Vec<String>,
    pub social_proof: SocialProof,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

/// Optional engagement annotations carried on a lead for re-scoring.
/// No enrichment stage populates this; external callers may.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngagementProfile {
    pub last_update: Option<DateTime<Utc>>,
    pub social_activity: Option<f64>,
}

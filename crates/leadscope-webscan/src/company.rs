//! Company research: builds a company profile from the lead's website,
//! optionally seeded with hints from repository intelligence.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;

use leadscope_core::normalize_website_key;
use leadscope_core::profile::{CompanyProfile, SocialProof, WebsiteMeta};

use crate::error::WebscanError;
use crate::html;
use crate::page::{FetchedPage, PageClient};
use crate::whois;

static FOUNDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:founded|since|est).{0,20}?(\d{4})").expect("valid founded regex")
});
static CUSTOMER_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\+?\s*(?:customers?|users?|clients?)").expect("valid regex")
});

/// The fixed industry taxonomy, keyword-matched in order; first hit wins.
const INDUSTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("SaaS", &["saas", "software as a service", "cloud software", "platform"]),
    ("E-commerce", &["shop", "store", "buy", "cart", "checkout", "products"]),
    ("Fintech", &["finance", "payment", "banking", "financial", "crypto"]),
    ("Healthcare", &["health", "medical", "healthcare", "patient", "clinic"]),
    ("Education", &["education", "learning", "course", "training", "school"]),
    ("Marketing", &["marketing", "advertising", "analytics", "seo", "social media"]),
    ("Development", &["developer", "api", "code", "programming", "development"]),
    ("Design", &["design", "creative", "graphics", "ui", "ux"]),
    ("Consulting", &["consulting", "advisory", "services"]),
];

const BUSINESS_MODEL_KEYWORDS: &[(&str, &[&str])] = &[
    ("Subscription", &["pricing", "subscribe", "plan"]),
    ("Freemium", &["free trial", "freemium"]),
    ("Enterprise", &["enterprise", "custom pricing"]),
    ("Marketplace", &["marketplace", "sellers"]),
    ("Ad-supported", &["advertising", "ad-free"]),
];

const MAX_FEATURES: usize = 10;

/// Hints carried over from repository intelligence.
#[derive(Debug, Clone, Default)]
pub struct CompanyHints {
    pub name: Option<String>,
    pub location: Option<String>,
    pub public_repos: Option<i64>,
    pub contributor_count: Option<usize>,
}

impl CompanyHints {
    fn has_repo_signals(&self) -> bool {
        self.public_repos.is_some() || self.contributor_count.is_some()
    }
}

/// Researches a company from its website.
///
/// # Errors
///
/// - [`WebscanError::Http`] — network failure or timeout (retryable).
/// - [`WebscanError::UnexpectedStatus`] — non-2xx response.
pub async fn research_company(
    client: &PageClient,
    raw_url: &str,
    hints: &CompanyHints,
    now: DateTime<Utc>,
) -> Result<CompanyProfile, WebscanError> {
    let page = client.fetch(raw_url).await?;
    Ok(build_company_profile(&page, raw_url, hints, now))
}

/// Pure profile assembly from an already-fetched page.
#[must_use]
pub fn build_company_profile(
    page: &FetchedPage,
    raw_url: &str,
    hints: &CompanyHints,
    now: DateTime<Utc>,
) -> CompanyProfile {
    let domain = domain_of(raw_url);
    let page_html = page.html.as_str();
    let page_text = html::strip_tags(page_html);

    let title = html::extract_title(page_html).unwrap_or_default();
    let description = html::find_meta_content(page_html, "name", "description").unwrap_or_default();
    let keywords: Vec<String> = html::find_meta_content(page_html, "name", "keywords")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let name = page_company_name(page_html, &title)
        .or_else(|| hints.name.clone())
        .or_else(|| name_from_domain(&domain));

    let industry = detect_industry(&page_text, &keywords);
    let location = hints.location.clone().or_else(|| page_location(page_html));
    let whois_record = whois::lookup(&domain);
    let founded_year = founded_year(&page_text, whois_record.as_ref(), now);
    let size = company_size(hints);
    let business_model = business_model(&page_text);
    let features = extract_features(page_html);
    let social_proof = social_proof(page_html, &page_text);

    let confidence = research_confidence(&title, &description, &industry, hints, &social_proof);

    CompanyProfile {
        domain,
        name,
        description: Some(description.clone()).filter(|d| !d.is_empty()),
        industry: Some(industry),
        location,
        founded_year,
        size,
        email: None,
        website: None,
        created_at: None,
        public_repos: hints.public_repos,
        followers: None,
        site: WebsiteMeta {
            title,
            description,
            keywords,
        },
        business_model,
        features,
        social_proof,
        confidence,
    }
}

fn domain_of(raw_url: &str) -> String {
    let key = normalize_website_key(raw_url);
    key.split('/').next().unwrap_or(&key).to_owned()
}

/// Company name from the page, first non-empty of: og:site_name,
/// application-name meta, logo alt text, brand header text, first title
/// segment.
fn page_company_name(page_html: &str, title: &str) -> Option<String> {
    if let Some(name) = html::find_meta_content(page_html, "property", "og:site_name") {
        return Some(name);
    }
    if let Some(name) = html::find_meta_content(page_html, "name", "application-name") {
        return Some(name);
    }
    if let Some(alt) = html::logo_alt_text(page_html) {
        return Some(alt);
    }
    if let Some(brand) = html::texts_with_class_fragment(page_html, &["brand"])
        .into_iter()
        .find(|t| !t.is_empty())
    {
        return Some(brand);
    }

    let first_segment = title
        .split('|')
        .next()
        .unwrap_or(title)
        .split('-')
        .next()
        .unwrap_or(title)
        .trim();
    if first_segment.is_empty() {
        None
    } else {
        Some(first_segment.to_owned())
    }
}

/// Capitalized first label of the domain, the last-resort name.
fn name_from_domain(domain: &str) -> Option<String> {
    let label = domain.split('.').next().unwrap_or(domain);
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

fn detect_industry(page_text: &str, keywords: &[String]) -> String {
    let content = page_text.to_lowercase();
    let keywords = keywords.join(",").to_lowercase();

    for (industry, terms) in INDUSTRY_KEYWORDS {
        if terms
            .iter()
            .any(|t| content.contains(t) || keywords.contains(t))
        {
            return (*industry).to_owned();
        }
    }

    "General".to_owned()
}

/// Location from structured/semantic markup, first non-empty source.
fn page_location(page_html: &str) -> Option<String> {
    if let Some(region) = html::find_meta_content(page_html, "name", "geo.region") {
        return Some(region);
    }
    if let Some(address) = html::named_element_texts(page_html, "address")
        .into_iter()
        .find(|t| !t.is_empty())
    {
        return Some(address);
    }
    if let Some(address) = html::texts_with_attr_fragment(page_html, "itemprop", &["address"])
        .into_iter()
        .find(|t| !t.is_empty())
    {
        return Some(address);
    }
    html::texts_with_class_fragment(page_html, &["location", "address"])
        .into_iter()
        .find(|t| !t.is_empty())
}

/// Founded year from page text (`founded|since|est` near a 4-digit year
/// in [1900, current year]), falling back to the WHOIS creation date.
fn founded_year(
    page_text: &str,
    whois_record: Option<&whois::WhoisRecord>,
    now: DateTime<Utc>,
) -> Option<i32> {
    let current_year = now.year();

    for caps in FOUNDED_RE.captures_iter(page_text) {
        if let Some(year) = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()) {
            if (1900..=current_year).contains(&year) {
                return Some(year);
            }
        }
    }

    whois_record
        .and_then(|record| record.creation_date)
        .map(|d| d.year())
}

/// Size bucket from repository hints; `None` without hints.
fn company_size(hints: &CompanyHints) -> Option<String> {
    if let Some(repos) = hints.public_repos {
        let bucket = if repos > 50 {
            "Large (50+ employees)"
        } else if repos > 20 {
            "Medium (20-50 employees)"
        } else if repos > 5 {
            "Small (5-20 employees)"
        } else {
            "Startup (1-5 employees)"
        };
        return Some(bucket.to_owned());
    }

    if let Some(count) = hints.contributor_count {
        let bucket = if count > 20 {
            "Large (50+ employees)"
        } else if count > 10 {
            "Medium (20-50 employees)"
        } else if count > 3 {
            "Small (5-20 employees)"
        } else {
            "Startup (1-5 employees)"
        };
        return Some(bucket.to_owned());
    }

    None
}

fn business_model(page_text: &str) -> Vec<String> {
    let content = page_text.to_lowercase();
    let mut models: Vec<String> = Vec::new();

    for (model, terms) in BUSINESS_MODEL_KEYWORDS {
        if terms.iter().any(|t| content.contains(t)) {
            models.push((*model).to_owned());
        }
    }

    if models.is_empty() {
        models.push("Unknown".to_owned());
    }
    models
}

/// Up to 10 feature strings: feature/benefit/service-classed elements
/// first (text length 10–200), then generic list items (10–150).
fn extract_features(page_html: &str) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();

    for text in html::texts_with_class_fragment(page_html, &["feature", "benefit", "service"]) {
        if features.len() >= MAX_FEATURES {
            break;
        }
        if (10..200).contains(&text.len()) && !features.contains(&text) {
            features.push(text);
        }
    }

    for text in html::list_item_texts(page_html) {
        if features.len() >= MAX_FEATURES {
            break;
        }
        if (10..150).contains(&text.len()) && !features.contains(&text) {
            features.push(text);
        }
    }

    features
}

fn social_proof(page_html: &str, page_text: &str) -> SocialProof {
    let customers = CUSTOMER_COUNT_RE
        .captures(page_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace(',', ""));

    let testimonials = html::count_class_fragment(page_html, &["testimonial", "review"]);
    let awards = html::count_class_fragment(page_html, &["award", "certification", "badge"]);
    let press = html::count_class_fragment(page_html, &["press", "featured", "media"]);

    SocialProof {
        customers,
        testimonials: Some(testimonials).filter(|c| *c > 0),
        awards: Some(awards).filter(|c| *c > 0),
        press_mentions: Some(press).filter(|c| *c > 0),
    }
}

/// Mean of the fixed weights for whichever signals fired; 0.5 when none.
fn research_confidence(
    title: &str,
    description: &str,
    industry: &str,
    hints: &CompanyHints,
    social_proof: &SocialProof,
) -> f64 {
    let mut total = 0.0;
    let mut factors = 0u32;

    if !title.is_empty() {
        total += 0.9;
        factors += 1;
    }
    if !description.is_empty() {
        total += 0.8;
        factors += 1;
    }
    if industry != "General" {
        total += 0.7;
        factors += 1;
    }
    if hints.has_repo_signals() {
        total += 0.95;
        factors += 1;
    }
    if !social_proof.is_empty() {
        total += 0.85;
        factors += 1;
    }

    if factors == 0 {
        return 0.5;
    }
    (total / f64::from(factors) * 100.0).round() / 100.0
}

//! Contact extraction: emails, phone numbers, and social links scraped
//! from a lead's website plus one same-site contact/about page.
//!
//! This adapter never fails: a page that cannot be fetched yields an
//! empty profile with confidence 0, and side-channel hints (an
//! organization email already known from repository intelligence) are
//! merged in regardless.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use leadscope_core::profile::{ContactProfile, EmailContact, EmailKind, SocialPlatform};

use crate::html;
use crate::page::PageClient;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9._-]+\.[A-Za-z0-9._-]+").expect("valid email regex")
});
static EMAIL_VALID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
        .expect("valid phone regex")
});

/// Substrings that disqualify a scraped address: placeholder domains,
/// site-builder internals, and image paths the loose regex can pick up.
const EMAIL_BLACKLIST: &[&str] = &[
    "example.com",
    "test.com",
    "localhost",
    ".png",
    ".jpg",
    ".gif",
    "wix.com",
    "wordpress.com",
];

const FREE_MAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "hotmail.com"];

/// Side-channel contact data already known from other stages.
#[derive(Debug, Clone, Default)]
pub struct ContactHints {
    /// Organization email from repository intelligence.
    pub email: Option<String>,
    /// Repository owner profile URL, recorded as the github social link.
    pub github_url: Option<String>,
}

/// Scrapes contact information from `raw_url` and merges in `hints`.
///
/// Fetches the page, scans for emails (content + `mailto:` links), phone
/// numbers (content + `tel:` links), and social links against the fixed
/// platform table, then additionally scans one contact/about page
/// reachable by a same-site link. Page-fetch failures degrade to the
/// empty scrape — they are logged, never propagated.
pub async fn extract_contacts(
    client: &PageClient,
    raw_url: &str,
    hints: &ContactHints,
) -> ContactProfile {
    let mut emails: Vec<String> = Vec::new();
    let mut phones: Vec<String> = Vec::new();
    let mut social: BTreeMap<SocialPlatform, String> = BTreeMap::new();

    match client.fetch(raw_url).await {
        Ok(page) => {
            emails.extend(find_emails(&page.html));
            phones.extend(find_phones(&page.html));
            social.extend(find_social_links(&page.html));

            if let Some(contact_url) = find_contact_page(&page.html, &page.url) {
                match client.fetch(&contact_url).await {
                    Ok(contact_page) => {
                        emails.extend(find_emails(&contact_page.html));
                        phones.extend(find_phones(&contact_page.html));
                        social.extend(find_social_links(&contact_page.html));
                    }
                    Err(e) => {
                        tracing::debug!(url = %contact_url, error = %e, "contact page fetch failed");
                    }
                }
            }
        }
        Err(e) => {
            tracing::warn!(url = raw_url, error = %e, "website fetch failed; contact scrape degraded to hints only");
        }
    }

    if let Some(email) = &hints.email {
        emails.push(email.clone());
    }
    if let Some(url) = &hints.github_url {
        social.insert(SocialPlatform::Github, url.clone());
    }

    let emails = dedupe_emails(emails);
    let phones = dedupe_phones(phones);
    let confidence = contact_confidence(emails.len(), phones.len(), social.len());

    ContactProfile {
        emails: emails.into_iter().map(categorize_email).collect(),
        phones,
        social,
        confidence,
    }
}

/// Emails from page content and `mailto:` links, lower-cased and
/// filtered through the blacklist.
fn find_emails(page_html: &str) -> Vec<String> {
    let mut out = Vec::new();

    for m in EMAIL_RE.find_iter(page_html) {
        // The loose scan regex can swallow a sentence period after the TLD.
        let email = m.as_str().trim_end_matches('.').to_lowercase();
        if is_acceptable_email(&email) && !out.contains(&email) {
            out.push(email);
        }
    }

    for href in html::anchor_hrefs(page_html) {
        if let Some(rest) = href.strip_prefix("mailto:") {
            let email = rest.split('?').next().unwrap_or(rest).trim().to_lowercase();
            if is_acceptable_email(&email) && !out.contains(&email) {
                out.push(email);
            }
        }
    }

    out
}

/// Phones from `tel:` links and page content. Content matches must keep
/// at least 10 characters after whitespace collapse; `tel:` targets are
/// taken as-is.
fn find_phones(page_html: &str) -> Vec<String> {
    let mut out = Vec::new();

    for href in html::anchor_hrefs(page_html) {
        if let Some(rest) = href.strip_prefix("tel:") {
            let phone = rest.trim().to_owned();
            if !phone.is_empty() && !out.contains(&phone) {
                out.push(phone);
            }
        }
    }

    for m in PHONE_RE.find_iter(page_html) {
        let cleaned = html::clean_text(m.as_str());
        if cleaned.len() >= 10 && !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }

    out
}

/// Social links matched against the fixed platform-domain table. A later
/// link for the same platform replaces the earlier one.
fn find_social_links(page_html: &str) -> BTreeMap<SocialPlatform, String> {
    let mut out = BTreeMap::new();

    for href in html::anchor_hrefs(page_html) {
        for platform in SocialPlatform::ALL {
            if platform.domains().iter().any(|d| href.contains(d)) {
                out.insert(platform, href.clone());
                break;
            }
        }
    }

    out
}

/// First same-site link whose target mentions contact or about, resolved
/// against the page URL.
fn find_contact_page(page_html: &str, base_url: &str) -> Option<String> {
    html::anchor_hrefs(page_html)
        .into_iter()
        .find(|href| {
            let lower = href.to_lowercase();
            lower.contains("contact") || lower.contains("about")
        })
        .and_then(|href| html::absolutize_url(base_url, &href))
}

fn is_acceptable_email(email: &str) -> bool {
    if EMAIL_BLACKLIST.iter().any(|item| email.contains(item)) {
        return false;
    }
    EMAIL_VALID_RE.is_match(email)
}

/// Case-insensitive dedup on the full address, keeping first occurrence.
fn dedupe_emails(emails: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for email in emails {
        let normalized = email.to_lowercase();
        if !seen.contains(&normalized) {
            seen.push(normalized);
            out.push(email);
        }
    }
    out
}

/// Dedup ignoring every non-digit character, keeping first occurrence.
fn dedupe_phones(phones: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for phone in phones {
        let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
        if !seen.contains(&digits) {
            seen.push(digits);
            out.push(phone);
        }
    }
    out
}

/// Classifies an address by local-part keywords and attaches the fixed
/// per-kind confidence, with a penalty for free-mail domains.
fn categorize_email(email: String) -> EmailContact {
    let kind = email_kind(&email);
    let confidence = email_confidence(&email, kind);
    EmailContact {
        email,
        kind,
        confidence,
    }
}

fn email_kind(email: &str) -> EmailKind {
    let lower = email.to_lowercase();

    if lower.contains("info@") || lower.contains("contact@") {
        return EmailKind::General;
    }
    if lower.contains("sales@") || lower.contains("business@") {
        return EmailKind::Sales;
    }
    if lower.contains("support@") || lower.contains("help@") {
        return EmailKind::Support;
    }
    if lower.contains("admin@") || lower.contains("webmaster@") {
        return EmailKind::Admin;
    }

    let local = lower.split('@').next().unwrap_or("");
    if local.len() > 2 && !local.contains("info") && !local.contains("contact") {
        return EmailKind::Personal;
    }

    EmailKind::Unknown
}

fn email_confidence(email: &str, kind: EmailKind) -> f64 {
    let mut confidence: f64 = match kind {
        EmailKind::Sales => 0.9,
        EmailKind::General => 0.85,
        EmailKind::Personal => 0.95,
        EmailKind::Support | EmailKind::Admin | EmailKind::Unknown => 0.7,
    };

    if FREE_MAIL_DOMAINS.iter().any(|d| email.contains(d)) {
        confidence -= 0.1;
    }

    confidence.clamp(0.0, 1.0)
}

fn contact_confidence(email_count: usize, phone_count: usize, social_count: usize) -> f64 {
    let mut score: f64 = 0.0;

    if email_count > 0 {
        score += 0.4;
    }
    if email_count > 2 {
        score += 0.1;
    }
    if phone_count > 0 {
        score += 0.2;
    }
    if social_count > 0 {
        score += 0.2;
    }
    if social_count > 2 {
        score += 0.1;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_emails_in_content_and_mailto_links() {
        let html = r#"
            <p>Reach us at info@acme.io.</p>
            <a href="mailto:sales@acme.io?subject=Hi">Sales</a>
        "#;
        assert_eq!(find_emails(html), vec!["info@acme.io", "sales@acme.io"]);
    }

    #[test]
    fn blacklisted_addresses_are_rejected() {
        let html = r#"
            <p>demo@example.com someone@test.com icon@site.png real@acme.io</p>
        "#;
        assert_eq!(find_emails(html), vec!["real@acme.io"]);
    }

    #[test]
    fn email_dedup_is_case_insensitive() {
        let deduped = dedupe_emails(vec!["A@X.com".to_owned(), "a@x.com".to_owned()]);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn phone_dedup_ignores_formatting() {
        let deduped = dedupe_phones(vec![
            "(555) 123-4567".to_owned(),
            "555.123.4567".to_owned(),
        ]);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn classifies_email_kinds_by_local_part() {
        assert_eq!(email_kind("info@acme.io"), EmailKind::General);
        assert_eq!(email_kind("contact@acme.io"), EmailKind::General);
        assert_eq!(email_kind("sales@acme.io"), EmailKind::Sales);
        assert_eq!(email_kind("business@acme.io"), EmailKind::Sales);
        assert_eq!(email_kind("support@acme.io"), EmailKind::Support);
        assert_eq!(email_kind("help@acme.io"), EmailKind::Support);
        assert_eq!(email_kind("admin@acme.io"), EmailKind::Admin);
        assert_eq!(email_kind("webmaster@acme.io"), EmailKind::Admin);
        assert_eq!(email_kind("jane.doe@acme.io"), EmailKind::Personal);
        assert_eq!(email_kind("ab@acme.io"), EmailKind::Unknown);
    }

    #[test]
    fn sales_emails_carry_their_fixed_confidence() {
        let contact = categorize_email("sales@acme.io".to_owned());
        assert_eq!(contact.kind, EmailKind::Sales);
        assert!((contact.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn free_mail_domains_are_penalized() {
        let contact = categorize_email("jane@gmail.com".to_owned());
        assert_eq!(contact.kind, EmailKind::Personal);
        assert!((contact.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn social_links_match_the_platform_table() {
        let html = r#"
            <a href="https://x.com/acme">X</a>
            <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
            <a href="https://github.com/acme">GitHub</a>
        "#;
        let social = find_social_links(html);
        assert_eq!(
            social.get(&SocialPlatform::Twitter).map(String::as_str),
            Some("https://x.com/acme")
        );
        assert!(social.contains_key(&SocialPlatform::Linkedin));
        assert!(social.contains_key(&SocialPlatform::Github));
    }

    #[test]
    fn contact_page_link_resolves_against_base() {
        let html = r#"<a href="/company/contact">Get in touch</a>"#;
        assert_eq!(
            find_contact_page(html, "https://acme.io").as_deref(),
            Some("https://acme.io/company/contact")
        );
        assert!(find_contact_page("<a href=\"/pricing\">x</a>", "https://acme.io").is_none());
    }

    #[test]
    fn confidence_accumulates_by_channel() {
        assert!((contact_confidence(0, 0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((contact_confidence(1, 0, 0) - 0.4).abs() < f64::EPSILON);
        assert!((contact_confidence(3, 1, 3) - 1.0).abs() < f64::EPSILON);
        assert!((contact_confidence(1, 1, 1) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn tel_links_and_text_numbers_are_collected() {
        let html = r#"<a href="tel:+1-555-123-4567">Call</a><p>Office: (555) 987-6543</p>"#;
        let phones = find_phones(html);
        assert!(phones.iter().any(|p| p == "+1-555-123-4567"));
        assert!(phones.iter().any(|p| p.contains("987-6543")));
    }
}

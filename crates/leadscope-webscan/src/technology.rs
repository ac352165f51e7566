//! Technology fingerprinting: classifies page content and response
//! headers into the eight fixed categories.
//!
//! Every signal carries a fixed confidence constant. These constants are
//! part of the observable contract (downstream scoring and dedup depend
//! on them) and must not be tuned casually.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use leadscope_core::profile::{Detection, TechCategory, TechnologyMap, TechnologyProfile};

use crate::error::WebscanError;
use crate::page::{FetchedPage, PageClient};

static CLASS_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid regex"));

/// Fetches the site once and fingerprints it.
///
/// # Errors
///
/// - [`WebscanError::Http`] — network failure or timeout (retryable).
/// - [`WebscanError::UnexpectedStatus`] — non-2xx response.
///
/// Parse-level oddities never fail the stage; a page with no
/// recognizable signals yields an empty profile with confidence 0.
pub async fn detect_technologies(
    client: &PageClient,
    raw_url: &str,
    now: DateTime<Utc>,
) -> Result<TechnologyProfile, WebscanError> {
    let page = client.fetch(raw_url).await?;
    Ok(classify_page(&page, now))
}

/// Pure classification of an already-fetched page.
#[must_use]
pub fn classify_page(page: &FetchedPage, now: DateTime<Utc>) -> TechnologyProfile {
    let html = page.html.as_str();

    let technologies = TechnologyMap {
        frontend: detect_frontend(html),
        backend: detect_backend(page, html),
        analytics: detect_analytics(html),
        hosting: detect_hosting(page),
        cms: detect_cms(page, html),
        ecommerce: detect_ecommerce(html),
        marketing: detect_marketing(html),
        security: detect_security(page),
    };

    let confidence = overall_confidence(&technologies);
    let summary = summarize(&technologies);

    TechnologyProfile {
        url: page.url.clone(),
        technologies,
        confidence,
        summary,
        detected_at: now,
    }
}

fn detect_frontend(html: &str) -> Vec<Detection> {
    let mut out = Vec::new();

    if html.contains("react") || html.contains("__REACT") || html.contains("data-reactroot") {
        out.push(Detection::new("React", 0.9));
    }
    if html.contains("vue") || html.contains("data-v-") {
        out.push(Detection::new("Vue.js", 0.9));
    }
    if html.contains("ng-version") {
        out.push(Detection::new("Angular", 0.95));
    }
    if html.contains("__NEXT_DATA__") || html.contains("id=\"__next\"") {
        out.push(Detection::new("Next.js", 0.95));
    }
    if html.contains("jquery") {
        out.push(Detection::new("jQuery", 0.8));
    }
    if html.contains("tailwind") || class_attr_count(html, "tw-") > 0 {
        out.push(Detection::new("Tailwind CSS", 0.85));
    }
    if html.contains("bootstrap") || class_attr_count(html, "col-") > 10 {
        out.push(Detection::new("Bootstrap", 0.8));
    }

    out
}

fn detect_backend(page: &FetchedPage, html: &str) -> Vec<Detection> {
    let mut out = Vec::new();

    if let Some(server) = page.header("server") {
        if server.contains("nginx") {
            out.push(Detection::new("Nginx", 1.0));
        }
        if server.contains("Apache") {
            out.push(Detection::new("Apache", 1.0));
        }
    }

    if let Some(powered) = page.header("x-powered-by") {
        let powered = powered.to_lowercase();
        if powered.contains("express") {
            out.push(Detection::new("Express.js", 1.0));
        }
        if powered.contains("php") {
            out.push(Detection::new("PHP", 1.0));
        }
        if powered.contains("asp.net") {
            out.push(Detection::new("ASP.NET", 1.0));
        }
    }

    if html.contains("wp-content") || html.contains("wordpress") {
        out.push(Detection::new("WordPress", 0.95));
    }

    out
}

fn detect_analytics(html: &str) -> Vec<Detection> {
    let mut out = Vec::new();

    if html.contains("google-analytics.com") || html.contains("gtag") || html.contains("UA-") {
        out.push(Detection::new("Google Analytics", 0.95));
    }
    if html.contains("googletagmanager.com") || html.contains("GTM-") {
        out.push(Detection::new("Google Tag Manager", 0.95));
    }
    if html.contains("mixpanel") {
        out.push(Detection::new("Mixpanel", 0.9));
    }
    if html.contains("segment.com") || html.contains("analytics.js") {
        out.push(Detection::new("Segment", 0.9));
    }
    if html.contains("hotjar") {
        out.push(Detection::new("Hotjar", 0.9));
    }

    out
}

fn detect_hosting(page: &FetchedPage) -> Vec<Detection> {
    let mut out = Vec::new();
    let server = page.header("server").unwrap_or_default();

    if page.has_header("cf-ray") || server.contains("cloudflare") {
        out.push(Detection::new("Cloudflare", 1.0));
    }
    if page.has_header("x-vercel-id") || server.contains("vercel") {
        out.push(Detection::new("Vercel", 1.0));
    }
    if page.has_header("x-nf-request-id") || server.contains("netlify") {
        out.push(Detection::new("Netlify", 1.0));
    }
    if page.has_header("x-amz-cf-id") || page.has_header("x-amz-request-id") {
        out.push(Detection::new("AWS", 1.0));
    }

    out
}

fn detect_cms(page: &FetchedPage, html: &str) -> Vec<Detection> {
    let mut out = Vec::new();

    if html.contains("wp-content") || html.contains("wp-includes") {
        out.push(Detection::new("WordPress", 0.95));
    }
    if html.contains("cdn.shopify.com") || html.contains("Shopify") {
        out.push(Detection::new("Shopify", 0.95));
    }
    if html.contains("wix.com") || page.has_header("x-wix-request-id") {
        out.push(Detection::new("Wix", 0.95));
    }
    if html.contains("squarespace") {
        out.push(Detection::new("Squarespace", 0.9));
    }

    out
}

fn detect_ecommerce(html: &str) -> Vec<Detection> {
    let mut out = Vec::new();
    let lower = html.to_lowercase();

    if lower.contains("shopify") {
        out.push(Detection::new("Shopify", 0.95));
    }
    if lower.contains("woocommerce") {
        out.push(Detection::new("WooCommerce", 0.95));
    }
    if lower.contains("magento") {
        out.push(Detection::new("Magento", 0.9));
    }
    if lower.contains("stripe") {
        out.push(Detection::new("Stripe", 0.85));
    }

    out
}

fn detect_marketing(html: &str) -> Vec<Detection> {
    let mut out = Vec::new();
    let lower = html.to_lowercase();

    if lower.contains("hubspot") {
        out.push(Detection::new("HubSpot", 0.9));
    }
    if lower.contains("mailchimp") {
        out.push(Detection::new("Mailchimp", 0.9));
    }
    if lower.contains("intercom") {
        out.push(Detection::new("Intercom", 0.9));
    }

    out
}

fn detect_security(page: &FetchedPage) -> Vec<Detection> {
    let mut out = Vec::new();

    if page.has_header("strict-transport-security") {
        out.push(Detection::new("HSTS", 1.0));
    }
    if page.has_header("content-security-policy") {
        out.push(Detection::new("CSP", 1.0));
    }
    if page.has_header("x-frame-options") {
        out.push(Detection::new("X-Frame-Options", 1.0));
    }

    out
}

/// Number of `class` attributes containing `fragment`.
fn class_attr_count(html: &str, fragment: &str) -> usize {
    CLASS_ATTR_RE
        .captures_iter(html)
        .filter(|caps| caps.get(1).is_some_and(|m| m.as_str().contains(fragment)))
        .count()
}

/// Arithmetic mean of every detection confidence; 0 when none.
fn overall_confidence(technologies: &TechnologyMap) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for detection in technologies.iter_all() {
        total += detection.confidence;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = count as f64;
        total / denom
    }
}

/// One `"category: Name, Name"` line per non-empty category.
fn summarize(technologies: &TechnologyMap) -> Vec<String> {
    TechCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let detections = technologies.category(category);
            if detections.is_empty() {
                return None;
            }
            let names: Vec<&str> = detections.iter().map(|d| d.name.as_str()).collect();
            Some(format!("{category}: {}", names.join(", ")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn page(html: &str, headers: &[(&str, &str)]) -> FetchedPage {
        let headers: BTreeMap<String, String> = headers
            .iter()
            .map(|(k, v)| ((*k).to_lowercase(), (*v).to_string()))
            .collect();
        FetchedPage::new("https://example.com", html, headers)
    }

    fn fixed_now() -> DateTime<Utc> {
        "2026-08-01T00:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn detects_nextjs_and_react_from_markup() {
        let html = r#"<div id="__next"></div><script>window.__NEXT_DATA__={}</script>
                      <div data-reactroot></div>"#;
        let profile = classify_page(&page(html, &[]), fixed_now());

        let names: Vec<&str> = profile
            .technologies
            .frontend
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert!(names.contains(&"React"));
        assert!(names.contains(&"Next.js"));

        let next = profile
            .technologies
            .frontend
            .iter()
            .find(|d| d.name == "Next.js")
            .expect("Next.js detected");
        assert!((next.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn detects_backend_and_hosting_from_headers() {
        let html = "<html></html>";
        let profile = classify_page(
            &page(
                html,
                &[
                    ("Server", "nginx/1.25"),
                    ("X-Powered-By", "Express"),
                    ("CF-RAY", "8abc-FRA"),
                ],
            ),
            fixed_now(),
        );

        assert!(profile
            .technologies
            .backend
            .iter()
            .any(|d| d.name == "Nginx" && (d.confidence - 1.0).abs() < f64::EPSILON));
        assert!(profile
            .technologies
            .backend
            .iter()
            .any(|d| d.name == "Express.js"));
        assert!(profile
            .technologies
            .hosting
            .iter()
            .any(|d| d.name == "Cloudflare"));
    }

    #[test]
    fn shopify_page_yields_cms_and_ecommerce_detections() {
        let html = r#"<script src="https://cdn.shopify.com/assets/shop.js"></script>"#;
        let profile = classify_page(&page(html, &[]), fixed_now());

        assert!(profile.technologies.cms.iter().any(|d| d.name == "Shopify"));
        let ecommerce = profile
            .technologies
            .ecommerce
            .iter()
            .find(|d| d.name == "Shopify")
            .expect("ecommerce Shopify detected");
        assert!((ecommerce.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn security_headers_map_to_detections() {
        let profile = classify_page(
            &page(
                "",
                &[
                    ("Strict-Transport-Security", "max-age=63072000"),
                    ("Content-Security-Policy", "default-src 'self'"),
                    ("X-Frame-Options", "DENY"),
                ],
            ),
            fixed_now(),
        );
        let names: Vec<&str> = profile
            .technologies
            .security
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["HSTS", "CSP", "X-Frame-Options"]);
    }

    #[test]
    fn empty_page_has_zero_confidence_and_no_summary() {
        let profile = classify_page(&page("<html><body>plain</body></html>", &[]), fixed_now());
        assert!(profile.technologies.is_empty());
        assert!((profile.confidence - 0.0).abs() < f64::EPSILON);
        assert!(profile.summary.is_empty());
    }

    #[test]
    fn confidence_is_the_mean_over_all_detections() {
        // jQuery (0.8) + HSTS (1.0) → 0.9
        let profile = classify_page(
            &page(
                r#"<script src="/jquery.min.js"></script>"#,
                &[("Strict-Transport-Security", "max-age=1")],
            ),
            fixed_now(),
        );
        assert!((profile.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn summary_lists_categories_in_fixed_order() {
        let html = r#"<script src="/jquery.js"></script><span>woocommerce cart</span>"#;
        let profile = classify_page(&page(html, &[("X-Frame-Options", "DENY")]), fixed_now());
        assert_eq!(
            profile.summary,
            vec![
                "frontend: jQuery",
                "ecommerce: WooCommerce",
                "security: X-Frame-Options",
            ]
        );
    }
}

//! Integration tests for the website-facing adapters against wiremock.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chrono::{DateTime, Utc};
use leadscope_core::profile::EmailKind;
use leadscope_webscan::{
    detect_technologies, extract_contacts, research_company, CompanyHints, ContactHints,
    PageClient, WebscanError,
};

fn test_client() -> PageClient {
    PageClient::new(5, "leadscope-test/0.1").expect("failed to build PageClient")
}

fn fixed_now() -> DateTime<Utc> {
    "2026-08-01T00:00:00Z".parse().expect("valid timestamp")
}

#[tokio::test]
async fn technology_detection_reads_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script src="https://cdn.shopify.com/shop.js"></script>"#)
                .insert_header("server", "cloudflare")
                .insert_header("strict-transport-security", "max-age=1"),
        )
        .mount(&server)
        .await;

    let profile = detect_technologies(&test_client(), &server.uri(), fixed_now())
        .await
        .expect("detection should succeed");

    assert!(profile
        .technologies
        .ecommerce
        .iter()
        .any(|d| d.name == "Shopify"));
    assert!(profile
        .technologies
        .hosting
        .iter()
        .any(|d| d.name == "Cloudflare"));
    assert!(profile
        .technologies
        .security
        .iter()
        .any(|d| d.name == "HSTS"));
}

#[tokio::test]
async fn technology_detection_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = detect_technologies(&test_client(), &server.uri(), fixed_now())
        .await
        .expect_err("503 should be an error");
    assert!(matches!(
        err,
        WebscanError::UnexpectedStatus { status: 503, .. }
    ));
}

#[tokio::test]
async fn contact_extraction_follows_one_contact_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/contact">Contact us</a>
               <a href="https://linkedin.com/company/acme">LinkedIn</a>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="mailto:sales@acme.io">Email sales</a>
               <a href="tel:+1-555-123-4567">Call us</a>"#,
        ))
        .mount(&server)
        .await;

    let profile = extract_contacts(&test_client(), &server.uri(), &ContactHints::default()).await;

    assert_eq!(profile.emails.len(), 1);
    assert_eq!(profile.emails[0].email, "sales@acme.io");
    assert_eq!(profile.emails[0].kind, EmailKind::Sales);
    assert!((profile.emails[0].confidence - 0.9).abs() < f64::EPSILON);
    assert_eq!(profile.phones, vec!["+1-555-123-4567"]);
    assert_eq!(profile.social.len(), 1);
}

#[tokio::test]
async fn contact_extraction_degrades_to_hints_on_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let hints = ContactHints {
        email: Some("hello@acme.io".to_owned()),
        github_url: Some("https://github.com/acme".to_owned()),
    };
    let profile = extract_contacts(&test_client(), &server.uri(), &hints).await;

    assert_eq!(profile.emails.len(), 1);
    assert_eq!(profile.emails[0].email, "hello@acme.io");
    assert_eq!(profile.social.len(), 1);
    assert!(profile.phones.is_empty());
}

#[tokio::test]
async fn company_research_builds_profile_from_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html>
                 <head>
                   <title>Acme | Widget platform</title>
                   <meta name="description" content="Widget platform founded 2014.">
                 </head>
                 <body><p>Founded 2014. Trusted by 1,200+ customers.</p></body>
               </html>"#,
        ))
        .mount(&server)
        .await;

    let profile = research_company(
        &test_client(),
        &server.uri(),
        &CompanyHints::default(),
        fixed_now(),
    )
    .await
    .expect("research should succeed");

    assert_eq!(profile.name.as_deref(), Some("Acme"));
    assert_eq!(profile.industry.as_deref(), Some("SaaS"));
    assert_eq!(profile.founded_year, Some(2014));
    assert_eq!(profile.social_proof.customers.as_deref(), Some("1200"));
}

#[tokio::test]
async fn company_research_propagates_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = research_company(
        &test_client(),
        &server.uri(),
        &CompanyHints::default(),
        fixed_now(),
    )
    .await
    .expect_err("500 should propagate");
    assert!(matches!(err, WebscanError::UnexpectedStatus { .. }));
}

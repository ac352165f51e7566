//! End-to-end pipeline tests against wiremock stand-ins for the GitHub
//! API and the lead's website.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadscope_core::profile::EmailKind;
use leadscope_core::Subject;
use leadscope_enrich::{
    EnrichError, EnrichmentService, ProgressReporter, RetryPolicy, ServiceConfig,
};
use leadscope_github::GithubClient;
use leadscope_webscan::PageClient;

fn service(github_server: &MockServer) -> EnrichmentService {
    let github = GithubClient::with_base_url(None, 5, "leadscope-test/0.1", &github_server.uri())
        .expect("github client");
    let pages = PageClient::new(5, "leadscope-test/0.1").expect("page client");
    let config = ServiceConfig {
        // Zero backoff keeps retry-exhaustion paths instant.
        retry: RetryPolicy::new(3, 0, 0),
        cache_ttl: Duration::from_secs(3600),
    };
    EnrichmentService::new(github, pages, config)
}

fn repo_json(homepage: &str, owner_kind: &str) -> serde_json::Value {
    json!({
        "id": 42,
        "name": "widgets",
        "full_name": "acme/widgets",
        "owner": {
            "login": "acme",
            "type": owner_kind,
            "avatar_url": "https://avatars.test/acme",
            "html_url": "https://github.test/acme"
        },
        "description": "Widget toolkit",
        "html_url": "https://github.test/acme/widgets",
        "homepage": homepage,
        "stargazers_count": 1500,
        "forks_count": 120,
        "watchers_count": 900,
        "open_issues_count": 8,
        "language": "Rust",
        "topics": [],
        "created_at": "2019-01-01T00:00:00Z",
        "updated_at": "2026-07-30T00:00:00Z",
        "pushed_at": "2026-07-31T00:00:00Z",
        "size": 10,
        "has_issues": true,
        "has_wiki": false,
        "license": { "name": "MIT License" }
    })
}

async fn mount_github_repo(server: &MockServer, homepage: &str, owner_kind: &str) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json(homepage, owner_kind)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Rust": 1000 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "login": "alice", "contributions": 100, "avatar_url": "", "html_url": "" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Acme Corp",
            "description": "Widgets at scale",
            "blog": "https://acme-widgets.io",
            "location": "Berlin",
            "email": "hello@acme-widgets.io",
            "public_repos": 34,
            "followers": 210,
            "created_at": "2015-06-01T00:00:00Z",
            "avatar_url": ""
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_github_and_website_run_merges_all_stages() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    mount_github_repo(&github_server, "https://ignored.example.com", "Organization").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html>
                 <head><title>Acme | Widget platform</title></head>
                 <body>
                   <script src="https://cdn.shopify.com/shop.js"></script>
                   <a href="mailto:sales@acme-widgets.io">Talk to sales</a>
                 </body>
               </html>"#,
        ))
        .mount(&site_server)
        .await;

    let subject =
        Subject::new(Some("acme/widgets"), Some(&site_server.uri())).expect("valid subject");
    let (reporter, _rx) = ProgressReporter::channel();

    let lead = service(&github_server)
        .enrich(&subject, &reporter)
        .await
        .expect("enrichment should succeed");

    let repo = lead.repository.as_ref().expect("repository present");
    assert_eq!(repo.full_name, "acme/widgets");

    let tech = lead.technology.as_ref().expect("technology present");
    assert!(tech
        .technologies
        .ecommerce
        .iter()
        .any(|d| d.name == "Shopify"));

    let contact = lead.contact.as_ref().expect("contact present");
    let sales = contact
        .emails
        .iter()
        .find(|e| e.email == "sales@acme-widgets.io")
        .expect("sales email extracted");
    assert_eq!(sales.kind, EmailKind::Sales);
    // The org email arrives through the side channel.
    assert!(contact
        .emails
        .iter()
        .any(|e| e.email == "hello@acme-widgets.io"));

    let company = lead.company.as_ref().expect("company present");
    assert_eq!(company.email.as_deref(), Some("hello@acme-widgets.io"));
    assert_eq!(company.public_repos, Some(34));

    let scoring = lead.scoring.as_ref().expect("scoring present");
    assert!(scoring.total_score > 0.0 && scoring.total_score <= 100.0);
    assert_eq!(reporter.current(), 98);
}

#[tokio::test]
async fn technology_failure_degrades_but_run_completes() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    // Every site fetch fails; all three web stages degrade.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site_server)
        .await;

    let subject = Subject::new(None, Some(&site_server.uri())).expect("valid subject");
    let (reporter, _rx) = ProgressReporter::channel();

    let lead = service(&github_server)
        .enrich(&subject, &reporter)
        .await
        .expect("degraded run still completes");

    assert!(lead.technology.is_none());
    assert!(lead.company.is_none());
    // The contact extractor degrades internally to an empty profile.
    let contact = lead.contact.as_ref().expect("contact present but empty");
    assert!(contact.emails.is_empty());
    assert!((contact.confidence - 0.0).abs() < f64::EPSILON);
    assert!(lead.scoring.is_some());
}

#[tokio::test]
async fn homepage_fallback_feeds_web_stages_for_github_only_subjects() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    mount_github_repo(&github_server, &site_server.uri(), "User").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script src="/jquery.min.js"></script>"#),
        )
        .mount(&site_server)
        .await;

    let subject = Subject::new(Some("acme/widgets"), None).expect("valid subject");
    let (reporter, _rx) = ProgressReporter::channel();

    let lead = service(&github_server)
        .enrich(&subject, &reporter)
        .await
        .expect("enrichment should succeed");

    assert_eq!(lead.metadata.url.as_deref(), Some(site_server.uri().as_str()));
    let tech = lead.technology.as_ref().expect("technology ran on homepage");
    assert!(tech
        .technologies
        .frontend
        .iter()
        .any(|d| d.name == "jQuery"));
}

#[tokio::test]
async fn github_only_subject_fails_terminally_on_missing_repo() {
    let github_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&github_server)
        .await;

    let subject = Subject::new(Some("acme/widgets"), None).expect("valid subject");
    let (reporter, _rx) = ProgressReporter::channel();

    let err = service(&github_server)
        .enrich(&subject, &reporter)
        .await
        .expect_err("repo-only 404 must fail the run");
    assert!(matches!(err, EnrichError::RepoNotFound { .. }));
}

#[tokio::test]
async fn missing_repo_degrades_when_a_website_exists() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&github_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>Acme</title></html>"))
        .mount(&site_server)
        .await;

    let subject =
        Subject::new(Some("acme/widgets"), Some(&site_server.uri())).expect("valid subject");
    let (reporter, _rx) = ProgressReporter::channel();

    let lead = service(&github_server)
        .enrich(&subject, &reporter)
        .await
        .expect("website keeps the run alive");

    assert!(lead.repository.is_none());
    assert!(lead.company.is_some());
    assert!(lead.scoring.is_some());
}

#[tokio::test]
async fn second_run_hits_the_lead_cache() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    // The site answers exactly three fetches (page + contact sweep +
    // company research); a second uncached run would need more.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>Acme</title></html>"))
        .expect(3)
        .mount(&site_server)
        .await;

    let subject = Subject::new(None, Some(&site_server.uri())).expect("valid subject");
    let svc = service(&github_server);

    let (reporter, _rx) = ProgressReporter::channel();
    let first = svc.enrich(&subject, &reporter).await.expect("first run");

    let (reporter, _rx) = ProgressReporter::channel();
    let second = svc.enrich(&subject, &reporter).await.expect("second run");

    // Identical analysis timestamp proves the cached profile was reused.
    assert_eq!(first.metadata.analyzed_at, second.metadata.analyzed_at);
    assert_eq!(reporter.current(), 98);
}

#[tokio::test]
async fn progress_is_monotone_and_reaches_the_persist_checkpoint() {
    let github_server = MockServer::start().await;
    let site_server = MockServer::start().await;

    mount_github_repo(&github_server, "", "User").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><title>Acme</title></html>"))
        .mount(&site_server)
        .await;

    let subject =
        Subject::new(Some("acme/widgets"), Some(&site_server.uri())).expect("valid subject");
    let (reporter, mut rx) = ProgressReporter::channel();

    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while rx.changed().await.is_ok() {
            seen.push(*rx.borrow());
        }
        seen
    });

    let svc = service(&github_server);
    svc.enrich(&subject, &reporter).await.expect("run succeeds");
    drop(reporter);

    let seen = observer.await.expect("observer");
    assert!(!seen.is_empty());
    assert!(
        seen.windows(2).all(|w| w[0] < w[1]),
        "progress must strictly increase, got {seen:?}"
    );
    assert_eq!(*seen.last().expect("at least one checkpoint"), 98);
}

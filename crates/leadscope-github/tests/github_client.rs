//! Integration tests for `GithubClient` against a wiremock server.
//!
//! Covers the status→error mapping and the composed `analyze_repository`
//! fetch, including degradation of the secondary fetches.

use chrono::{DateTime, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadscope_core::RepoRef;
use leadscope_github::{GithubClient, GithubError};

fn test_client(server: &MockServer) -> GithubClient {
    GithubClient::with_base_url(None, 5, "leadscope-test/0.1", &server.uri())
        .expect("failed to build test GithubClient")
}

fn repo_ref() -> RepoRef {
    RepoRef::parse("acme/widgets").expect("valid repo ref")
}

fn fixed_now() -> DateTime<Utc> {
    "2026-08-01T00:00:00Z".parse().expect("valid timestamp")
}

fn repo_json(owner_kind: &str) -> serde_json::Value {
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
        "homepage": "https://widgets.example.com",
        "stargazers_count": 1200,
        "forks_count": 80,
        "watchers_count": 1200,
        "open_issues_count": 12,
        "language": "Rust",
        "topics": ["widgets", "tooling"],
        "created_at": "2020-01-01T00:00:00Z",
        "updated_at": "2026-07-30T00:00:00Z",
        "pushed_at": "2026-07-31T00:00:00Z",
        "size": 2048,
        "has_issues": true,
        "has_wiki": false,
        "license": { "name": "MIT License" }
    })
}

#[tokio::test]
async fn get_repository_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .get_repository(&repo_ref())
        .await
        .expect_err("404 should be an error");
    assert!(matches!(err, GithubError::NotFound { .. }));
}

#[tokio::test]
async fn get_repository_maps_403_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .get_repository(&repo_ref())
        .await
        .expect_err("403 should be an error");
    assert!(matches!(err, GithubError::RateLimited { .. }));
}

#[tokio::test]
async fn get_repository_maps_401_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .get_repository(&repo_ref())
        .await
        .expect_err("401 should be an error");
    assert!(matches!(err, GithubError::Unauthorized));
}

#[tokio::test]
async fn analyze_repository_composes_all_sub_fetches_for_an_organization() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("Organization")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Rust": 90000, "TypeScript": 10000 })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "login": "alice", "contributions": 300, "avatar_url": "", "html_url": "" },
            { "login": "bob", "contributions": 120, "avatar_url": "", "html_url": "" }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Acme Corp",
            "description": "Widgets at scale",
            "blog": "https://acme.example.com",
            "location": "Berlin",
            "email": "hello@acme.example.com",
            "public_repos": 34,
            "followers": 210,
            "created_at": "2015-06-01T00:00:00Z",
            "avatar_url": "https://avatars.test/acme"
        })))
        .mount(&server)
        .await;

    let profile = test_client(&server)
        .analyze_repository(&repo_ref(), fixed_now())
        .await
        .expect("analysis should succeed");

    assert_eq!(profile.full_name, "acme/widgets");
    assert_eq!(profile.stars, 1200);
    assert_eq!(profile.languages.len(), 2);
    assert_eq!(profile.contributors.len(), 2);
    assert_eq!(profile.contributors[0].username, "alice");

    let org = profile.organization.expect("org profile present");
    assert_eq!(org.name.as_deref(), Some("Acme Corp"));
    assert_eq!(org.email.as_deref(), Some("hello@acme.example.com"));
    assert_eq!(org.public_repos, 34);

    // Pushed 1 day before `fixed_now` → top activity step.
    assert!((profile.analysis.activity_score - 1.0).abs() < f64::EPSILON);
    assert!(profile.analysis.is_active);
    assert_eq!(profile.analysis.team_size, 2);
    assert!(profile
        .analysis
        .insights
        .iter()
        .any(|i| i.contains("MIT License")));
}

#[tokio::test]
async fn analyze_repository_skips_org_fetch_for_user_owned_repos() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("User")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    // No /orgs/acme mock: a request there would 404 and the mock server
    // records it; the org must simply be absent.

    let profile = test_client(&server)
        .analyze_repository(&repo_ref(), fixed_now())
        .await
        .expect("analysis should succeed");

    assert!(profile.organization.is_none());
}

#[tokio::test]
async fn analyze_repository_degrades_failed_secondary_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json("User")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let profile = test_client(&server)
        .analyze_repository(&repo_ref(), fixed_now())
        .await
        .expect("primary fetch succeeded, so analysis must too");

    assert!(profile.languages.is_empty());
    assert!(profile.contributors.is_empty());
    assert_eq!(profile.analysis.team_size, 0);
}

#[tokio::test]
async fn search_repositories_returns_trimmed_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "widgets"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "items": [repo_json("User")] })),
        )
        .mount(&server)
        .await;

    let items = test_client(&server)
        .search_repositories("widgets", "stars", "desc", 30)
        .await
        .expect("search should succeed");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].full_name, "acme/widgets");
    assert_eq!(items[0].stars, 1200);
}

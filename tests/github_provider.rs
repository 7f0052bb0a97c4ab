use content_backend::error::AppError;
use content_backend::helper::identity_helpers::{GithubIdentityProvider, IdentityProvider};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> GithubIdentityProvider {
    GithubIdentityProvider::with_endpoints(
        "client-id",
        "client-secret",
        "http://localhost:8000/auth/callback",
        &format!("{}/login/oauth/authorize", server.uri()),
        &format!("{}/login/oauth/access_token", server.uri()),
        &server.uri(),
    )
}

#[tokio::test]
async fn exchanges_the_code_and_reads_the_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("code=one-time-code"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "gho_token",
            "token_type": "bearer",
            "scope": "user:email",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer gho_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 583231,
            "login": "octocat",
            "email": null,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let github = provider(&server);
    let token = github.exchange_code("one-time-code").await.unwrap();
    assert_eq!(token, "gho_token");

    let identity = github.fetch_identity(&token).await.unwrap();
    assert_eq!(identity.external_id, "583231");
    assert_eq!(identity.login_name, "octocat");
    assert!(identity.email.is_none());
}

#[tokio::test]
async fn a_200_without_access_token_is_an_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired.",
        })))
        .mount(&server)
        .await;

    let err = provider(&server).exchange_code("stale").await.unwrap_err();
    assert!(matches!(err, AppError::UpstreamAuth(ref msg) if msg.contains("incorrect or expired")));
}

#[tokio::test]
async fn non_success_statuses_are_upstream_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let github = provider(&server);
    assert!(matches!(
        github.exchange_code("code").await,
        Err(AppError::UpstreamAuth(_))
    ));
    assert!(matches!(
        github.fetch_identity("revoked").await,
        Err(AppError::UpstreamAuth(_))
    ));
}

use crate::error::{AppError, AppResult};
use crate::models::ExternalIdentity;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_SCOPE: &str = "user:email";

/// Server-to-server half of the OAuth login. Holds no state between calls.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self) -> String;

    async fn exchange_code(&self, code: &str) -> AppResult<String>;

    async fn fetch_identity(&self, access_token: &str) -> AppResult<ExternalIdentity>;
}

pub struct GithubIdentityProvider {
    http: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    authorize_endpoint: String,
    token_endpoint: String,
    api_base: String,
}

#[derive(Deserialize)]
struct GithubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl GithubIdentityProvider {
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            GITHUB_AUTHORIZE_URL,
            GITHUB_TOKEN_URL,
            GITHUB_API_URL,
        )
    }

    pub fn with_endpoints(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        authorize_endpoint: &str,
        token_endpoint: &str,
        api_base: &str,
    ) -> Self {
        let http = Client::builder()
            .user_agent(concat!("content-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            authorize_endpoint: authorize_endpoint.to_string(),
            token_endpoint: token_endpoint.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GithubIdentityProvider {
    fn authorize_url(&self) -> String {
        match Url::parse_with_params(
            &self.authorize_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", GITHUB_SCOPE),
            ],
        ) {
            Ok(url) => url.to_string(),
            Err(e) => {
                log::error!("Invalid GitHub authorize endpoint '{}': {}", self.authorize_endpoint, e);
                self.authorize_endpoint.clone()
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> AppResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .header("Accept", "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("GitHub token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamAuth(format!(
                "Failed to exchange code for token (status {}).",
                response.status()
            )));
        }

        let token: GithubTokenResponse = response.json().await.map_err(|e| {
            AppError::UpstreamAuth(format!("Failed to parse GitHub token response: {}", e))
        })?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => Ok(access_token),
            _ => Err(AppError::UpstreamAuth(format!(
                "No access token received: {}",
                token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    async fn fetch_identity(&self, access_token: &str) -> AppResult<ExternalIdentity> {
        let response = self
            .http
            .get(format!("{}/user", self.api_base))
            .bearer_auth(access_token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AppError::UpstreamAuth(format!("GitHub user request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamAuth(format!(
                "Failed to fetch user info from GitHub (status {}).",
                response.status()
            )));
        }

        let user: GithubUser = response.json().await.map_err(|e| {
            AppError::UpstreamAuth(format!("Failed to parse GitHub user info: {}", e))
        })?;

        Ok(ExternalIdentity {
            external_id: user.id.to_string(),
            login_name: user.login,
            email: user.email,
            avatar_url: user.avatar_url,
        })
    }
}

/// Login names that may ever receive a session token.
#[derive(Debug, Clone)]
pub struct AllowList {
    logins: Vec<String>,
}

impl AllowList {
    pub fn new(logins: Vec<String>) -> Self {
        Self { logins }
    }

    pub fn ensure_permitted(&self, identity: &ExternalIdentity) -> AppResult<()> {
        let permitted = self
            .logins
            .iter()
            .any(|login| login.eq_ignore_ascii_case(&identity.login_name));

        if permitted {
            Ok(())
        } else {
            log::warn!("Rejected login from GitHub user '{}' (not on allow-list).", identity.login_name);
            Err(AppError::Forbidden(
                "You are not authorized to access this resource.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(login: &str) -> ExternalIdentity {
        ExternalIdentity {
            external_id: "42".into(),
            login_name: login.into(),
            email: None,
            avatar_url: None,
        }
    }

    #[test]
    fn allow_list_matches_case_insensitively() {
        let list = AllowList::new(vec!["Operator".into()]);
        assert!(list.ensure_permitted(&identity("operator")).is_ok());
        assert!(matches!(
            list.ensure_permitted(&identity("intruder")),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn authorize_url_carries_client_redirect_and_scope() {
        let provider = GithubIdentityProvider::new("cid", "secret", "http://localhost:8000/auth/callback");
        let url = Url::parse(&provider.authorize_url()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("github.com"));
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "http://localhost:8000/auth/callback".into())));
        assert!(pairs.contains(&("scope".into(), "user:email".into())));
    }
}

//! Configuration for GitHub team login.

use serde::{Deserialize, Serialize};

pub const GITHUB_AUTHORIZATION_ENDPOINT: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_ENDPOINT: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com/";

/// Scopes requested on every authorization: the user's identity and read
/// access to their organization and team memberships.
pub const SCOPES: [&str; 2] = ["user:email", "read:org"];

/// OAuth2 and REST endpoints of the GitHub instance to talk to.
///
/// Defaults to github.com. Override for GitHub Enterprise Server, e.g.
/// `https://ghe.example.com/login/oauth/authorize` and
/// `https://ghe.example.com/api/v3/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub api_base_url: String,
}

impl Default for GitHubEndpoints {
    fn default() -> Self {
        Self {
            authorization_endpoint: GITHUB_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: GITHUB_TOKEN_ENDPOINT.to_string(),
            api_base_url: GITHUB_API_BASE_URL.to_string(),
        }
    }
}

impl GitHubEndpoints {
    /// Endpoints rooted at a single base URL, laid out like github.com's
    /// (`/login/oauth/authorize`, `/login/oauth/access_token`) with the API
    /// served from the same root.
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            authorization_endpoint: format!("{base}/login/oauth/authorize"),
            token_endpoint: format!("{base}/login/oauth/access_token"),
            api_base_url: format!("{base}/"),
        }
    }
}

/// The organization and team users must belong to, plus the OAuth2
/// application credentials.
///
/// Nothing here is validated: bad credentials only show up when a code is
/// exchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Organization login, e.g. `acme`
    pub organization: String,
    /// Team name inside the organization, compared exactly
    pub team: String,
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL sent with the authorization and token requests. When
    /// unset GitHub uses the one registered for the application.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    /// Per-request timeout. Unset means no timeout.
    #[serde(default)]
    pub http_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub endpoints: GitHubEndpoints,
}

impl AuthConfig {
    pub fn new(
        organization: impl Into<String>,
        team: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            team: team.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
            http_timeout_seconds: None,
            endpoints: GitHubEndpoints::default(),
        }
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_endpoints(mut self, endpoints: GitHubEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_github() {
        let config = AuthConfig::new("acme", "eng", "id", "secret");

        assert_eq!(config.endpoints, GitHubEndpoints::default());
        assert_eq!(config.endpoints.api_base_url, "https://api.github.com/");
        assert!(config.redirect_uri.is_none());
        assert!(config.http_timeout_seconds.is_none());
    }

    #[test]
    fn test_endpoints_from_base_url() {
        let endpoints = GitHubEndpoints::from_base_url("https://ghe.example.com/");

        assert_eq!(
            endpoints.authorization_endpoint,
            "https://ghe.example.com/login/oauth/authorize"
        );
        assert_eq!(
            endpoints.token_endpoint,
            "https://ghe.example.com/login/oauth/access_token"
        );
        assert_eq!(endpoints.api_base_url, "https://ghe.example.com/");
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let json = r#"{
            "organization": "acme",
            "team": "eng",
            "client_id": "id",
            "client_secret": "secret"
        }"#;

        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.organization, "acme");
        assert_eq!(config.team, "eng");
        assert_eq!(config.endpoints, GitHubEndpoints::default());
    }
}

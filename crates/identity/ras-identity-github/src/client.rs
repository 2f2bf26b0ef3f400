//! OAuth2 client for GitHub's authorization code flow.

use crate::config::{AuthConfig, SCOPES};
use crate::error::{GitHubAuthError, GitHubAuthResult};
use crate::types::{AccessToken, TokenResponse};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Immutable OAuth2 client built once from an [`AuthConfig`].
///
/// Holds the parsed endpoints and the HTTP client shared by the token
/// exchange and the API calls that follow it.
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: Option<String>,
    authorization_endpoint: Url,
    token_endpoint: Url,
    api_base_url: Url,
}

impl OAuth2Client {
    pub fn new(config: &AuthConfig) -> GitHubAuthResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(seconds) = config.http_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let http_client = builder
            .build()
            .map_err(|e| GitHubAuthError::Config(format!("failed to build HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with '/'
        let mut api_base = config.endpoints.api_base_url.clone();
        if !api_base.ends_with('/') {
            api_base.push('/');
        }

        Ok(Self {
            http_client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorization_endpoint: Url::parse(&config.endpoints.authorization_endpoint)?,
            token_endpoint: Url::parse(&config.endpoints.token_endpoint)?,
            api_base_url: Url::parse(&api_base)?,
        })
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub(crate) fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// URL to send the user's browser to. Requests online access only, so
    /// no refresh token is issued.
    pub fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorization_endpoint.clone();

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.client_id);
            if let Some(redirect_uri) = &self.redirect_uri {
                params.append_pair("redirect_uri", redirect_uri);
            }
            params.append_pair("scope", &SCOPES.join(" "));
            params.append_pair("state", state);
            params.append_pair("access_type", "online");
        }

        debug!("Generated authorization URL for client {}", self.client_id);
        url.to_string()
    }

    /// Exchange an authorization code for an access token.
    pub(crate) async fn exchange_code(&self, code: &str) -> GitHubAuthResult<AccessToken> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        if let Some(redirect_uri) = &self.redirect_uri {
            params.push(("redirect_uri", redirect_uri.as_str()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let response = self
            .http_client
            .post(self.token_endpoint.clone())
            .headers(headers)
            .form(&params)
            .send()
            .await
            .map_err(|e| GitHubAuthError::Exchange(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GitHubAuthError::Exchange(e.to_string()))?;

        if !status.is_success() {
            error!("Token exchange failed with status {}", status);
            return Err(GitHubAuthError::Exchange(format!("HTTP {status}: {body}")));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GitHubAuthError::Exchange(format!("invalid token response: {e}")))?;

        if let Some(error) = token_response.error {
            let description = token_response
                .error_description
                .as_deref()
                .unwrap_or("No description");
            error!("Token exchange rejected: {}", error);
            return Err(GitHubAuthError::Exchange(format!("{error}: {description}")));
        }

        match token_response.access_token {
            Some(token) if !token.is_empty() => {
                info!(
                    token_type = token_response.token_type.as_deref().unwrap_or("bearer"),
                    scope = token_response.scope.as_deref().unwrap_or(""),
                    "Successfully exchanged code for access token"
                );
                Ok(AccessToken::new(token))
            }
            _ => Err(GitHubAuthError::Exchange(
                "server response missing access_token".to_string(),
            )),
        }
    }
}

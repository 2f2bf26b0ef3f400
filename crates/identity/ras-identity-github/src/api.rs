//! Bearer-authenticated calls to the GitHub REST API.

use crate::error::{GitHubAuthError, GitHubAuthResult};
use crate::types::{AccessToken, AuthenticatedUser, TeamMembership};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// GitHub API client acting on behalf of one user. Every request carries
/// that user's access token.
pub(crate) struct GitHubApiClient<'a> {
    http_client: &'a Client,
    base_url: &'a Url,
    token: AccessToken,
}

impl<'a> GitHubApiClient<'a> {
    pub(crate) fn new(http_client: &'a Client, base_url: &'a Url, token: AccessToken) -> Self {
        Self {
            http_client,
            base_url,
            token,
        }
    }

    /// Teams the user belongs to, across all organizations.
    pub(crate) async fn teams(&self) -> GitHubAuthResult<Vec<TeamMembership>> {
        self.get_json("user/teams").await
    }

    /// Profile of the user.
    pub(crate) async fn user(&self) -> GitHubAuthResult<AuthenticatedUser> {
        self.get_json("user").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GitHubAuthResult<T> {
        let url = self.base_url.join(path)?;
        let endpoint = url.path().to_string();

        debug!("GET {}", endpoint);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| GitHubAuthError::transport(&endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GitHubAuthError::transport(&endpoint, e))?;

        if !status.is_success() {
            warn!("GitHub API request to {} failed with status {}", endpoint, status);
            return Err(GitHubAuthError::transport(
                &endpoint,
                format!("HTTP {status}: {body}"),
            ));
        }

        serde_json::from_str(&body).map_err(|e| GitHubAuthError::decode(&endpoint, e))
    }
}

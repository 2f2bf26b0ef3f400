//! Login entry points: redirect URL and callback verification.

use crate::api::GitHubApiClient;
use crate::client::OAuth2Client;
use crate::config::AuthConfig;
use crate::error::{GitHubAuthError, GitHubAuthResult};
use crate::types::{AuthenticatedUser, TeamMembership};
use tracing::{info, warn};

/// Outcome of [`GitHubTeamAuth::check_permission`].
///
/// `Denied` still carries the verified user: GitHub confirmed who they are,
/// they just are not on the team. `Failed` means identity could not be
/// established at all.
#[derive(Debug)]
pub enum PermissionCheck {
    Authorized(AuthenticatedUser),
    Denied(AuthenticatedUser),
    Failed(GitHubAuthError),
}

impl PermissionCheck {
    pub fn is_authorized(&self) -> bool {
        matches!(self, PermissionCheck::Authorized(_))
    }

    /// The verified user, for both `Authorized` and `Denied`.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            PermissionCheck::Authorized(user) | PermissionCheck::Denied(user) => Some(user),
            PermissionCheck::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&GitHubAuthError> {
        match self {
            PermissionCheck::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// `(authorized, user)` on verification, the error otherwise.
    pub fn into_result(self) -> GitHubAuthResult<(bool, AuthenticatedUser)> {
        match self {
            PermissionCheck::Authorized(user) => Ok((true, user)),
            PermissionCheck::Denied(user) => Ok((false, user)),
            PermissionCheck::Failed(err) => Err(err),
        }
    }
}

/// GitHub login restricted to the members of one team of one organization.
///
/// Build once and share across requests; it is immutable and cheap to
/// clone.
#[derive(Clone)]
pub struct GitHubTeamAuth {
    config: AuthConfig,
    client: OAuth2Client,
}

impl GitHubTeamAuth {
    pub fn new(config: AuthConfig) -> GitHubAuthResult<Self> {
        let client = OAuth2Client::new(&config)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// URL to redirect the user to so they can sign in on GitHub and grant
    /// access. GitHub sends them back to the callback URL with `code` and
    /// the same `state`.
    pub fn auth_code_url(&self, state: &str) -> String {
        self.client.authorization_url(state)
    }

    /// Complete the login from the callback: exchange `code`, then check that
    /// the user belongs to the configured team.
    pub async fn check_permission(&self, code: &str) -> PermissionCheck {
        match self.verify(code).await {
            Ok((teams, user)) => {
                if is_member(&teams, &self.config.organization, &self.config.team) {
                    info!(
                        "User {} authorized as member of {}/{}",
                        user.login, self.config.organization, self.config.team
                    );
                    PermissionCheck::Authorized(user)
                } else {
                    info!(
                        "User {} denied: not a member of {}/{}",
                        user.login, self.config.organization, self.config.team
                    );
                    PermissionCheck::Denied(user)
                }
            }
            Err(err) => {
                warn!("Could not verify GitHub login: {}", err);
                PermissionCheck::Failed(err)
            }
        }
    }

    async fn verify(&self, code: &str) -> GitHubAuthResult<(Vec<TeamMembership>, AuthenticatedUser)> {
        let token = self.client.exchange_code(code).await?;

        let api = GitHubApiClient::new(
            self.client.http_client(),
            self.client.api_base_url(),
            token,
        );

        // Teams first: a failure here must not cost a profile request
        let teams = api.teams().await?;
        let user = api.user().await?;

        Ok((teams, user))
    }
}

fn is_member(teams: &[TeamMembership], organization: &str, team: &str) -> bool {
    teams.iter().any(|t| t.matches(organization, team))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(json: &str) -> Vec<TeamMembership> {
        serde_json::from_str(json).unwrap()
    }

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            login: "alice".to_string(),
            display_name: "Alice A".to_string(),
            avatar_url: "http://x/a.png".to_string(),
        }
    }

    #[test]
    fn test_is_member_any_position() {
        let list = teams(
            r#"[
                {"name": "ops", "organization": {"login": "acme"}},
                {"name": "eng", "organization": {"login": "other"}},
                {"name": "eng", "organization": {"login": "acme"}}
            ]"#,
        );

        assert!(is_member(&list, "acme", "eng"));
        assert!(is_member(&list, "other", "eng"));
        assert!(!is_member(&list, "other", "ops"));
    }

    #[test]
    fn test_is_member_empty_list() {
        assert!(!is_member(&[], "acme", "eng"));
    }

    #[test]
    fn test_permission_check_accessors() {
        let authorized = PermissionCheck::Authorized(alice());
        assert!(authorized.is_authorized());
        assert_eq!(authorized.user(), Some(&alice()));
        assert!(authorized.error().is_none());

        let denied = PermissionCheck::Denied(alice());
        assert!(!denied.is_authorized());
        assert_eq!(denied.user(), Some(&alice()));
        assert_eq!(denied.into_result().unwrap(), (false, alice()));

        let failed = PermissionCheck::Failed(GitHubAuthError::Exchange("bad code".to_string()));
        assert!(!failed.is_authorized());
        assert!(failed.user().is_none());
        assert!(matches!(failed.error(), Some(GitHubAuthError::Exchange(_))));
        assert!(failed.into_result().is_err());
    }

    #[test]
    fn test_auth_code_url_contains_state() {
        let auth = GitHubTeamAuth::new(AuthConfig::new("acme", "eng", "id", "secret")).unwrap();

        let url = auth.auth_code_url("state-123");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("state=state-123"));
        assert!(url.contains("access_type=online"));
    }
}

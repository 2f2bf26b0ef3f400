//! GitHub OAuth2 login restricted to the members of one organization team.
//!
//! Redirect users to [`GitHubTeamAuth::auth_code_url`], then call
//! [`GitHubTeamAuth::check_permission`] from the callback route with the
//! `code` GitHub hands back. The result tells apart a team member, a
//! verified user outside the team, and a login that could not be verified.

mod api;
mod auth;
mod client;
mod config;
mod error;
mod state;
mod types;


pub use auth::{GitHubTeamAuth, PermissionCheck};
pub use client::OAuth2Client;
pub use config::{
    AuthConfig, GITHUB_API_BASE_URL, GITHUB_AUTHORIZATION_ENDPOINT, GITHUB_TOKEN_ENDPOINT,
    GitHubEndpoints, SCOPES,
};
pub use error::{GitHubAuthError, GitHubAuthResult};
pub use state::{InMemoryStateStore, LoginState, StateStore};
pub use types::AuthenticatedUser;

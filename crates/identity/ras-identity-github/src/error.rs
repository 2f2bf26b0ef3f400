//! Error types for the GitHub team login flow.

use thiserror::Error;

pub type GitHubAuthResult<T> = Result<T, GitHubAuthError>;

/// Everything that can stop a login from being verified.
///
/// None of these mean "the user is not a team member"; that outcome is
/// reported as [`PermissionCheck::Denied`](crate::PermissionCheck::Denied).
#[derive(Debug, Error)]
pub enum GitHubAuthError {
    /// The authorization code could not be exchanged for an access token.
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// A GitHub API call failed before a usable body was received.
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// A GitHub API call returned a body of the wrong shape.
    #[error("Invalid response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("State not found or expired")]
    StateNotFound,
}

impl GitHubAuthError {
    pub(crate) fn transport(endpoint: &str, message: impl ToString) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(endpoint: &str, message: impl ToString) -> Self {
        Self::Decode {
            endpoint: endpoint.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<url::ParseError> for GitHubAuthError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid endpoint URL: {err}"))
    }
}

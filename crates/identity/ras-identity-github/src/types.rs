//! GitHub OAuth2 and REST wire types.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// GitHub sends `null` for unset fields (a user without a display name has
/// `"name": null`). Treat it the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Basic profile of the user that completed the login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
    #[serde(rename = "name", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TeamOrganization {
    #[serde(default, deserialize_with = "null_as_default")]
    pub login: String,
}

/// One entry of `GET /user/teams`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TeamMembership {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organization: TeamOrganization,
}

impl TeamMembership {
    /// Exact, case-sensitive match on both team name and organization login.
    pub(crate) fn matches(&self, organization: &str, team: &str) -> bool {
        self.name == team && self.organization.login == organization
    }
}

/// Body of the token endpoint response.
///
/// GitHub answers a rejected code with HTTP 200 and an `error` field, so
/// both shapes share one struct.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Access token obtained from a code exchange. Never printed.
#[derive(Clone)]
pub(crate) struct AccessToken(String);

impl AccessToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(****)")
    }
}

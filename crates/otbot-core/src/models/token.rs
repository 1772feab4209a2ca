use std::fmt;

use serde::Deserialize;

use super::null_as_default;

/// Successful answer of the OpenID-Connect token endpoint.
///
/// Only `access_token` is mandatory; the other fields default like the
/// provider would leave them out.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expires_in: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_expires_in: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub refresh_token: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id_token: String,
    #[serde(rename = "not-before-policy", default, deserialize_with = "null_as_default")]
    pub not_before_policy: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub session_state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scope: String,
}

// Tokens stay out of logs
impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("expires_in", &self.expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("token_type", &self.token_type)
            .field("not_before_policy", &self.not_before_policy)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

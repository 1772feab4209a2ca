//! Application configuration.
//!
//! All settings come from `OT_*` keys (process environment or `.env` file)
//! and are resolved once at startup into an immutable [`Config`] that is
//! handed to the vault, session manager and API client.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Keyring namespace used when `OT_KEYRING_SERVICE` is not set
pub const DEFAULT_KEYRING_NAMESPACE: &str = "gutloit/ot-bot";

/// HTTP request timeout in seconds.
/// 30s allows for a slow identity provider while still failing a stuck run.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const KEY_USER: &str = "OT_USER";
pub const KEY_PASSWORD: &str = "OT_PASSWORD";
pub const KEY_CLIENT_ID: &str = "OT_CLIENT_ID";
pub const KEY_PROVIDER_HOST: &str = "OT_KEYCLOAK_URL";
pub const KEY_REALM: &str = "OT_REALM_NAME";
pub const KEY_CONTROLLER_HOST: &str = "OT_CONTROLLER_URL";
pub const KEY_KEYRING_SERVICE: &str = "OT_KEYRING_SERVICE";
pub const KEY_REQUEST_TIMEOUT: &str = "OT_REQUEST_TIMEOUT_SECS";

#[derive(Clone)]
pub struct Config {
    pub user_id: String,
    pub password: String,
    pub client_id: String,
    pub provider_host: String,
    pub realm: String,
    pub controller_host: String,
    pub keyring_namespace: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Required keys that are missing or blank fail with
    /// [`Error::Configuration`] naming the key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| optional(key).ok_or_else(|| missing(key));

        let request_timeout = match optional(KEY_REQUEST_TIMEOUT) {
            Some(raw) => {
                let secs = raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                    Error::Configuration(format!(
                        "{} must be a positive number of seconds, got {:?}",
                        KEY_REQUEST_TIMEOUT, raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            user_id: required(KEY_USER)?,
            // Passwords may legitimately contain surrounding whitespace
            password: lookup(KEY_PASSWORD)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| missing(KEY_PASSWORD))?,
            client_id: required(KEY_CLIENT_ID)?,
            provider_host: required(KEY_PROVIDER_HOST)?,
            realm: required(KEY_REALM)?,
            controller_host: required(KEY_CONTROLLER_HOST)?,
            keyring_namespace: optional(KEY_KEYRING_SERVICE)
                .unwrap_or_else(|| DEFAULT_KEYRING_NAMESPACE.to_string()),
            request_timeout,
        })
    }

    /// OpenID-Connect token endpoint of the configured realm
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/auth/realms/{}/protocol/openid-connect/token",
            base_url(&self.provider_host),
            self.realm
        )
    }

    /// Absolute URL of a service API path such as `/v1/rooms`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", base_url(&self.controller_host), path)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("provider_host", &self.provider_host)
            .field("realm", &self.realm)
            .field("controller_host", &self.controller_host)
            .field("keyring_namespace", &self.keyring_namespace)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn missing(key: &str) -> Error {
    Error::Configuration(format!("missing value for {}", key))
}

/// Bare hosts are served over https; values with a scheme are used as-is.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

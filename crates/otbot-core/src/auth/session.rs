use std::fmt;

use reqwest::{header, Client, StatusCode};
use tracing::{debug, info, warn};

use super::vault::{CredentialVault, SecretSlot};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::TokenResponse;

/// Scope requested from the identity provider
const TOKEN_SCOPE: &str = "openid";

/// OAuth2 grant used for the login exchange
const GRANT_TYPE: &str = "password";

/// Session secrets as currently stored in the vault.
///
/// Rebuilt from the vault on demand; nothing is cached in memory.
#[derive(Clone)]
pub struct Session {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub refresh_expires_in: Option<u64>,
    pub id_token: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("refresh_expires_in", &self.refresh_expires_in)
            .field("has_id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// An access token was already cached; no request was made
    AlreadyAuthenticated,
    /// Fresh tokens were obtained and stored
    LoggedIn,
}

/// Owns the login/logout lifecycle of the configured user.
///
/// The vault is the only source of truth: the user is authenticated exactly
/// when an access token is stored under their id.
pub struct SessionManager<V> {
    config: Config,
    vault: V,
    client: Client,
}

impl<V: CredentialVault> SessionManager<V> {
    pub fn new(config: Config, vault: V, client: Client) -> Self {
        Self {
            config,
            vault,
            client,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    fn read(&self, slot: SecretSlot) -> Result<Option<String>> {
        self.vault
            .get(&self.config.keyring_namespace, &slot.key(&self.config.user_id))
    }

    fn write(&self, slot: SecretSlot, value: &str) -> Result<()> {
        self.vault
            .set(&self.config.keyring_namespace, &slot.key(&self.config.user_id), value)
    }

    /// Cached bearer token, if any
    pub fn access_token(&self) -> Result<Option<String>> {
        self.read(SecretSlot::AccessToken)
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.access_token()?.is_some())
    }

    /// Stored refresh token. Nothing consumes it yet.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.read(SecretSlot::RefreshToken)
    }

    /// Reconstruct the stored session, or `None` when not authenticated
    pub fn session(&self) -> Result<Option<Session>> {
        let Some(access_token) = self.access_token()? else {
            return Ok(None);
        };

        let refresh_expires_in = match self.read(SecretSlot::RefreshExpiresIn)? {
            Some(raw) => match raw.parse() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    warn!(value = %raw, "Stored refresh expiry is not a number");
                    None
                }
            },
            None => None,
        };

        Ok(Some(Session {
            user_id: self.config.user_id.clone(),
            access_token,
            refresh_token: self.read(SecretSlot::RefreshToken)?,
            refresh_expires_in,
            id_token: self.read(SecretSlot::IdToken)?,
        }))
    }

    /// Log in unless an access token is already cached.
    ///
    /// On failure the vault is left untouched.
    pub async fn login(&self) -> Result<LoginOutcome> {
        if self.is_authenticated()? {
            debug!(user = %self.config.user_id, "Access token cached, skipping login");
            return Ok(LoginOutcome::AlreadyAuthenticated);
        }

        let tokens = self.request_tokens().await?;
        self.store(&tokens)?;

        info!(user = %self.config.user_id, "Login successful");
        Ok(LoginOutcome::LoggedIn)
    }

    /// Remove every session secret of the user. Missing secrets are fine.
    pub fn logout(&self) -> Result<()> {
        let mut first_error = None;
        for slot in SecretSlot::ALL {
            let key = slot.key(&self.config.user_id);
            if let Err(e) = self.vault.delete(&self.config.keyring_namespace, &key) {
                warn!(key = %key, error = %e, "Failed to delete credential");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(user = %self.config.user_id, "Session cleared");
                Ok(())
            }
        }
    }

    /// API client authorized with the cached access token
    pub fn api_client(&self) -> Result<ApiClient> {
        let token = self.access_token()?.ok_or(Error::NotAuthenticated)?;
        Ok(ApiClient::new(self.config.clone(), self.client.clone()).with_token(token))
    }

    /// Resource-owner password credentials exchange with the identity provider
    async fn request_tokens(&self) -> Result<TokenResponse> {
        let url = self.config.token_endpoint();
        let form = [
            ("username", self.config.user_id.as_str()),
            ("password", self.config.password.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("scope", TOKEN_SCOPE),
            ("grant_type", GRANT_TYPE),
        ];

        debug!(url = %url, "Requesting tokens");
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(Error::from_token_status(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Authentication(format!("Failed to parse token response: {}", e)))
    }

    /// Persist all four slots. The access token goes last so a partial write
    /// never looks authenticated; any failure clears what was written.
    fn store(&self, tokens: &TokenResponse) -> Result<()> {
        let refresh_expires_in = tokens.refresh_expires_in.to_string();
        let writes = [
            (SecretSlot::RefreshToken, tokens.refresh_token.as_str()),
            (SecretSlot::RefreshExpiresIn, refresh_expires_in.as_str()),
            (SecretSlot::IdToken, tokens.id_token.as_str()),
            (SecretSlot::AccessToken, tokens.access_token.as_str()),
        ];

        for (slot, value) in writes {
            if let Err(e) = self.write(slot, value) {
                warn!(?slot, error = %e, "Failed to store credential, rolling back");
                if let Err(cleanup) = self.logout() {
                    warn!(error = %cleanup, "Rollback incomplete");
                }
                return Err(e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http_client;
    use crate::auth::MemoryVault;
    use crate::testing::test_config;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/auth/realms/realm/protocol/openid-connect/token";

    fn token_body() -> serde_json::Value {
        serde_json::json!({
            "access_token": "access-1",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "refresh_token": "refresh-1",
            "token_type": "Bearer",
            "id_token": "id-1",
            "not-before-policy": 0,
            "session_state": "state",
            "scope": "openid"
        })
    }

    fn manager<'a>(server: &MockServer, vault: &'a MemoryVault) -> SessionManager<&'a MemoryVault> {
        let config = test_config(&server.uri(), &server.uri());
        let client = http_client(&config).unwrap();
        SessionManager::new(config, vault, client)
    }

    fn stored(vault: &MemoryVault, key: &str) -> Option<String> {
        vault.get("test/ot-bot", key).unwrap()
    }

    #[tokio::test]
    async fn test_login_stores_all_slots() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=alice"))
            .and(body_string_contains("password=pw"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("scope=openid"))
            .and(body_string_contains("grant_type=password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(1)
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        assert!(!sessions.is_authenticated().unwrap());
        assert_eq!(sessions.login().await.unwrap(), LoginOutcome::LoggedIn);
        assert!(sessions.is_authenticated().unwrap());

        assert_eq!(stored(&vault, "alice").as_deref(), Some("access-1"));
        assert_eq!(stored(&vault, "alice_refresh").as_deref(), Some("refresh-1"));
        assert_eq!(stored(&vault, "alice_refresh_expires_in").as_deref(), Some("1800"));
        assert_eq!(stored(&vault, "alice_id_token").as_deref(), Some("id-1"));
        assert_eq!(vault.len(), 4);
    }

    #[tokio::test]
    async fn test_second_login_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(1)
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        assert_eq!(sessions.login().await.unwrap(), LoginOutcome::LoggedIn);
        assert_eq!(
            sessions.login().await.unwrap(),
            LoginOutcome::AlreadyAuthenticated
        );
        assert_eq!(vault.len(), 4);
    }

    #[tokio::test]
    async fn test_cached_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(0)
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        vault.set("test/ot-bot", "alice", "cached").unwrap();
        let sessions = manager(&server, &vault);

        assert_eq!(
            sessions.login().await.unwrap(),
            LoginOutcome::AlreadyAuthenticated
        );
        assert_eq!(vault.len(), 1);
        assert_eq!(stored(&vault, "alice").as_deref(), Some("cached"));
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_vault_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_grant"}"#),
            )
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        let err = sessions.login().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("401"));
        assert!(vault.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_token_response_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        let err = sessions.login().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
        assert!(vault.is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_all_slots() {
        let server = MockServer::start().await;
        let vault = MemoryVault::new();
        for key in ["alice", "alice_refresh", "alice_refresh_expires_in", "alice_id_token"] {
            vault.set("test/ot-bot", key, "x").unwrap();
        }
        vault.set("test/ot-bot", "bob", "other user").unwrap();

        let sessions = manager(&server, &vault);
        sessions.logout().unwrap();

        assert!(!sessions.is_authenticated().unwrap());
        for key in ["alice", "alice_refresh", "alice_refresh_expires_in", "alice_id_token"] {
            assert_eq!(stored(&vault, key), None);
        }
        assert_eq!(stored(&vault, "bob").as_deref(), Some("other user"));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let server = MockServer::start().await;
        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        sessions.logout().unwrap();
        sessions.logout().unwrap();
        assert!(vault.is_empty());
    }

    #[tokio::test]
    async fn test_access_token_is_the_only_signal() {
        let server = MockServer::start().await;
        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        vault.set("test/ot-bot", "alice_refresh", "r").unwrap();
        vault.set("test/ot-bot", "alice_id_token", "i").unwrap();
        assert!(!sessions.is_authenticated().unwrap());
        assert!(sessions.session().unwrap().is_none());

        vault.delete("test/ot-bot", "alice_refresh").unwrap();
        vault.delete("test/ot-bot", "alice_id_token").unwrap();
        vault.set("test/ot-bot", "alice", "a").unwrap();
        assert!(sessions.is_authenticated().unwrap());

        let session = sessions.session().unwrap().unwrap();
        assert_eq!(session.access_token, "a");
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.refresh_expires_in, None);
    }

    #[tokio::test]
    async fn test_session_reconstructed_after_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;

        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);
        sessions.login().await.unwrap();

        let session = sessions.session().unwrap().unwrap();
        assert_eq!(session.user_id, "alice");
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(session.refresh_expires_in, Some(1800));
        assert_eq!(session.id_token.as_deref(), Some("id-1"));
        assert_eq!(sessions.refresh_token().unwrap().as_deref(), Some("refresh-1"));
    }

    #[tokio::test]
    async fn test_api_client_requires_session() {
        let server = MockServer::start().await;
        let vault = MemoryVault::new();
        let sessions = manager(&server, &vault);

        assert!(matches!(sessions.api_client(), Err(Error::NotAuthenticated)));

        vault.set("test/ot-bot", "alice", "a").unwrap();
        assert!(sessions.api_client().unwrap().has_token());
    }

    #[tokio::test]
    async fn test_unreachable_provider_leaves_vault_empty() {
        // Start a server only to obtain a free address, then shut it down
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        let vault = MemoryVault::new();
        let config = test_config(&uri, &uri);
        let client = http_client(&config).unwrap();
        let sessions = SessionManager::new(config, &vault, client);

        let err = sessions.login().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!sessions.is_authenticated().unwrap());
        assert!(vault.is_empty());
    }

    /// Vault that refuses to store one key
    struct FailingVault {
        inner: MemoryVault,
        fail_on: &'static str,
    }

    impl CredentialVault for FailingVault {
        fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
            if key == self.fail_on {
                return Err(keyring::Error::PlatformFailure("store unavailable".into()).into());
            }
            self.inner.set(namespace, key, value)
        }

        fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
            self.inner.get(namespace, key)
        }

        fn delete(&self, namespace: &str, key: &str) -> Result<()> {
            self.inner.delete(namespace, key)
        }
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;

        let vault = FailingVault {
            inner: MemoryVault::new(),
            fail_on: "alice_id_token",
        };
        let config = test_config(&server.uri(), &server.uri());
        let client = http_client(&config).unwrap();
        let sessions = SessionManager::new(config, &vault, client);

        let err = sessions.login().await.unwrap_err();
        assert!(matches!(err, Error::Vault(_)));
        assert!(!sessions.is_authenticated().unwrap());
        assert!(vault.inner.is_empty());
    }
}

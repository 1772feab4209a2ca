use std::collections::HashMap;
use std::sync::Mutex;

use keyring::Entry;
use tracing::debug;

use crate::error::Result;

/// Key/value store for session secrets, scoped by an application namespace.
///
/// `delete` of a missing key succeeds, so clearing a session is idempotent.
pub trait CredentialVault {
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()>;

    /// Returns `Ok(None)` when no secret is stored under `key`.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    fn delete(&self, namespace: &str, key: &str) -> Result<()>;
}

impl<V: CredentialVault + ?Sized> CredentialVault for &V {
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        (**self).set(namespace, key, value)
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        (**self).get(namespace, key)
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        (**self).delete(namespace, key)
    }
}

/// The four secret slots of a session. Each slot lives under the user id,
/// optionally suffixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSlot {
    AccessToken,
    RefreshToken,
    RefreshExpiresIn,
    IdToken,
}

impl SecretSlot {
    pub const ALL: [SecretSlot; 4] = [
        SecretSlot::AccessToken,
        SecretSlot::RefreshToken,
        SecretSlot::RefreshExpiresIn,
        SecretSlot::IdToken,
    ];

    fn suffix(self) -> &'static str {
        match self {
            SecretSlot::AccessToken => "",
            SecretSlot::RefreshToken => "_refresh",
            SecretSlot::RefreshExpiresIn => "_refresh_expires_in",
            SecretSlot::IdToken => "_id_token",
        }
    }

    /// Vault key for this slot of `user_id`
    pub fn key(self, user_id: &str) -> String {
        format!("{}{}", user_id, self.suffix())
    }
}

/// Vault backed by the operating system's secure credential store.
pub struct KeyringVault;

impl CredentialVault for KeyringVault {
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        let entry = Entry::new(namespace, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(namespace, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        let entry = Entry::new(namespace, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                debug!(key, "Credential already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process vault. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets across all namespaces
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), String>> {
        // A poisoned map is still a consistent map: every operation is a single insert/remove
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialVault for MemoryVault {
    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.lock()
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .lock()
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        self.lock().remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}

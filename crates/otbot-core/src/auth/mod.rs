//! Session lifecycle for the configured user.
//!
//! This module provides:
//! - `CredentialVault`: namespaced secret storage, backed by the OS keychain
//! - `SessionManager`: login against the identity provider, logout, and the
//!   "access token present" authentication check
//!
//! Sessions exist only as vault entries; nothing is kept on disk by us.

pub mod session;
pub mod vault;

pub use session::{LoginOutcome, Session, SessionManager};
pub use vault::{CredentialVault, KeyringVault, MemoryVault, SecretSlot};

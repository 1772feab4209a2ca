//! Core library for ot-bot.
//!
//! Logs the configured user in against an OpenID-Connect identity provider,
//! keeps the resulting tokens in the OS credential store, and uses the
//! cached access token to query the room service.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod rooms;

pub use api::ApiClient;
pub use auth::{CredentialVault, KeyringVault, LoginOutcome, MemoryVault, Session, SessionManager};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use notify::{NotificationChannel, StubChannel};
pub use rooms::{render_rooms, RoomLister};

//! Data models for identity provider and service API payloads.
//!
//! - `TokenResponse`: OpenID-Connect token endpoint answer
//! - `Room`, `RoomCreator`: entries of the rooms collection

pub mod room;
pub mod token;

pub use room::{Room, RoomCreator};
pub use token::TokenResponse;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

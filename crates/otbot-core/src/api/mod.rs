//! REST API client for the room service.
//!
//! Requests carry the bearer access token cached by the session manager;
//! the client never logs in on its own.

pub mod client;

pub use client::{http_client, ApiClient, ApiResponse};

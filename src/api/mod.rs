//! # API Module
//!
//! HTTP handlers for the authorization and playlist endpoints. Handlers are
//! thin: they extract the session, call into [`crate::management`] and map
//! the outcome to a response.
//!
//! ## Endpoints
//!
//! - [`hello`] and [`health`] - static liveness endpoints
//! - [`auth_url`] (`POST /auth`, `POST /api`) - issues an authorization URL for
//!   a session and returns it as JSON
//! - [`auth_redirect`] (`GET /auth`) - same, answered with a redirect
//! - [`callback`] (`GET /callback`) - completes the authorization and either
//!   hands the authenticated client to a waiting consumer or builds the
//!   requested playlist directly
//! - [`create_playlist`] (`POST /create-playlist`) - builds a playlist with a
//!   session that already completed authorization
//!
//! ## Sessions
//!
//! Callers name their session with the `session` query parameter or the
//! `x-session-id` header. Without either, the shared default session is used.
//!
//! ## Errors
//!
//! Failures are answered with a status code and a plain-text message; see
//! `error.rs` for the mapping.

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::management::DEFAULT_SESSION;

mod auth;
mod callback;
mod error;
mod health;
mod playlist;

pub use auth::{auth_redirect, auth_url};
pub use callback::callback;
pub use health::{health, hello};
pub use playlist::create_playlist;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

/// Session named by the query string, then the header, then the default.
fn session_id(query: &SessionQuery, headers: &HeaderMap) -> String {
    query
        .session
        .as_deref()
        .or_else(|| {
            headers
                .get(SESSION_HEADER)
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string()
}

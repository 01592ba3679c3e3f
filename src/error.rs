//! Error taxonomy shared by the authorization, token, resolution and assembly layers.
//!
//! Every failure in the pipeline is returned to the requester that caused it.
//! The HTTP mapping lives in [`crate::api`].

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the crate.
pub type Res<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The callback state does not match an outstanding authorization attempt.
    /// Either a forged request, a replay, or a superseded/expired attempt.
    #[error("state mismatch: callback does not match an outstanding authorization")]
    StateMismatch,

    /// The user (or the service) refused the authorization request.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("no results for keyword '{keyword}'")]
    NoResults { keyword: String },

    #[error("search for '{keyword}' failed: {reason}")]
    Search { keyword: String, reason: String },

    #[error("failed to create playlist: {0}")]
    PlaylistCreation(String),

    #[error("failed to add tracks to playlist: {0}")]
    Append(String),

    #[error("failed to look up current user: {0}")]
    CurrentUser(String),

    #[error("timed out after {}s waiting for authorization", .0.as_secs())]
    HandoffTimeout(Duration),

    #[error("authorization handoff was abandoned before completion")]
    HandoffClosed,

    #[error("session is not authenticated")]
    NotAuthenticated,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors that only affect a single keyword and leave the assembly running.
    pub fn is_keyword_scoped(&self) -> bool {
        matches!(self, Error::NoResults { .. } | Error::Search { .. })
    }
}

//! # Spotify Integration Module
//!
//! The remote music service is reached through two trait seams so the
//! authorization and assembly logic never talks HTTP directly:
//!
//! - [`TokenEndpoint`] - the OAuth2 token endpoint (code exchange, refresh)
//! - [`Catalog`] - the Web API operations the pipeline needs (current user,
//!   track search, playlist creation, batch append)
//!
//! [`auth::SpotifyAuth`] and [`client::SpotifyClient`] are the reqwest
//! implementations. A [`CatalogFactory`] turns the per-session token manager
//! into an authenticated catalog client.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - authorization-code exchange and refresh
//! - `GET /me` - owner of the playlist to create
//! - `GET /search?type=track` - keyword resolution
//! - `POST /users/{user_id}/playlists` - playlist creation
//! - `POST /playlists/{playlist_id}/tracks` - append, at most 100 URIs per call
//!
//! ## Error Types
//!
//! Network failures, non-2xx statuses and malformed bodies are all mapped to
//! the operation-specific variant of [`crate::Error`] (`TokenExchange`,
//! `Refresh`, `Search`, `PlaylistCreation`, `Append`, `CurrentUser`), carrying
//! the status and body text.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Res,
    management::TokenManager,
    types::{CreatePlaylistRequest, CurrentUser, Playlist, Token, Track},
};

pub mod auth;
pub mod client;
mod playlist;
mod search;

pub use auth::SpotifyAuth;
pub use client::{SpotifyClient, SpotifyConnector};

/// Maximum number of track URIs accepted by one append call.
pub const APPEND_BATCH_LIMIT: usize = 100;

#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges an authorization code (plus the PKCE verifier it was issued
    /// with) for a token pair. Fails with `Error::TokenExchange`.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Res<Token>;

    /// Trades a refresh token for a new token pair. Fails with `Error::Refresh`.
    async fn refresh(&self, refresh_token: &str) -> Res<Token>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn current_user(&self) -> Res<CurrentUser>;

    /// Free-text track search, results in the service's ranking order.
    async fn search_tracks(&self, query: &str, limit: u32) -> Res<Vec<Track>>;

    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<Playlist>;

    /// Appends `uris` in order. Implementations split into batches of
    /// [`APPEND_BATCH_LIMIT`].
    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Res<()>;
}

pub trait CatalogFactory: Send + Sync {
    fn catalog(&self, tokens: Arc<TokenManager>) -> Arc<dyn Catalog>;
}

/// Turns a non-2xx response into `"<status>: <body>"`.
pub(crate) async fn describe_failure(res: reqwest::Response) -> String {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, body)
    }
}

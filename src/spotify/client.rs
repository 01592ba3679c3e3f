use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use crate::{
    Error, Res,
    management::TokenManager,
    spotify::{Catalog, CatalogFactory, describe_failure},
    types::{CreatePlaylistRequest, CurrentUser, Playlist, Track},
};

/// Web API client acting on behalf of one authenticated session.
///
/// Every request asks the session's [`TokenManager`] for a valid access
/// token first, so expired credentials are refreshed lazily on use.
#[derive(Clone)]
pub struct SpotifyClient {
    pub(super) http: Client,
    pub(super) api_url: String,
    pub(super) tokens: Arc<TokenManager>,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: impl Into<String>, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            tokens,
        }
    }

    pub(super) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Attaches a valid bearer token to `builder`.
    pub(super) async fn authorized(&self, builder: RequestBuilder) -> Res<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token))
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn current_user(&self) -> Res<CurrentUser> {
        let res = self
            .authorized(self.http.get(self.endpoint("me")))
            .await?
            .send()
            .await
            .map_err(|e| Error::CurrentUser(e.to_string()))?;

        if !res.status().is_success() {
            return Err(Error::CurrentUser(describe_failure(res).await));
        }

        res.json::<CurrentUser>()
            .await
            .map_err(|e| Error::CurrentUser(e.to_string()))
    }

    async fn search_tracks(&self, query: &str, limit: u32) -> Res<Vec<Track>> {
        self.search(query, limit).await
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<Playlist> {
        self.create(owner_id, request).await
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Res<()> {
        self.append(playlist_id, uris).await
    }
}

/// Builds [`SpotifyClient`]s that share one HTTP connection pool.
#[derive(Clone)]
pub struct SpotifyConnector {
    http: Client,
    api_url: String,
}

impl SpotifyConnector {
    pub fn new(http: Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }
}

impl CatalogFactory for SpotifyConnector {
    fn catalog(&self, tokens: Arc<TokenManager>) -> Arc<dyn Catalog> {
        Arc::new(SpotifyClient::new(
            self.http.clone(),
            self.api_url.clone(),
            tokens,
        ))
    }
}

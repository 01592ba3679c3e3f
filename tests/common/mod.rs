#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use keytracks::{
    Error, Res,
    config::Config,
    management::{AuthorizationManager, TokenManager},
    server::AppState,
    spotify::{Catalog, CatalogFactory, TokenEndpoint},
    types::{
        CreatePlaylistRequest, CurrentUser, ExternalUrls, Playlist, PlaylistOwner, Token, Track,
        TrackArtist,
    },
};

pub fn test_config() -> Config {
    Config::from_lookup(|var| match var {
        "CLIENT_ID" => Some("client-id".to_string()),
        "CLIENT_SECRET" => Some("client-secret".to_string()),
        _ => None,
    })
    .expect("test config")
}

pub fn token(access: &str, refresh: &str, ttl_secs: i64) -> Token {
    Token {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        scope: "playlist-modify-public playlist-modify-private".to_string(),
        expires_at: Utc::now() + TimeDelta::seconds(ttl_secs),
    }
}

pub fn track(id: &str, artists: &[&str]) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Track {}", id),
        uri: format!("spotify:track:{}", id),
        artists: artists
            .iter()
            .map(|name| TrackArtist {
                id: None,
                name: name.to_string(),
            })
            .collect(),
    }
}

pub struct FakeTokenEndpoint {
    pub exchanges: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub fail_exchange: bool,
    pub fail_refresh: bool,
    pub refresh_delay: Duration,
    pub refreshed_ttl_secs: i64,
}

impl FakeTokenEndpoint {
    pub fn new() -> Self {
        Self {
            exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            fail_exchange: false,
            fail_refresh: false,
            refresh_delay: Duration::ZERO,
            refreshed_ttl_secs: 3600,
        }
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenEndpoint for FakeTokenEndpoint {
    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> Res<Token> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if self.fail_exchange {
            return Err(Error::TokenExchange("400 Bad Request: invalid_grant".to_string()));
        }
        Ok(token(&format!("access-{}", code), "refresh-initial", 3600))
    }

    async fn refresh(&self, refresh_token: &str) -> Res<Token> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }
        if self.fail_refresh {
            return Err(Error::Refresh("400 Bad Request: invalid_grant".to_string()));
        }
        Ok(token(
            &format!("access-refreshed-{}", n),
            refresh_token,
            self.refreshed_ttl_secs,
        ))
    }
}

pub struct FakeCatalog {
    pub user_id: String,
    pub results: HashMap<String, Vec<Track>>,
    pub delays: HashMap<String, Duration>,
    pub failing_searches: HashSet<String>,
    pub fail_create: bool,
    pub fail_append: bool,
    /// When set, every call first asks for a valid access token.
    pub tokens: Option<Arc<TokenManager>>,
    pub user_lookups: AtomicUsize,
    pub created: Mutex<Vec<(String, CreatePlaylistRequest)>>,
    pub appended: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            user_id: "user-1".to_string(),
            results: HashMap::new(),
            delays: HashMap::new(),
            failing_searches: HashSet::new(),
            fail_create: false,
            fail_append: false,
            tokens: None,
            user_lookups: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            appended: Mutex::new(Vec::new()),
        }
    }

    pub fn with_results(mut self, keyword: &str, tracks: Vec<Track>) -> Self {
        self.results.insert(keyword.to_string(), tracks);
        self
    }

    pub fn with_delay(mut self, keyword: &str, delay: Duration) -> Self {
        self.delays.insert(keyword.to_string(), delay);
        self
    }

    pub fn created_playlists(&self) -> Vec<(String, CreatePlaylistRequest)> {
        self.created.lock().unwrap().clone()
    }

    /// All appended URIs in append order.
    pub fn appended_uris(&self) -> Vec<String> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, uris)| uris.clone())
            .collect()
    }

    pub fn append_calls(&self) -> usize {
        self.appended.lock().unwrap().len()
    }

    async fn authorize(&self) -> Res<()> {
        if let Some(tokens) = &self.tokens {
            tokens.access_token().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn current_user(&self) -> Res<CurrentUser> {
        self.authorize().await?;
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(CurrentUser {
            id: self.user_id.clone(),
            display_name: None,
        })
    }

    async fn search_tracks(&self, query: &str, _limit: u32) -> Res<Vec<Track>> {
        self.authorize().await?;
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_searches.contains(query) {
            return Err(Error::Search {
                keyword: query.to_string(),
                reason: "503 Service Unavailable".to_string(),
            });
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<Playlist> {
        self.authorize().await?;
        if self.fail_create {
            return Err(Error::PlaylistCreation("403 Forbidden".to_string()));
        }

        let mut created = self.created.lock().unwrap();
        created.push((owner_id.to_string(), request.clone()));
        let id = format!("pl-{}", created.len());

        Ok(Playlist {
            id: id.clone(),
            name: request.name.clone(),
            public: Some(request.public),
            collaborative: request.collaborative,
            owner: PlaylistOwner {
                id: owner_id.to_string(),
            },
            external_urls: ExternalUrls {
                spotify: Some(format!("https://open.spotify.com/playlist/{}", id)),
            },
        })
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Res<()> {
        self.authorize().await?;
        if self.fail_append {
            return Err(Error::Append("502 Bad Gateway".to_string()));
        }
        self.appended
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), uris.to_vec()));
        Ok(())
    }
}

pub struct FakeConnector {
    pub catalog: Arc<FakeCatalog>,
}

impl CatalogFactory for FakeConnector {
    fn catalog(&self, _tokens: Arc<TokenManager>) -> Arc<dyn Catalog> {
        self.catalog.clone()
    }
}

pub fn authorization_manager(
    endpoint: Arc<FakeTokenEndpoint>,
    ttl: Duration,
) -> AuthorizationManager {
    let config = test_config();
    AuthorizationManager::new(config.auth_url, config.credentials, ttl, endpoint)
}

pub fn app_state(endpoint: Arc<FakeTokenEndpoint>, catalog: Arc<FakeCatalog>) -> AppState {
    let config = test_config();
    let authorization = Arc::new(AuthorizationManager::from_config(&config, endpoint.clone()));
    AppState::with_services(authorization, endpoint, Arc::new(FakeConnector { catalog }))
}

/// Extracts the `state` query parameter of an authorization URL.
pub fn state_of(auth_url: &str) -> String {
    url::Url::parse(auth_url)
        .expect("authorization url")
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state parameter")
}

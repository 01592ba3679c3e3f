use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::{
    Res, api,
    config::Config,
    management::{AuthenticatedSessions, AuthorizationManager, HandoffRegistry},
    spotify::{CatalogFactory, SpotifyAuth, SpotifyConnector, TokenEndpoint},
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub authorization: Arc<AuthorizationManager>,
    pub endpoint: Arc<dyn TokenEndpoint>,
    pub connector: Arc<dyn CatalogFactory>,
    pub sessions: Arc<AuthenticatedSessions>,
    pub handoff: Arc<HandoffRegistry>,
}

impl AppState {
    /// Wires the Spotify implementations from `config`.
    pub fn new(config: &Config) -> Res<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(std::io::Error::other)?;

        let endpoint: Arc<dyn TokenEndpoint> = Arc::new(SpotifyAuth::new(http.clone(), config));
        let connector = Arc::new(SpotifyConnector::new(http, config.api_url.clone()));
        let authorization = Arc::new(AuthorizationManager::from_config(
            config,
            Arc::clone(&endpoint),
        ));

        Ok(Self::with_services(authorization, endpoint, connector))
    }

    pub fn with_services(
        authorization: Arc<AuthorizationManager>,
        endpoint: Arc<dyn TokenEndpoint>,
        connector: Arc<dyn CatalogFactory>,
    ) -> Self {
        Self {
            authorization,
            endpoint,
            connector,
            sessions: Arc::new(AuthenticatedSessions::new()),
            handoff: Arc::new(HandoffRegistry::new()),
        }
    }

    /// Starts the periodic eviction of expired attempts, abandoned waiters and
    /// idle authenticated sessions.
    pub fn spawn_cleanup_tasks(&self) {
        self.authorization.spawn_cleanup_task();

        let handoff = Arc::clone(&self.handoff);
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                handoff.cleanup();
                let evicted = sessions.cleanup();
                if evicted > 0 {
                    debug!(evicted, "idle sessions evicted");
                }
            }
        });
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(api::SESSION_HEADER),
        ]);

    Router::new()
        .route("/", get(api::hello))
        .route("/health", get(api::health))
        .route("/auth", get(api::auth_redirect).post(api::auth_url))
        .route("/api", post(api::auth_url))
        .route("/callback", get(api::callback))
        .route("/create-playlist", post(api::create_playlist))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn bind(addr: SocketAddr) -> Res<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    Ok(listener)
}

pub async fn start_api_server(listener: TcpListener, state: AppState) -> Res<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening");
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}

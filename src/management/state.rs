use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    Error, Res,
    config::{Config, Credentials},
    spotify::{TokenEndpoint, auth::authorization_url},
    types::{PlaylistRequest, Token},
    utils,
};

/// Session used when the caller does not name one. A process that only ever
/// uses this session has exactly one outstanding authorization attempt.
pub const DEFAULT_SESSION: &str = "default";

const TOKEN_SEPARATOR: char = '.';
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// One outstanding authorization attempt.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub state_token: String,
    pub pending_payload: PlaylistRequest,
    pkce_verifier: String,
    created_at: Instant,
}

impl AuthSession {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub session_id: String,
    pub state_token: String,
    pub url: Url,
}

#[derive(Debug, Clone)]
pub struct CompletedAuthorization {
    pub session_id: String,
    pub token: Token,
    pub payload: PlaylistRequest,
}

/// Issues and consumes authorization attempts.
///
/// Attempts are kept per session id. Issuing a new attempt for a session
/// supersedes the previous one, and an attempt is consumed exactly once:
/// consumption is an atomic remove on the session entry guarded by a
/// comparison of the full state token.
///
/// State tokens look like `<session_id>.<nonce>` where the nonce is 32 random
/// bytes, so the session can be found from the callback alone.
pub struct AuthorizationManager {
    auth_url: Url,
    credentials: Credentials,
    ttl: Duration,
    endpoint: Arc<dyn TokenEndpoint>,
    sessions: DashMap<String, AuthSession>,
}

impl AuthorizationManager {
    pub fn new(
        auth_url: Url,
        credentials: Credentials,
        ttl: Duration,
        endpoint: Arc<dyn TokenEndpoint>,
    ) -> Self {
        Self {
            auth_url,
            credentials,
            ttl,
            endpoint,
            sessions: DashMap::new(),
        }
    }

    pub fn from_config(config: &Config, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        Self::new(
            config.auth_url.clone(),
            config.credentials.clone(),
            config.session_ttl,
            endpoint,
        )
    }

    /// Issues an authorization URL for the default session.
    pub fn issue_authorization_url(&self, payload: PlaylistRequest) -> Res<AuthorizationRequest> {
        self.issue_for_session(DEFAULT_SESSION, payload)
    }

    /// Issues a fresh state token for `session_id` and builds the URL the user
    /// has to visit. Any unconsumed attempt of the same session becomes invalid.
    pub fn issue_for_session(
        &self,
        session_id: &str,
        payload: PlaylistRequest,
    ) -> Res<AuthorizationRequest> {
        if !utils::is_valid_session_id(session_id) {
            return Err(Error::InvalidRequest(format!(
                "invalid session id '{}'",
                session_id
            )));
        }

        let state_token = format!(
            "{}{}{}",
            session_id,
            TOKEN_SEPARATOR,
            utils::generate_state_nonce()
        );
        let pkce_verifier = utils::generate_code_verifier();
        let challenge = utils::generate_code_challenge(&pkce_verifier);
        let url = authorization_url(&self.auth_url, &self.credentials, &state_token, &challenge);

        let session = AuthSession {
            state_token: state_token.clone(),
            pending_payload: payload,
            pkce_verifier,
            created_at: Instant::now(),
        };

        if self
            .sessions
            .insert(session_id.to_string(), session)
            .is_some()
        {
            debug!(session = session_id, "superseded outstanding authorization");
        }
        debug!(session = session_id, "authorization url issued");

        Ok(AuthorizationRequest {
            session_id: session_id.to_string(),
            state_token,
            url,
        })
    }

    /// Validates the callback state and exchanges `code` for a token pair.
    ///
    /// Fails with `StateMismatch` without contacting the token endpoint when
    /// the state was never issued, was superseded, has expired or was already
    /// consumed. The attempt is consumed before the exchange, so a failed
    /// exchange cannot be retried with the same state.
    pub async fn complete_authorization(
        &self,
        received_state: &str,
        code: &str,
    ) -> Res<CompletedAuthorization> {
        let session = self.consume(received_state)?;
        let session_id = session_of(received_state).unwrap_or_default().to_string();

        let token = self
            .endpoint
            .exchange_code(code, &session.pkce_verifier)
            .await?;

        info!(session = %session_id, "authorization completed");
        Ok(CompletedAuthorization {
            session_id,
            token,
            payload: session.pending_payload,
        })
    }

    /// Consumes the attempt matching `received_state` without exchanging a
    /// code, e.g. when the user denied access. Returns whether one matched.
    pub fn abandon(&self, received_state: &str) -> bool {
        self.consume(received_state).is_ok()
    }

    fn consume(&self, received_state: &str) -> Res<AuthSession> {
        let Some(session_id) = session_of(received_state) else {
            warn!("callback state is malformed");
            return Err(Error::StateMismatch);
        };

        let Some((_, session)) = self.sessions.remove_if(session_id, |_, s| {
            utils::secrets_match(&s.state_token, received_state)
        }) else {
            warn!(session = session_id, "callback state does not match");
            return Err(Error::StateMismatch);
        };

        if session.is_expired(self.ttl) {
            warn!(session = session_id, "authorization attempt expired");
            return Err(Error::StateMismatch);
        }

        Ok(session)
    }

    /// State token currently outstanding for `session_id`, if any.
    pub fn outstanding(&self, session_id: &str) -> Option<String> {
        self.sessions
            .get(session_id)
            .filter(|s| !s.is_expired(self.ttl))
            .map(|s| s.state_token.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.sessions.len()
    }

    /// Evicts expired attempts.
    pub fn cleanup(&self) {
        let ttl = self.ttl;
        self.sessions.retain(|_, s| !s.is_expired(ttl));
    }

    /// Spawns a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                manager.cleanup();
            }
        })
    }
}

fn session_of(state_token: &str) -> Option<&str> {
    state_token
        .split_once(TOKEN_SEPARATOR)
        .map(|(session, _)| session)
        .filter(|session| utils::is_valid_session_id(session))
}

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Error, Res, spotify::TokenEndpoint, types::Token};

/// Tokens are treated as expired this many seconds before their actual
/// expiry, so a token handed out is still valid for at least this long.
pub const EXPIRY_SKEW_SECS: i64 = 60;

pub fn is_expired(token: &Token, now: DateTime<Utc>) -> bool {
    now >= token.expires_at - TimeDelta::seconds(EXPIRY_SKEW_SECS)
}

/// Returns `current` if it is still valid, otherwise a refreshed credential.
///
/// Refresh failures are returned as `Error::Refresh`, never swallowed. The
/// returned token is guaranteed not to be expired (skew included) at return
/// time.
pub async fn get_valid_credential(current: Token, endpoint: &dyn TokenEndpoint) -> Res<Token> {
    if !is_expired(&current, Utc::now()) {
        return Ok(current);
    }

    debug!(expired_at = %current.expires_at, "access token expired, refreshing");
    let fresh = endpoint.refresh(&current.refresh_token).await?;

    if is_expired(&fresh, Utc::now()) {
        return Err(Error::Refresh(
            "refreshed credential is already expired".to_string(),
        ));
    }

    Ok(fresh)
}

/// Owns the live credential of one authenticated session.
///
/// The lock is held across the refresh call, so concurrent callers wait for
/// a single refresh instead of racing with the same refresh token.
pub struct TokenManager {
    token: Mutex<Token>,
    endpoint: Arc<dyn TokenEndpoint>,
}

impl TokenManager {
    pub fn new(token: Token, endpoint: Arc<dyn TokenEndpoint>) -> Self {
        TokenManager {
            token: Mutex::new(token),
            endpoint,
        }
    }

    pub async fn valid_token(&self) -> Res<Token> {
        let mut guard = self.token.lock().await;
        let token = get_valid_credential(guard.clone(), self.endpoint.as_ref()).await?;
        if token.access_token != guard.access_token {
            info!("access token refreshed");
        }
        *guard = token.clone();
        Ok(token)
    }

    pub async fn access_token(&self) -> Res<String> {
        Ok(self.valid_token().await?.access_token)
    }

    pub async fn current_token(&self) -> Token {
        self.token.lock().await.clone()
    }
}

/// Authenticated sessions unused for this long are evicted by [`AuthenticatedSessions::cleanup`].
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct AuthenticatedEntry {
    tokens: Arc<TokenManager>,
    last_used: Instant,
}

/// Credentials of sessions that completed authorization, by session id.
///
/// Every lookup marks the session as used; sessions idle for longer than
/// the idle TTL are dropped on cleanup.
pub struct AuthenticatedSessions {
    sessions: DashMap<String, AuthenticatedEntry>,
    idle_ttl: Duration,
}

impl Default for AuthenticatedSessions {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_SESSION_IDLE_TTL)
    }
}

impl AuthenticatedSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl,
        }
    }

    /// Stores the credential for `session_id`, replacing any earlier one.
    pub fn insert(&self, session_id: &str, tokens: Arc<TokenManager>) {
        self.sessions.insert(
            session_id.to_string(),
            AuthenticatedEntry {
                tokens,
                last_used: Instant::now(),
            },
        );
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<TokenManager>> {
        self.sessions.get_mut(session_id).map(|mut entry| {
            entry.last_used = Instant::now();
            Arc::clone(&entry.tokens)
        })
    }

    pub fn remove(&self, session_id: &str) -> Option<Arc<TokenManager>> {
        self.sessions.remove(session_id).map(|(_, entry)| entry.tokens)
    }

    /// Drops idle sessions and returns how many were dropped.
    pub fn cleanup(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.idle_ttl;
        self.sessions
            .retain(|_, entry| entry.last_used.elapsed() <= ttl);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

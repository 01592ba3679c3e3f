use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::debug;

use crate::{Error, Res, management::TokenManager, types::PlaylistRequest};

/// Result of a completed authorization, handed to whoever builds the playlist.
pub struct AuthenticatedClient {
    pub session_id: String,
    pub tokens: Arc<TokenManager>,
    pub payload: PlaylistRequest,
}

/// Consumers waiting for the browser-driven authorization of a session.
///
/// At most one consumer waits per session; registering again replaces the
/// earlier waiter, whose receiver then reports `HandoffClosed`.
#[derive(Default)]
pub struct HandoffRegistry {
    waiting: DashMap<String, oneshot::Sender<AuthenticatedClient>>,
}

impl HandoffRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session_id: &str) -> HandoffReceiver {
        let (tx, rx) = oneshot::channel();
        if self.waiting.insert(session_id.to_string(), tx).is_some() {
            debug!(session = session_id, "replaced waiting consumer");
        }
        HandoffReceiver {
            session_id: session_id.to_string(),
            rx,
        }
    }

    /// Whether a consumer that has not gone away waits on `session_id`.
    pub fn is_waiting(&self, session_id: &str) -> bool {
        self.waiting
            .get(session_id)
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    /// Hands `client` to the consumer waiting on its session.
    ///
    /// Never blocks. Returns the client back when nobody is waiting (or the
    /// consumer already gave up), so the caller can continue synchronously.
    pub fn try_deliver(&self, client: AuthenticatedClient) -> Option<AuthenticatedClient> {
        let Some((_, tx)) = self.waiting.remove(&client.session_id) else {
            return Some(client);
        };

        match tx.send(client) {
            Ok(()) => None,
            Err(client) => {
                debug!(session = %client.session_id, "waiting consumer already gone");
                Some(client)
            }
        }
    }

    /// Drops senders whose consumer has gone away.
    pub fn cleanup(&self) {
        self.waiting.retain(|_, tx| !tx.is_closed());
    }
}

pub struct HandoffReceiver {
    session_id: String,
    rx: oneshot::Receiver<AuthenticatedClient>,
}

impl HandoffReceiver {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Waits at most `timeout` for the authorization to complete.
    pub async fn wait(self, timeout: Duration) -> Res<AuthenticatedClient> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(_)) => Err(Error::HandoffClosed),
            Err(_) => Err(Error::HandoffTimeout(timeout)),
        }
    }
}

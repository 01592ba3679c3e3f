mod common;

use std::{sync::Arc, time::Duration};

use chrono::{TimeDelta, Utc};
use keytracks::{
    Error,
    management::{
        AuthenticatedSessions, EXPIRY_SKEW_SECS, TokenManager, get_valid_credential, is_expired,
    },
    types::{Token, TokenResponse},
};

use common::{FakeTokenEndpoint, token};

#[test]
fn test_is_expired_applies_skew() {
    let now = Utc::now();
    let mut t = token("a", "r", 0);

    t.expires_at = now + TimeDelta::seconds(EXPIRY_SKEW_SECS + 5);
    assert!(!is_expired(&t, now));

    t.expires_at = now + TimeDelta::seconds(EXPIRY_SKEW_SECS - 5);
    assert!(is_expired(&t, now));

    t.expires_at = now - TimeDelta::seconds(1);
    assert!(is_expired(&t, now));
}

#[tokio::test]
async fn test_valid_credential_is_returned_unchanged() {
    let endpoint = FakeTokenEndpoint::new();
    let current = token("still-good", "refresh", 3600);

    let result = get_valid_credential(current, &endpoint).await.unwrap();

    assert_eq!(result.access_token, "still-good");
    assert_eq!(endpoint.refresh_count(), 0);
}

#[tokio::test]
async fn test_expired_credential_is_refreshed() {
    let endpoint = FakeTokenEndpoint::new();
    let current = token("stale", "refresh-1", -10);

    let result = get_valid_credential(current, &endpoint).await.unwrap();

    assert_eq!(result.access_token, "access-refreshed-1");
    assert_eq!(result.refresh_token, "refresh-1");
    assert!(!is_expired(&result, Utc::now()));
    assert_eq!(endpoint.refresh_count(), 1);
}

#[tokio::test]
async fn test_credential_inside_skew_is_refreshed() {
    let endpoint = FakeTokenEndpoint::new();
    let current = token("almost", "refresh-1", EXPIRY_SKEW_SECS / 2);

    let result = get_valid_credential(current, &endpoint).await.unwrap();

    assert_eq!(result.access_token, "access-refreshed-1");
}

#[tokio::test]
async fn test_refresh_failure_is_surfaced() {
    let mut endpoint = FakeTokenEndpoint::new();
    endpoint.fail_refresh = true;

    let result = get_valid_credential(token("stale", "revoked", -10), &endpoint).await;

    assert!(matches!(result, Err(Error::Refresh(_))));
}

#[tokio::test]
async fn test_refreshed_but_expired_credential_is_rejected() {
    let mut endpoint = FakeTokenEndpoint::new();
    endpoint.refreshed_ttl_secs = 10;

    let result = get_valid_credential(token("stale", "refresh", -10), &endpoint).await;

    assert!(matches!(result, Err(Error::Refresh(_))));
}

#[tokio::test]
async fn test_manager_stores_refreshed_credential() {
    let endpoint = Arc::new(FakeTokenEndpoint::new());
    let manager = TokenManager::new(token("stale", "refresh-1", -10), endpoint.clone());

    assert_eq!(manager.access_token().await.unwrap(), "access-refreshed-1");
    assert_eq!(manager.access_token().await.unwrap(), "access-refreshed-1");
    assert_eq!(
        manager.current_token().await.access_token,
        "access-refreshed-1"
    );
    assert_eq!(endpoint.refresh_count(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let mut endpoint = FakeTokenEndpoint::new();
    endpoint.refresh_delay = Duration::from_millis(50);
    let endpoint = Arc::new(endpoint);
    let manager = Arc::new(TokenManager::new(
        token("stale", "refresh-1", -10),
        endpoint.clone(),
    ));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.access_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "access-refreshed-1");
    }
    assert_eq!(endpoint.refresh_count(), 1);
}

#[tokio::test]
async fn test_manager_keeps_credential_after_failed_refresh() {
    let mut endpoint = FakeTokenEndpoint::new();
    endpoint.fail_refresh = true;
    let manager = TokenManager::new(token("stale", "refresh-1", -10), Arc::new(endpoint));

    assert!(matches!(
        manager.valid_token().await,
        Err(Error::Refresh(_))
    ));
    assert_eq!(manager.current_token().await.access_token, "stale");
}

fn token_response(expires_in: u64, refresh_token: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: "access".to_string(),
        token_type: Some("Bearer".to_string()),
        scope: None,
        expires_in,
        refresh_token: refresh_token.map(str::to_string),
    }
}

#[test]
fn test_from_response_computes_expiry() {
    let now = Utc::now();
    let t = Token::from_response(token_response(3600, Some("r")), None, now).unwrap();

    assert_eq!(t.expires_at, now + TimeDelta::seconds(3600));
    assert_eq!(t.refresh_token, "r");
}

#[test]
fn test_from_response_keeps_previous_refresh_token() {
    let now = Utc::now();
    let t = Token::from_response(token_response(3600, None), Some("old"), now).unwrap();
    assert_eq!(t.refresh_token, "old");

    let t = Token::from_response(token_response(3600, Some("")), Some("old"), now).unwrap();
    assert_eq!(t.refresh_token, "old");

    assert!(Token::from_response(token_response(3600, None), None, now).is_none());
}

#[test]
fn test_from_response_rejects_unrepresentable_expiry() {
    let now = Utc::now();

    for expires_in in [10u64.pow(15), i64::MAX as u64, u64::MAX] {
        assert!(
            Token::from_response(token_response(expires_in, Some("r")), None, now).is_none(),
            "expires_in {} was accepted",
            expires_in
        );
    }
}

#[tokio::test]
async fn test_idle_sessions_are_evicted() {
    let endpoint = Arc::new(FakeTokenEndpoint::new());
    let sessions = AuthenticatedSessions::with_idle_ttl(Duration::from_millis(100));
    sessions.insert(
        "idle",
        Arc::new(TokenManager::new(token("a", "r", 3600), endpoint.clone())),
    );
    sessions.insert(
        "busy",
        Arc::new(TokenManager::new(token("b", "r", 3600), endpoint)),
    );

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(sessions.get("busy").is_some());
    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(sessions.cleanup(), 1);
    assert!(sessions.get("idle").is_none());
    assert!(sessions.get("busy").is_some());
}

#[test]
fn test_fresh_sessions_survive_cleanup() {
    let sessions = AuthenticatedSessions::new();
    sessions.insert(
        "web",
        Arc::new(TokenManager::new(
            token("a", "r", 3600),
            Arc::new(FakeTokenEndpoint::new()),
        )),
    );

    assert_eq!(sessions.cleanup(), 0);
    assert_eq!(sessions.len(), 1);
}

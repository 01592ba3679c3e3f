use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    Error, Res,
    config::{Config, Credentials},
    spotify::{TokenEndpoint, describe_failure},
    types::{Token, TokenResponse},
};

/// Scopes needed to create playlists and add tracks to them.
pub const SCOPES: &[&str] = &["playlist-modify-public", "playlist-modify-private"];

const MALFORMED_TOKEN_RESPONSE: &str = "response carried no refresh token or an invalid expiry";

/// Builds the authorization URL the user is sent to.
///
/// The URL carries the client id, `response_type=code`, the redirect URI, the
/// requested scopes, the anti-forgery `state` and the S256 PKCE challenge.
pub fn authorization_url(
    auth_url: &Url,
    credentials: &Credentials,
    state: &str,
    code_challenge: &str,
) -> Url {
    let mut url = auth_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &credentials.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", credentials.redirect_uri.as_str())
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("state", state)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", code_challenge);
    url
}

/// Token endpoint client authenticating with HTTP Basic client credentials.
pub struct SpotifyAuth {
    http: Client,
    token_url: Url,
    credentials: Credentials,
}

impl SpotifyAuth {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            credentials: config.credentials.clone(),
        }
    }

    async fn request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, String> {
        let res = self
            .http
            .post(self.token_url.clone())
            .basic_auth(
                &self.credentials.client_id,
                Some(self.credentials.client_secret()),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !res.status().is_success() {
            return Err(describe_failure(res).await);
        }

        res.json::<TokenResponse>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TokenEndpoint for SpotifyAuth {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Res<Token> {
        let response = self
            .request(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("code_verifier", code_verifier),
            ])
            .await
            .map_err(Error::TokenExchange)?;

        debug!("authorization code exchanged");
        Token::from_response(response, None, Utc::now())
            .ok_or_else(|| Error::TokenExchange(MALFORMED_TOKEN_RESPONSE.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Res<Token> {
        let response = self
            .request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(Error::Refresh)?;

        debug!("access token refreshed");
        Token::from_response(response, Some(refresh_token), Utc::now())
            .ok_or_else(|| Error::Refresh(MALFORMED_TOKEN_RESPONSE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_carries_required_parameters() {
        let credentials = Credentials::new(
            "client-123".to_string(),
            "secret".to_string(),
            Url::parse("http://localhost:8080/callback").unwrap(),
        );
        let base = Url::parse("https://accounts.spotify.com/authorize").unwrap();

        let url = authorization_url(&base, &credentials, "default.abc", "challenge");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.clone())
        };

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(get("client_id").as_deref(), Some("client-123"));
        assert_eq!(get("response_type").as_deref(), Some("code"));
        assert_eq!(
            get("redirect_uri").as_deref(),
            Some("http://localhost:8080/callback")
        );
        assert_eq!(
            get("scope").as_deref(),
            Some("playlist-modify-public playlist-modify-private")
        );
        assert_eq!(get("state").as_deref(), Some("default.abc"));
        assert_eq!(get("code_challenge_method").as_deref(), Some("S256"));
        assert!(!url.as_str().contains("secret"));
    }
}

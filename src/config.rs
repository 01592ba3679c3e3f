//! Configuration management for the keyword playlist builder.
//!
//! This module handles loading configuration values from environment variables
//! and `.env` files. The application credentials (client id, client secret and
//! redirect URI) form the credential store: they are read once at startup and
//! never change afterwards.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory, then in the working directory
//! 3. Application defaults (where applicable)

use std::{env, fmt, net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;
use url::Url;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_HANDOFF_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("cannot load environment file: {0}")]
    EnvFile(String),
}

/// Loads environment variables from `.env` files.
///
/// Looks for `keytracks/.env` in the platform-specific local data directory
/// first and then for `.env` in the working directory. Variables already set
/// in the process environment are never overridden, and a missing file is not
/// an error.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/keytracks/.env`
/// - macOS: `~/Library/Application Support/keytracks/.env`
/// - Windows: `%LOCALAPPDATA%/keytracks/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), ConfigError> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("keytracks/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::EnvFile(e.to_string()))?;
    }

    for candidate in [path, PathBuf::from(".env")] {
        if !candidate.is_file() {
            continue;
        }
        dotenv::from_path(&candidate)
            .map_err(|e| ConfigError::EnvFile(format!("{}: {}", candidate.display(), e)))?;
    }

    Ok(())
}

/// The application's registration with the authorization server.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    client_secret: String,
    pub redirect_uri: Url,
}

impl Credentials {
    pub fn new(client_id: String, client_secret: String, redirect_uri: Url) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri.as_str())
            .finish()
    }
}

/// Runtime configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub server_addr: SocketAddr,
    pub auth_url: Url,
    pub token_url: Url,
    /// Web API base without trailing slash.
    pub api_url: String,
    /// How long a waiting consumer blocks for the authorization callback.
    pub handoff_timeout: Duration,
    /// How long an issued authorization attempt stays valid.
    pub session_ttl: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Required variables
    ///
    /// - `CLIENT_ID`
    /// - `CLIENT_SECRET`
    ///
    /// # Optional variables
    ///
    /// `REDIRECT_URI`, `SERVER_ADDRESS`, `SPOTIFY_API_AUTH_URL`,
    /// `SPOTIFY_API_TOKEN_URL`, `SPOTIFY_API_URL`, `HANDOFF_TIMEOUT_SECS` and
    /// `SESSION_TTL_SECS` fall back to the `DEFAULT_*` constants.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let client_id = get("CLIENT_ID").ok_or(ConfigError::Missing("CLIENT_ID"))?;
        let client_secret = get("CLIENT_SECRET").ok_or(ConfigError::Missing("CLIENT_SECRET"))?;

        let redirect_uri = parse_url(
            "REDIRECT_URI",
            get("REDIRECT_URI").as_deref().unwrap_or(DEFAULT_REDIRECT_URI),
        )?;
        let auth_url = parse_url(
            "SPOTIFY_API_AUTH_URL",
            get("SPOTIFY_API_AUTH_URL")
                .as_deref()
                .unwrap_or(DEFAULT_AUTH_URL),
        )?;
        let token_url = parse_url(
            "SPOTIFY_API_TOKEN_URL",
            get("SPOTIFY_API_TOKEN_URL")
                .as_deref()
                .unwrap_or(DEFAULT_TOKEN_URL),
        )?;
        let api_url = parse_url(
            "SPOTIFY_API_URL",
            get("SPOTIFY_API_URL").as_deref().unwrap_or(DEFAULT_API_URL),
        )?
        .as_str()
        .trim_end_matches('/')
        .to_string();

        let server_addr = get("SERVER_ADDRESS")
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_ADDRESS)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "SERVER_ADDRESS",
                reason: e.to_string(),
            })?;

        let handoff_timeout = parse_secs(
            "HANDOFF_TIMEOUT_SECS",
            get("HANDOFF_TIMEOUT_SECS"),
            DEFAULT_HANDOFF_TIMEOUT_SECS,
        )?;
        let session_ttl = parse_secs(
            "SESSION_TTL_SECS",
            get("SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?;

        Ok(Self {
            credentials: Credentials::new(client_id, client_secret, redirect_uri),
            server_addr,
            auth_url,
            token_url,
            api_url,
            handoff_timeout,
            session_ttl,
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn parse_secs(
    var: &'static str,
    value: Option<String>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match value {
        Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        })?,
        None => default,
    };
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

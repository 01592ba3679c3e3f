use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Access/refresh token pair with its absolute expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Builds a token from a token-endpoint response received at `now`.
    ///
    /// Refresh responses may omit the refresh token; `fallback_refresh` is kept
    /// in that case. Returns `None` when no refresh token is available or
    /// `expires_in` does not yield a representable expiry.
    pub fn from_response(
        response: TokenResponse,
        fallback_refresh: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| fallback_refresh.map(str::to_string))?;

        let expires_at = i64::try_from(response.expires_in)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))?;

        Some(Token {
            access_token: response.access_token,
            refresh_token,
            scope: response.scope.unwrap_or_default(),
            expires_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// What the initiator wants built once authorization completes.
///
/// Also the JSON body of `/auth` and `/create-playlist`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRequest {
    #[serde(default)]
    pub playlist_name: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Acceptable artists per keyword, parallel to `keywords`.
    #[serde(default, rename = "artists")]
    pub artist_constraints: Option<Vec<Vec<String>>>,
}

impl PlaylistRequest {
    pub fn has_keywords(&self) -> bool {
        self.keywords.iter().any(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub collaborative: bool,
    pub owner: PlaylistOwner,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

impl Playlist {
    pub fn external_url(&self) -> Option<&str> {
        self.external_urls.spotify.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

/// How a resolved track relates to the keyword's artist constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// No constraint given; first search result.
    Unconstrained,
    /// First result whose artists intersect the constraint.
    ArtistMatch,
    /// Constraint given but nothing matched; first search result.
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub keyword: String,
    pub catalog_id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedKeyword {
    pub keyword: String,
    pub reason: String,
}

/// Outcome of one playlist assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyReport {
    pub playlist: Playlist,
    pub tracks: Vec<ResolvedTrack>,
    pub skipped: Vec<SkippedKeyword>,
}

impl AssemblyReport {
    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.catalog_id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
    pub session: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub status: String,
    pub url: String,
    #[serde(default)]
    pub skipped: Vec<SkippedKeyword>,
}

#[derive(Tabled)]
pub struct ResolutionTableRow {
    pub keyword: String,
    pub track: String,
    pub artists: String,
    pub status: String,
}

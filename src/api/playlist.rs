use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use tracing::warn;

use crate::{
    Error, Res,
    api::{SessionQuery, session_id},
    management::PlaylistAssembler,
    server::AppState,
    types::{CreatePlaylistResponse, PlaylistRequest},
};

const PLAYLIST_WEB_URL: &str = "https://open.spotify.com/playlist";

/// `POST /create-playlist` - builds a playlist with an authenticated session.
pub async fn create_playlist(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    Json(request): Json<PlaylistRequest>,
) -> Res<Json<CreatePlaylistResponse>> {
    let session = session_id(&query, &headers);
    let tokens = state
        .sessions
        .get(&session)
        .ok_or(Error::NotAuthenticated)?;

    let catalog = state.connector.catalog(tokens);
    let report = match PlaylistAssembler::new(catalog).assemble(None, &request).await {
        Ok(report) => report,
        Err(e @ Error::Refresh(_)) => {
            // The credential cannot be renewed; the session has to authorize again.
            state.sessions.remove(&session);
            warn!(session = %session, "credential refresh failed, session dropped");
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let url = report
        .playlist
        .external_url()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}/{}", PLAYLIST_WEB_URL, report.playlist.id));

    Ok(Json(CreatePlaylistResponse {
        status: "Done!".to_string(),
        url,
        skipped: report.skipped,
    }))
}

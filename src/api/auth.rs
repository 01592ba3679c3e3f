use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
};

use crate::{
    Error, Res,
    api::{SessionQuery, session_id},
    management::keyword_queries,
    server::AppState,
    types::{AuthUrlResponse, PlaylistRequest},
};

/// `POST /auth`, `POST /api` - issues an authorization URL.
///
/// The optional JSON body (`{playlistName, keywords, artists}`) is carried
/// through the redirect and used when the callback arrives. A payload with
/// keywords is validated before any authorization attempt is issued.
pub async fn auth_url(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Res<Json<AuthUrlResponse>> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        PlaylistRequest::default()
    } else {
        serde_json::from_slice::<PlaylistRequest>(&body)
            .map_err(|e| Error::InvalidRequest(format!("malformed payload: {}", e)))?
    };

    if payload.has_keywords() {
        keyword_queries(&payload)?;
    }

    let session = session_id(&query, &headers);
    let request = state.authorization.issue_for_session(&session, payload)?;

    Ok(Json(AuthUrlResponse {
        auth_url: request.url.to_string(),
        session: request.session_id,
    }))
}

/// `GET /auth` - issues an authorization URL and redirects the browser to it.
pub async fn auth_redirect(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
) -> Res<Redirect> {
    let session = session_id(&query, &headers);
    let request = state
        .authorization
        .issue_for_session(&session, PlaylistRequest::default())?;
    Ok(Redirect::to(request.url.as_str()))
}

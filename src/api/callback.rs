use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    Error, Res,
    management::{AuthenticatedClient, PlaylistAssembler, TokenManager},
    server::AppState,
    types::AssemblyReport,
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /callback` - completes the authorization started by `/auth`.
///
/// The credential is stored for the session. When a consumer waits on the
/// session the authenticated client is handed over; otherwise a pending
/// playlist request is assembled right here and its link returned.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Res<Html<String>> {
    if let Some(reason) = params.error {
        if let Some(received) = params.state.as_deref() {
            state.authorization.abandon(received);
        }
        return Err(Error::AuthorizationDenied(reason));
    }

    let Some(received) = params.state.as_deref() else {
        return Err(Error::StateMismatch);
    };
    let Some(code) = params.code.as_deref() else {
        return Err(Error::InvalidRequest(
            "missing authorization code".to_string(),
        ));
    };

    let completed = state
        .authorization
        .complete_authorization(received, code)
        .await?;

    let tokens = Arc::new(TokenManager::new(
        completed.token,
        Arc::clone(&state.endpoint),
    ));
    state.sessions.insert(&completed.session_id, Arc::clone(&tokens));

    let client = AuthenticatedClient {
        session_id: completed.session_id,
        tokens,
        payload: completed.payload,
    };

    let Some(client) = state.handoff.try_deliver(client) else {
        return Ok(Html(
            "<h2>Authentication successful.</h2><p>Close browser window.</p>".to_string(),
        ));
    };

    if !client.payload.has_keywords() {
        return Ok(Html(
            "<h2>Login Completed!</h2><p>You can now create playlists.</p>".to_string(),
        ));
    }

    info!(session = %client.session_id, "assembling pending playlist");
    let catalog = state.connector.catalog(client.tokens);
    let report = PlaylistAssembler::new(catalog)
        .assemble(None, &client.payload)
        .await?;

    Ok(Html(render_report(&report)))
}

fn render_report(report: &AssemblyReport) -> String {
    let name = escape_html(&report.playlist.name);
    let mut html = match report.playlist.external_url() {
        Some(url) => format!(
            "<h2>Playlist created.</h2><p><a href=\"{}\">{}</a> ({} tracks)</p>",
            escape_html(url),
            name,
            report.tracks.len()
        ),
        None => format!(
            "<h2>Playlist created.</h2><p>{} ({} tracks)</p>",
            name,
            report.tracks.len()
        ),
    };

    if !report.skipped.is_empty() {
        html.push_str("<p>Skipped keywords:</p><ul>");
        for skipped in &report.skipped {
            html.push_str(&format!(
                "<li>{}: {}</li>",
                escape_html(&skipped.keyword),
                escape_html(&skipped.reason)
            ));
        }
        html.push_str("</ul>");
    }

    html
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

use std::{path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Error, Res,
    config::Config,
    info,
    management::PlaylistAssembler,
    server::{self, AppState},
    success,
    types::{AssemblyReport, MatchKind, PlaylistRequest, ResolutionTableRow},
    utils, warning,
};

#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub name: Option<String>,
    pub keywords: Vec<String>,
    pub file: Option<PathBuf>,
    pub no_browser: bool,
}

pub async fn create(config: Config, options: CreateOptions) -> Res<()> {
    let request = build_request(&options).await?;

    let state = AppState::new(&config)?;
    let listener = server::bind(config.server_addr).await?;
    let server_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = server::start_api_server(listener, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let session = utils::generate_session_id();
    let receiver = state.handoff.register(&session);
    let authorization = state.authorization.issue_for_session(&session, request)?;

    let auth_url = authorization.url.to_string();
    if options.no_browser || webbrowser::open(&auth_url).is_err() {
        info!("Open the following URL to authorize:\n{}", auth_url);
    }

    let pb = spinner("Waiting for authorization in the browser...");
    let client = receiver.wait(config.handoff_timeout).await;
    pb.finish_and_clear();
    let client = client?;
    success!("Authorization completed.");

    let keyword_count = client.payload.keywords.len();
    let pb = spinner(&format!("Resolving {} keywords...", keyword_count));
    let catalog = state.connector.catalog(client.tokens);
    let report = PlaylistAssembler::new(catalog)
        .assemble(None, &client.payload)
        .await;
    pb.finish_and_clear();
    let report = report?;

    println!("{}", Table::new(table_rows(&report)));

    for skipped in &report.skipped {
        warning!("Skipped '{}': {}", skipped.keyword, skipped.reason);
    }
    match report.playlist.external_url() {
        Some(url) => success!("Playlist '{}' created: {}", report.playlist.name, url),
        None => success!("Playlist '{}' created.", report.playlist.name),
    }

    Ok(())
}

async fn build_request(options: &CreateOptions) -> Res<PlaylistRequest> {
    let mut entries: Vec<(String, Option<Vec<String>>)> = options
        .keywords
        .iter()
        .filter_map(|k| utils::parse_keyword(k))
        .collect();

    if let Some(path) = &options.file {
        let content = async_fs::read_to_string(path).await?;
        entries.extend(utils::parse_keyword_lines(&content));
    }

    if entries.is_empty() {
        return Err(Error::InvalidRequest(
            "at least one keyword is required".to_string(),
        ));
    }

    Ok(request_from_entries(options.name.clone(), entries))
}

/// Constraints are only sent when at least one keyword has one.
pub(crate) fn request_from_entries(
    name: Option<String>,
    entries: Vec<(String, Option<Vec<String>>)>,
) -> PlaylistRequest {
    let constrained = entries.iter().any(|(_, artists)| artists.is_some());
    let (keywords, artists): (Vec<String>, Vec<Option<Vec<String>>>) = entries.into_iter().unzip();

    PlaylistRequest {
        playlist_name: name,
        keywords,
        artist_constraints: constrained
            .then(|| artists.into_iter().map(Option::unwrap_or_default).collect()),
    }
}

fn table_rows(report: &AssemblyReport) -> Vec<ResolutionTableRow> {
    let resolved = report.tracks.iter().map(|t| ResolutionTableRow {
        keyword: t.keyword.clone(),
        track: t.name.clone(),
        artists: t.artists.join(", "),
        status: match t.match_kind {
            MatchKind::Unconstrained => "first result",
            MatchKind::ArtistMatch => "artist match",
            MatchKind::Fallback => "fallback",
        }
        .to_string(),
    });

    let skipped = report.skipped.iter().map(|s| ResolutionTableRow {
        keyword: s.keyword.clone(),
        track: "-".to_string(),
        artists: "-".to_string(),
        status: "skipped".to_string(),
    });

    resolved.chain(skipped).collect()
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

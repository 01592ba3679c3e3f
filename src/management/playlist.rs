use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::{
    Error, Res,
    management::TrackResolver,
    spotify::Catalog,
    types::{AssemblyReport, CreatePlaylistRequest, PlaylistRequest, SkippedKeyword},
};

pub const DEFAULT_NAME_PREFIX: &str = "[Keytracks]";
pub const PLAYLIST_DESCRIPTION: &str = "A playlist created with keytracks";
const DEFAULT_NAME_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The requested name, or the prefix plus `now` when it is absent or blank.
pub fn effective_name(name: Option<&str>, now: DateTime<Local>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!(
            "{} {}",
            DEFAULT_NAME_PREFIX,
            now.format(DEFAULT_NAME_TIME_FORMAT)
        ),
    }
}

/// One keyword to resolve, with its optional artist constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
    pub keyword: String,
    pub artists: Option<Vec<String>>,
}

/// Validates a request and pairs each keyword with its constraint.
///
/// Blank keywords are dropped together with their constraint, and constraint
/// lists without any non-blank name become `None`.
pub fn keyword_queries(request: &PlaylistRequest) -> Res<Vec<KeywordQuery>> {
    if let Some(constraints) = &request.artist_constraints {
        if constraints.len() != request.keywords.len() {
            return Err(Error::InvalidRequest(format!(
                "{} artist constraints given for {} keywords",
                constraints.len(),
                request.keywords.len()
            )));
        }
    }

    let queries: Vec<KeywordQuery> = request
        .keywords
        .iter()
        .enumerate()
        .filter(|(_, keyword)| !keyword.trim().is_empty())
        .map(|(i, keyword)| {
            let artists = request
                .artist_constraints
                .as_ref()
                .and_then(|c| c.get(i))
                .map(|names| {
                    names
                        .iter()
                        .map(|n| n.trim())
                        .filter(|n| !n.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|names| !names.is_empty());

            KeywordQuery {
                keyword: keyword.trim().to_string(),
                artists,
            }
        })
        .collect();

    if queries.is_empty() {
        return Err(Error::InvalidRequest(
            "at least one keyword is required".to_string(),
        ));
    }

    Ok(queries)
}

/// Creates a playlist and fills it with one resolved track per keyword.
pub struct PlaylistAssembler {
    catalog: Arc<dyn Catalog>,
    resolver: TrackResolver,
}

impl PlaylistAssembler {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let resolver = TrackResolver::new(Arc::clone(&catalog));
        Self { catalog, resolver }
    }

    pub fn with_resolver(catalog: Arc<dyn Catalog>, resolver: TrackResolver) -> Self {
        Self { catalog, resolver }
    }

    /// Builds the playlist described by `request` for `owner_id` (or for the
    /// authenticated user when `None`).
    ///
    /// Keywords are resolved concurrently; the final track order always
    /// follows keyword order. Keywords that fail to resolve are skipped and
    /// listed in the report. Creation, append and credential failures abort
    /// the assembly; a playlist created before the failure is left in place.
    pub async fn assemble(
        &self,
        owner_id: Option<&str>,
        request: &PlaylistRequest,
    ) -> Res<AssemblyReport> {
        let queries = keyword_queries(request)?;
        let name = effective_name(request.playlist_name.as_deref(), Local::now());

        let owner_id = match owner_id {
            Some(id) => id.to_string(),
            None => self.catalog.current_user().await?.id,
        };

        let playlist = self
            .catalog
            .create_playlist(
                &owner_id,
                &CreatePlaylistRequest {
                    name: name.clone(),
                    description: PLAYLIST_DESCRIPTION.to_string(),
                    public: true,
                    collaborative: false,
                },
            )
            .await?;
        info!(playlist = %playlist.id, %name, "playlist created");

        let mut handles = Vec::with_capacity(queries.len());
        for query in &queries {
            let resolver = self.resolver.clone();
            let query = query.clone();
            let handle = tokio::spawn(async move {
                resolver
                    .resolve(&query.keyword, query.artists.as_deref())
                    .await
            });
            handles.push(handle);
        }

        let mut tracks = Vec::new();
        let mut skipped = Vec::new();
        for (query, handle) in queries.iter().zip(handles) {
            match handle.await {
                Ok(Ok(track)) => tracks.push(track),
                Ok(Err(e)) if e.is_keyword_scoped() => {
                    warn!(keyword = %query.keyword, error = %e, "keyword skipped");
                    skipped.push(SkippedKeyword {
                        keyword: query.keyword.clone(),
                        reason: e.to_string(),
                    });
                }
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    warn!(keyword = %query.keyword, error = %e, "resolution task failed");
                    skipped.push(SkippedKeyword {
                        keyword: query.keyword.clone(),
                        reason: format!("resolution task failed: {}", e),
                    });
                }
            }
        }

        if tracks.is_empty() {
            warn!(playlist = %playlist.id, "no keyword resolved, playlist left empty");
        } else {
            let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
            self.catalog.add_tracks(&playlist.id, &uris).await?;
            info!(playlist = %playlist.id, tracks = uris.len(), "tracks added");
        }

        Ok(AssemblyReport {
            playlist,
            tracks,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_effective_name_uses_given_name_verbatim() {
        let now = Local::now();
        assert_eq!(effective_name(Some("Road Trip "), now), "Road Trip ");
    }

    #[test]
    fn test_effective_name_generates_default() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(effective_name(None, now), "[Keytracks] 2024-03-09 14:05:07");
        assert_eq!(
            effective_name(Some("   "), now),
            "[Keytracks] 2024-03-09 14:05:07"
        );
    }

    #[test]
    fn test_keyword_queries_pairs_constraints() {
        let request = PlaylistRequest {
            playlist_name: None,
            keywords: vec!["A".into(), " ".into(), "C".into()],
            artist_constraints: Some(vec![vec!["X".into()], vec!["Y".into()], vec![" ".into()]]),
        };
        let queries = keyword_queries(&request).unwrap();
        assert_eq!(
            queries,
            vec![
                KeywordQuery {
                    keyword: "A".into(),
                    artists: Some(vec!["X".into()]),
                },
                KeywordQuery {
                    keyword: "C".into(),
                    artists: None,
                },
            ]
        );
    }

    #[test]
    fn test_keyword_queries_rejects_mismatched_constraints() {
        let request = PlaylistRequest {
            playlist_name: None,
            keywords: vec!["A".into(), "B".into()],
            artist_constraints: Some(vec![vec!["X".into()]]),
        };
        assert!(matches!(
            keyword_queries(&request),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_keyword_queries_rejects_empty_request() {
        let request = PlaylistRequest {
            playlist_name: Some("x".into()),
            keywords: vec!["".into(), "  ".into()],
            artist_constraints: None,
        };
        assert!(matches!(
            keyword_queries(&request),
            Err(Error::InvalidRequest(_))
        ));
    }
}

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Error, Res,
    spotify::Catalog,
    types::{MatchKind, ResolvedTrack, Track},
    utils,
};

/// Number of search results considered per keyword.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Picks the track for a keyword out of ranked search results.
///
/// Without a constraint (or with an empty one) the first result wins. With a
/// constraint, the first result having any artist that matches a constraint
/// name case-insensitively wins; when none does, the first result is used as
/// a fallback.
pub fn select_track<'a>(
    results: &'a [Track],
    constraint: Option<&[String]>,
) -> Option<(&'a Track, MatchKind)> {
    let first = results.first()?;

    let constraint = match constraint {
        Some(c) if !c.is_empty() => c,
        _ => return Some((first, MatchKind::Unconstrained)),
    };

    results
        .iter()
        .find(|track| {
            track.artists.iter().any(|artist| {
                constraint
                    .iter()
                    .any(|wanted| utils::artist_names_match(&artist.name, wanted))
            })
        })
        .map(|track| (track, MatchKind::ArtistMatch))
        .or(Some((first, MatchKind::Fallback)))
}

/// Maps free-text keywords to single catalog tracks.
#[derive(Clone)]
pub struct TrackResolver {
    catalog: Arc<dyn Catalog>,
    limit: u32,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Resolves `keyword` to one track.
    ///
    /// Fails with `NoResults` when the search comes back empty and with
    /// `Search` when the search call itself fails.
    pub async fn resolve(&self, keyword: &str, constraint: Option<&[String]>) -> Res<ResolvedTrack> {
        let results = self.catalog.search_tracks(keyword, self.limit).await?;

        let Some((track, match_kind)) = select_track(&results, constraint) else {
            return Err(Error::NoResults {
                keyword: keyword.to_string(),
            });
        };

        if match_kind == MatchKind::Fallback {
            warn!(
                keyword,
                artists = ?constraint.unwrap_or_default(),
                "no result matched the artist constraint, using first result"
            );
        }
        debug!(keyword, track = %track.id, ?match_kind, "keyword resolved");

        Ok(ResolvedTrack {
            keyword: keyword.to_string(),
            catalog_id: track.id.clone(),
            uri: track.uri.clone(),
            name: track.name.clone(),
            artists: track.artists.iter().map(|a| a.name.clone()).collect(),
            match_kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackArtist;

    fn track(id: &str, artists: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            name: format!("Track {}", id),
            uri: format!("spotify:track:{}", id),
            artists: artists
                .iter()
                .map(|name| TrackArtist {
                    id: None,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unconstrained_takes_first_result() {
        let results = vec![track("a", &["X"]), track("b", &["Y"])];
        let (picked, kind) = select_track(&results, None).unwrap();
        assert_eq!(picked.id, "a");
        assert_eq!(kind, MatchKind::Unconstrained);
    }

    #[test]
    fn test_empty_constraint_counts_as_unconstrained() {
        let results = vec![track("a", &["X"])];
        let empty: Vec<String> = Vec::new();
        let (_, kind) = select_track(&results, Some(&empty)).unwrap();
        assert_eq!(kind, MatchKind::Unconstrained);
    }

    #[test]
    fn test_constraint_picks_first_intersecting_result() {
        let results = vec![
            track("cover", &["Some Cover Band"]),
            track("original", &["Lady Gaga", "Bruno Mars"]),
            track("remix", &["Bruno Mars"]),
        ];
        let wanted = names(&["lady gaga", "BRUNO MARS"]);
        let (picked, kind) = select_track(&results, Some(&wanted)).unwrap();
        assert_eq!(picked.id, "original");
        assert_eq!(kind, MatchKind::ArtistMatch);
    }

    #[test]
    fn test_constraint_miss_falls_back_to_first() {
        let results = vec![track("a", &["X"]), track("b", &["Y"])];
        let wanted = names(&["Z"]);
        let (picked, kind) = select_track(&results, Some(&wanted)).unwrap();
        assert_eq!(picked.id, "a");
        assert_eq!(kind, MatchKind::Fallback);
    }

    #[test]
    fn test_constraint_is_exact_not_substring() {
        let results = vec![track("a", &["Bruno Mars Tribute"]), track("b", &["Bruno Mars"])];
        let wanted = names(&["Bruno Mars"]);
        let (picked, _) = select_track(&results, Some(&wanted)).unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn test_no_results_selects_nothing() {
        assert!(select_track(&[], None).is_none());
        assert!(select_track(&[], Some(&names(&["X"]))).is_none());
    }
}

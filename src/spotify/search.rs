use crate::{
    Error, Res,
    spotify::{SpotifyClient, describe_failure},
    types::{SearchResponse, Track},
};

/// The service rejects larger page sizes.
const MAX_SEARCH_LIMIT: u32 = 50;

impl SpotifyClient {
    /// Searches the catalog for tracks matching `query`.
    ///
    /// Results keep the ranking order returned by the service. An empty vector
    /// means the search succeeded but found nothing.
    pub(super) async fn search(&self, query: &str, limit: u32) -> Res<Vec<Track>> {
        let failed = |reason: String| Error::Search {
            keyword: query.to_string(),
            reason,
        };

        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let request = self.http.get(self.endpoint("search")).query(&[
            ("q", query),
            ("type", "track"),
            ("limit", limit.as_str()),
        ]);

        let res = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !res.status().is_success() {
            return Err(failed(describe_failure(res).await));
        }

        let body: SearchResponse = res.json().await.map_err(|e| failed(e.to_string()))?;
        Ok(body.tracks.items)
    }
}

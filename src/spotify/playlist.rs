use tracing::debug;

use crate::{
    Error, Res,
    spotify::{APPEND_BATCH_LIMIT, SpotifyClient, describe_failure},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest, Playlist,
    },
};

impl SpotifyClient {
    pub(super) async fn create(
        &self,
        owner_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Res<Playlist> {
        let path = format!("users/{}/playlists", owner_id);
        let res = self
            .authorized(self.http.post(self.endpoint(&path)).json(request))
            .await?
            .send()
            .await
            .map_err(|e| Error::PlaylistCreation(e.to_string()))?;

        if !res.status().is_success() {
            return Err(Error::PlaylistCreation(describe_failure(res).await));
        }

        res.json::<Playlist>()
            .await
            .map_err(|e| Error::PlaylistCreation(e.to_string()))
    }

    /// Appends `uris` in order, one request per [`APPEND_BATCH_LIMIT`] chunk.
    pub(super) async fn append(&self, playlist_id: &str, uris: &[String]) -> Res<()> {
        let path = format!("playlists/{}/tracks", playlist_id);

        for chunk in uris.chunks(APPEND_BATCH_LIMIT) {
            let body = AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            };
            let res = self
                .authorized(self.http.post(self.endpoint(&path)).json(&body))
                .await?
                .send()
                .await
                .map_err(|e| Error::Append(e.to_string()))?;

            if !res.status().is_success() {
                return Err(Error::Append(describe_failure(res).await));
            }

            let snapshot: AddTrackToPlaylistResponse = res
                .json()
                .await
                .map_err(|e| Error::Append(e.to_string()))?;
            debug!(
                playlist = playlist_id,
                tracks = chunk.len(),
                snapshot = %snapshot.snapshot_id,
                "tracks appended"
            );
        }

        Ok(())
    }
}

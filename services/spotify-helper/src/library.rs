//! Track library queries built on the request engine

use futures_util::{StreamExt, TryStreamExt};
use serde_json::Value;
use spotify_api::parse;
use spotify_api::{PageOptions, ResourceRequest, SpotifyClient};
use tracing::{debug, info, instrument};

use crate::error::Result;

pub struct Library<'a> {
    client: &'a SpotifyClient,
    paging: PageOptions,
    tries: u32,
}

impl<'a> Library<'a> {
    pub fn new(client: &'a SpotifyClient, paging: PageOptions, tries: u32) -> Self {
        Self {
            client,
            paging,
            tries,
        }
    }

    /// Saved tracks of the current user. With `limit`, stops pulling pages
    /// once that many tracks have been read.
    #[instrument(skip(self))]
    pub async fn fetch_my_tracks(&self, limit: Option<usize>) -> Result<Vec<Value>> {
        let request = ResourceRequest::new("me/tracks").tries(self.tries);
        let stream = self.client.paginate(request, self.paging, parse::saved_tracks);
        let tracks: Vec<Value> = match limit {
            Some(limit) => stream.take(limit).try_collect().await?,
            None => stream.try_collect().await?,
        };
        info!(tracks = tracks.len(), "fetched saved tracks");
        Ok(tracks)
    }

    #[instrument(skip(self))]
    pub async fn search_by_genre(&self, genre: &str) -> Result<Vec<Value>> {
        let request = ResourceRequest::new("search")
            .query("q", format!("genre:\"{genre}\""))
            .query("type", "track")
            .tries(self.tries);
        let tracks: Vec<Value> = self
            .client
            .paginate(request, self.paging, parse::nested_items("tracks"))
            .try_collect()
            .await?;
        info!(tracks = tracks.len(), "genre search finished");
        Ok(tracks)
    }

    /// Keep the tracks a genre-restricted search finds by name.
    #[instrument(skip(self, tracks), fields(tracks = tracks.len()))]
    pub async fn filter_by_genre(&self, tracks: &[Value], genre: &str) -> Result<Vec<Value>> {
        let mut kept = Vec::new();
        for track in tracks {
            if self.has_genre(track, genre).await? {
                kept.push(track.clone());
            }
        }
        info!(kept = kept.len(), "filtered by genre");
        Ok(kept)
    }

    async fn has_genre(&self, track: &Value, genre: &str) -> Result<bool> {
        let Some(id) = track.get("id").and_then(Value::as_str) else {
            return Ok(false);
        };
        let name = track.get("name").and_then(Value::as_str).unwrap_or_default();

        let request = ResourceRequest::new("search")
            .query("q", format!("track:\"{name}\" genre:\"{genre}\""))
            .query("type", "track")
            .tries(self.tries);
        let found = self
            .client
            .request(&request, parse::nested_items("tracks"))
            .await?;

        let matched = found
            .iter()
            .any(|t| t.get("id").and_then(Value::as_str) == Some(id));
        debug!(id, matched, "genre check");
        Ok(matched)
    }
}

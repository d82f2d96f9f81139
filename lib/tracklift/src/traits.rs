use async_trait::async_trait;
use futures::stream::BoxStream;
use shared::{
    playlist::PlaylistSpec,
    track::{CatalogTrack, TrackDescriptor},
};

use crate::{credential::AccessToken, error::Result};

/// Catalog a playlist is read from.
pub trait SourceCatalog: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Lazily enumerates the playlist's tracks in playlist order.
    ///
    /// Pages are fetched as the stream is polled. The stream is consumed once;
    /// enumerating again means calling `tracks` again.
    fn tracks<'a>(&'a self, playlist_id: &'a str) -> BoxStream<'a, Result<TrackDescriptor>>;
}

/// Catalog the migrated playlist is written to.
#[async_trait]
pub trait DestinationCatalog: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Tracks carrying exactly this cross-catalog identifier (ISRC).
    async fn search_by_identifier(&self, unique_id: &str) -> Result<Vec<CatalogTrack>>;

    /// Free-text search, in the catalog's own relevance order.
    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>>;

    /// Creates an empty playlist and returns its identifier.
    async fn create_playlist(&self, spec: &PlaylistSpec) -> Result<String>;

    /// Appends `track_ids` in order with a single bulk call.
    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}

/// Exchanges an OAuth authorization code for a bearer credential.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken>;
}

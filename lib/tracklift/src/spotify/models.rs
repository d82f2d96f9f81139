use serde::{Deserialize, Serialize};
use shared::track::{CatalogTrack, TrackDescriptor};

// Internal structs for the Spotify Web API payloads we touch.
#[derive(Deserialize, Debug)]
pub(crate) struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct PlaylistItem {
    /// Null for entries that are no longer available.
    pub track: Option<TrackObject>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TrackObject {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    #[serde(default)]
    pub album: Option<AlbumObject>,
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ArtistObject {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct AlbumObject {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ExternalIds {
    pub isrc: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SearchResponse {
    pub tracks: Paging<TrackObject>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CurrentUser {
    pub id: String,
}

#[derive(Serialize, Debug)]
pub(crate) struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub public: bool,
}

#[derive(Deserialize, Debug)]
pub(crate) struct CreatedPlaylist {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TrackObject> for TrackDescriptor {
    fn from(track: TrackObject) -> Self {
        TrackDescriptor {
            title: track.name,
            artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album: track.album.map(|a| a.name).filter(|name| !name.is_empty()),
            unique_id: track
                .external_ids
                .and_then(|ids| ids.isrc)
                .filter(|isrc| !isrc.is_empty()),
        }
    }
}

impl TrackObject {
    /// Search hits without a URI (local files) cannot be added to a playlist.
    pub(crate) fn into_catalog_track(self) -> Option<CatalogTrack> {
        Some(CatalogTrack {
            id: self.uri?,
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
        })
    }
}

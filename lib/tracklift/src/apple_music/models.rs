use serde::Deserialize;
use shared::track::TrackDescriptor;

#[derive(Deserialize, Debug)]
pub(crate) struct ResourcePage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Relative path of the next page, e.g. `/v1/catalog/us/playlists/.../tracks?offset=100`.
    pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct SongResource {
    pub id: String,
    pub attributes: Option<SongAttributes>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SongAttributes {
    pub name: String,
    pub artist_name: String,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub isrc: Option<String>,
}

impl From<SongAttributes> for TrackDescriptor {
    fn from(song: SongAttributes) -> Self {
        TrackDescriptor {
            title: song.name,
            artist: song.artist_name,
            album: song.album_name.filter(|name| !name.is_empty()),
            unique_id: song.isrc.filter(|isrc| !isrc.is_empty()),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata for the playlist created in the destination catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
}

impl PlaylistSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            public: false,
        }
    }
}

/// Catalog the source playlist is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Spotify,
    AppleMusic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Spotify => "spotify",
            SourceKind::AppleMusic => "apple_music",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The opaque `state` payload carried through the OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Source playlist identifier.
    pub id: String,
    #[serde(flatten)]
    pub playlist: PlaylistSpec,
    #[serde(default)]
    pub source: SourceKind,
}

impl MigrationRequest {
    pub fn from_state(state: &str) -> serde_json::Result<Self> {
        serde_json::from_str(state)
    }
}

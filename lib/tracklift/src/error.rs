use shared::track::TrackDescriptor;
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

/// Failure of a single catalog call.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("catalog client not configured: {0}")]
    NotConfigured(&'static str),
}

/// Conditions that end a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("authorization failed: {0}")]
    AuthFailure(#[source] CatalogError),

    #[error("source catalog unavailable: {0}")]
    CatalogUnavailable(#[source] CatalogError),

    #[error("search failed for '{track}': {source}")]
    UpstreamSearchFailure {
        track: TrackDescriptor,
        #[source]
        source: CatalogError,
    },

    #[error("could not create destination playlist: {0}")]
    PlaylistCreationFailure(#[source] CatalogError),

    #[error("failed to append batch {batch} ({size} tracks): {source}")]
    UpstreamWriteFailure {
        batch: usize,
        size: usize,
        #[source]
        source: CatalogError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MigrationError {
    /// Stable machine-readable name of the condition.
    pub fn kind(&self) -> &'static str {
        match self {
            MigrationError::AuthFailure(_) => "auth_failure",
            MigrationError::CatalogUnavailable(_) => "catalog_unavailable",
            MigrationError::UpstreamSearchFailure { .. } => "upstream_search_failure",
            MigrationError::PlaylistCreationFailure(_) => "playlist_creation_failure",
            MigrationError::UpstreamWriteFailure { .. } => "upstream_write_failure",
            MigrationError::InvalidConfig(_) => "invalid_config",
        }
    }
}

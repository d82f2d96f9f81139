use reqwest::Client;
use shared::playlist::SourceKind;
use tracing::debug;
use tracklift::{
    apple_music::AppleMusicClientBuilder,
    error::{CatalogError, MigrationError},
    spotify::SpotifyClientBuilder,
    AccessToken, DestinationCatalog, SourceCatalog,
};

use crate::config::AppConfig;

/// Builds the per-run catalog clients once a user credential is known.
pub trait CatalogFactory: Send + Sync {
    fn source(
        &self,
        kind: SourceKind,
        token: &AccessToken,
    ) -> Result<Box<dyn SourceCatalog>, MigrationError>;

    fn destination(&self, token: &AccessToken) -> Result<Box<dyn DestinationCatalog>, MigrationError>;
}

/// Real HTTP clients, all sharing one connection pool.
pub struct HttpCatalogs {
    config: AppConfig,
    client: Client,
}

impl HttpCatalogs {
    pub fn new(config: AppConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn spotify(&self, token: &AccessToken) -> Result<tracklift::spotify::SpotifyClient, CatalogError> {
        SpotifyClientBuilder::new()
            .base_url(&self.config.spotify_api_base)
            .token(token.clone())
            .http_client(self.client.clone())
            .market(&self.config.spotify_market)
            .timeout(self.config.request_timeout)
            .build()
    }
}

impl CatalogFactory for HttpCatalogs {
    fn source(
        &self,
        kind: SourceKind,
        token: &AccessToken,
    ) -> Result<Box<dyn SourceCatalog>, MigrationError> {
        debug!("Building {} source catalog", kind);
        match kind {
            SourceKind::Spotify => Ok(Box::new(
                self.spotify(token).map_err(MigrationError::CatalogUnavailable)?,
            )),
            SourceKind::AppleMusic => {
                // Apple Music reads with the developer token, not the user's.
                let developer_token = self
                    .config
                    .apple_music_token
                    .as_deref()
                    .map(AccessToken::new)
                    .ok_or(MigrationError::CatalogUnavailable(CatalogError::NotConfigured(
                        "Apple Music developer token",
                    )))?;
                let client = AppleMusicClientBuilder::new()
                    .base_url(&self.config.apple_music_api_base)
                    .developer_token(developer_token)
                    .storefront(&self.config.apple_music_storefront)
                    .http_client(self.client.clone())
                    .timeout(self.config.request_timeout)
                    .build()
                    .map_err(MigrationError::CatalogUnavailable)?;
                Ok(Box::new(client))
            }
        }
    }

    fn destination(&self, token: &AccessToken) -> Result<Box<dyn DestinationCatalog>, MigrationError> {
        let client = self
            .spotify(token)
            .map_err(MigrationError::PlaylistCreationFailure)?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(apple_music_token: Option<&str>) -> AppConfig {
        let mut config = AppConfig::from_lookup(|name| match name {
            "CLIENT_ID" | "CLIENT_SECRET" => Some("x".to_string()),
            "REDIRECT_URI" => Some("http://localhost/callback".to_string()),
            _ => None,
        })
        .unwrap();
        config.apple_music_token = apple_music_token.map(str::to_string);
        config
    }

    #[test]
    fn apple_music_source_needs_developer_token() {
        let catalogs = HttpCatalogs::new(config(None), Client::new());
        let result = catalogs.source(SourceKind::AppleMusic, &AccessToken::new("user"));
        assert!(matches!(
            result,
            Err(MigrationError::CatalogUnavailable(CatalogError::NotConfigured(_)))
        ));
    }

    #[test]
    fn builds_every_catalog() {
        let catalogs = HttpCatalogs::new(config(Some("dev")), Client::new());
        let token = AccessToken::new("user");
        assert_eq!(catalogs.source(SourceKind::Spotify, &token).unwrap().id(), "spotify");
        assert_eq!(
            catalogs.source(SourceKind::AppleMusic, &token).unwrap().id(),
            "apple_music"
        );
        assert_eq!(catalogs.destination(&token).unwrap().id(), "spotify");
    }
}

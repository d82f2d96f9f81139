use reqwest::Client;
use std::sync::Arc;
use tracklift::{spotify::SpotifyAuthorizer, Authorizer};

use crate::{
    config::AppConfig,
    services::{CatalogFactory, HttpCatalogs},
};

/// Shared by every request. Holds no per-run state; each callback builds its
/// own catalog clients around the credential it obtains.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub authorizer: Arc<dyn Authorizer>,
    pub catalogs: Arc<dyn CatalogFactory>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        authorizer: Arc<dyn Authorizer>,
        catalogs: Arc<dyn CatalogFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            authorizer,
            catalogs,
        }
    }

    /// Wires the Spotify authorizer and HTTP catalog clients from `config`.
    /// They share one connection pool.
    pub fn from_config(config: AppConfig) -> Result<Self, tracklift::error::CatalogError> {
        let client = Client::new();
        let authorizer = SpotifyAuthorizer::new(
            &config.spotify_accounts_base,
            &config.client_id,
            &config.client_secret,
            &config.redirect_uri,
        )?
        .with_http_client(client.clone())
        .with_timeout(config.request_timeout);
        let catalogs = HttpCatalogs::new(config.clone(), client);
        Ok(Self::new(config, Arc::new(authorizer), Arc::new(catalogs)))
    }
}

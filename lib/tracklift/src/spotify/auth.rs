use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::models::TokenResponse;
use crate::{
    credential::AccessToken,
    error::{CatalogError, Result},
    traits::Authorizer,
};

pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Completes the authorization-code flow against the Spotify accounts service.
#[derive(Debug, Clone)]
pub struct SpotifyAuthorizer {
    token_url: Url,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    client: Client,
    timeout: Duration,
}

impl SpotifyAuthorizer {
    pub fn new(
        accounts_base: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<Self> {
        let base = Url::parse(&format!("{}/", accounts_base.trim_end_matches('/')))?;
        Ok(Self {
            token_url: base.join("api/token")?,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(15),
        })
    }

    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Authorizer for SpotifyAuthorizer {
    async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        debug!("Exchanging authorization code at {}", self.token_url);
        let request = self
            .client
            .post(self.token_url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ]);

        let token: TokenResponse = tokio::time::timeout(self.timeout, async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error body".to_string());
                return Err(CatalogError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            response
                .json::<TokenResponse>()
                .await
                .map_err(|e| CatalogError::Decode(e.to_string()))
        })
        .await
        .map_err(|_| CatalogError::Timeout(self.timeout))??;

        info!(
            "Obtained Spotify access token (expires in {}s, scope: {})",
            token.expires_in.unwrap_or_default(),
            token.scope.as_deref().unwrap_or("-")
        );
        Ok(AccessToken::new(token.access_token))
    }
}

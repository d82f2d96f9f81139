use super::models::{ResourcePage, SongResource};
use crate::{
    credential::AccessToken,
    error::{CatalogError, Result},
    traits::SourceCatalog,
};
use futures::{
    stream::{self, BoxStream},
    StreamExt, TryStreamExt,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::track::TrackDescriptor;
use std::time::Duration;
use tracing::debug;
use url::{ParseError, Url};

pub const DEFAULT_API_BASE: &str = "https://api.music.apple.com";
const DEFAULT_STOREFRONT: &str = "us";
const DEFAULT_PAGE_SIZE: usize = 100;
const MAX_PAGE_SIZE: usize = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Reads catalog playlists from Apple Music with a developer token.
#[derive(Debug, Clone)]
pub struct AppleMusicClient {
    base_url: Url,
    developer_token: AccessToken,
    storefront: String,
    client: Client,
    page_size: usize,
    timeout: Duration,
}

#[derive(Default)]
pub struct AppleMusicClientBuilder {
    base_url: Option<String>,
    developer_token: Option<AccessToken>,
    storefront: Option<String>,
    client: Option<Client>,
    page_size: Option<usize>,
    timeout: Option<Duration>,
}

impl AppleMusicClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn developer_token(mut self, token: AccessToken) -> Self {
        self.developer_token = Some(token);
        self
    }

    pub fn storefront(mut self, storefront: &str) -> Self {
        self.storefront = Some(storefront.to_string());
        self
    }

    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Tracks requested per page (the `limit` parameter).
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<AppleMusicClient> {
        let developer_token = self
            .developer_token
            .ok_or(CatalogError::NotConfigured("Apple Music developer token"))?;
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        let base_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;

        Ok(AppleMusicClient {
            base_url,
            developer_token,
            storefront: self
                .storefront
                .unwrap_or_else(|| DEFAULT_STOREFRONT.to_string()),
            client: self.client.unwrap_or_default(),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

impl AppleMusicClient {
    /// Catalog URL for a playlist's tracks; the storefront and id are percent-encoded.
    fn playlist_tracks_url(&self, playlist_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::Url(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["v1", "catalog", self.storefront.as_str(), "playlists", playlist_id, "tracks"]);
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string());
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.base_url.join(endpoint)?;
        debug!("Request: GET {}", url);
        let request = self
            .client
            .get(url)
            .bearer_auth(self.developer_token.secret());

        tokio::time::timeout(self.timeout, async {
            let response = request.send().await?;
            Self::handle_response(response).await
        })
        .await
        .map_err(|_| CatalogError::Timeout(self.timeout))?
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| CatalogError::Decode(format!("{status}: {e}")))
    }
}

impl SourceCatalog for AppleMusicClient {
    fn id(&self) -> &'static str {
        "apple_music"
    }

    fn name(&self) -> &'static str {
        "Apple Music"
    }

    fn tracks<'a>(&'a self, playlist_id: &'a str) -> BoxStream<'a, Result<TrackDescriptor>> {
        let first = match self.playlist_tracks_url(playlist_id) {
            Ok(url) => url.to_string(),
            Err(e) => return stream::iter([Err(e)]).boxed(),
        };

        stream::try_unfold(Some(first), move |next| async move {
            let Some(endpoint) = next else {
                return Ok::<_, CatalogError>(None);
            };
            let page: ResourcePage<SongResource> = self.get(&endpoint).await?;
            debug!(
                "Fetched {} resources from playlist {}",
                page.data.len(),
                playlist_id
            );
            let descriptors: Vec<Result<TrackDescriptor>> = page
                .data
                .into_iter()
                .filter_map(|resource| match resource.attributes {
                    Some(attributes) => Some(Ok(TrackDescriptor::from(attributes))),
                    None => {
                        debug!("Skipping resource {} without attributes", resource.id);
                        None
                    }
                })
                .collect();
            // Apple's `next` omits `limit`; keep the configured page size.
            let next = page.next.map(|path| with_limit(&path, self.page_size));
            Ok(Some((stream::iter(descriptors), next)))
        })
        .try_flatten()
        .boxed()
    }
}

fn with_limit(path: &str, limit: usize) -> String {
    if path.contains("limit=") {
        path.to_string()
    } else if path.contains('?') {
        format!("{path}&limit={limit}")
    } else {
        format!("{path}?limit={limit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_path_keeps_page_size() {
        assert_eq!(
            with_limit("/v1/catalog/us/playlists/p/tracks?offset=100", 50),
            "/v1/catalog/us/playlists/p/tracks?offset=100&limit=50"
        );
        assert_eq!(
            with_limit("/v1/catalog/us/playlists/p/tracks?offset=100&limit=25", 50),
            "/v1/catalog/us/playlists/p/tracks?offset=100&limit=25"
        );
        assert_eq!(with_limit("/next", 10), "/next?limit=10");
    }

    #[test]
    fn requires_developer_token() {
        assert!(matches!(
            AppleMusicClientBuilder::new().build(),
            Err(CatalogError::NotConfigured(_))
        ));
    }
}

use super::models::{
    CreatePlaylistRequest, CreatedPlaylist, CurrentUser, Paging, PlaylistItem, SearchResponse,
};
use crate::{
    credential::AccessToken,
    error::{CatalogError, Result},
    traits::{DestinationCatalog, SourceCatalog},
};
use async_trait::async_trait;
use futures::{
    stream::{self, BoxStream},
    StreamExt, TryStreamExt,
};
use itertools::Itertools;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    playlist::PlaylistSpec,
    track::{CatalogTrack, TrackDescriptor},
};
use std::time::Duration;
use tracing::{debug, info};
use url::{ParseError, Url};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
const DEFAULT_MARKET: &str = "US";
/// Largest page the playlist items endpoint serves.
const DEFAULT_PAGE_SIZE: usize = 100;
const SEARCH_LIMIT: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Spotify Web API client bound to one user's bearer credential.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    base_url: Url,
    token: AccessToken,
    client: Client,
    market: String,
    page_size: usize,
    timeout: Duration,
}

#[derive(Default)]
pub struct SpotifyClientBuilder {
    base_url: Option<String>,
    token: Option<AccessToken>,
    client: Option<Client>,
    market: Option<String>,
    page_size: Option<usize>,
    timeout: Option<Duration>,
}

impl SpotifyClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Shares an existing connection pool.
    pub fn http_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn market(mut self, market: &str) -> Self {
        self.market = Some(market.to_string());
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SpotifyClient> {
        let token = self.token.ok_or(CatalogError::NotConfigured("Spotify access token"))?;
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        // Trailing slash so relative endpoints join under the version prefix.
        let base_url = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;

        Ok(SpotifyClient {
            base_url,
            token,
            client: self.client.unwrap_or_default(),
            market: self.market.unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, DEFAULT_PAGE_SIZE),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

impl SpotifyClient {
    /// URL under the API base; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut endpoint = self.base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| CatalogError::Url(ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(endpoint)
    }

    async fn make_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T> {
        debug!("Request: {} {}", method, url);
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(self.token.secret());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(b) = body {
            request = request.json(&b);
        }

        tokio::time::timeout(self.timeout, async {
            let response = request.send().await?;
            Self::handle_response(response).await
        })
        .await
        .map_err(|_| CatalogError::Timeout(self.timeout))?
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            let body = if text.trim().is_empty() { "null" } else { text.as_str() };
            serde_json::from_str(body)
                .map_err(|e| CatalogError::Decode(format!("{status}: {e}")))
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            Err(CatalogError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn search(&self, q: &str) -> Result<Vec<CatalogTrack>> {
        let limit = SEARCH_LIMIT.to_string();
        let response: SearchResponse = self
            .make_request(
                Method::GET,
                self.endpoint(&["search"])?,
                &[
                    ("q", q),
                    ("type", "track"),
                    ("market", self.market.as_str()),
                    ("limit", limit.as_str()),
                ],
                None::<()>,
            )
            .await?;
        debug!("Search '{}' returned {} tracks", q, response.tracks.items.len());
        Ok(response
            .tracks
            .items
            .into_iter()
            .filter_map(|track| track.into_catalog_track())
            .collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<Paging<PlaylistItem>> {
        self.make_request(Method::GET, self.base_url.join(url)?, &[], None::<()>)
            .await
    }

    pub async fn current_user_id(&self) -> Result<String> {
        let user: CurrentUser = self
            .make_request(Method::GET, self.endpoint(&["me"])?, &[], None::<()>)
            .await?;
        Ok(user.id)
    }
}

impl SourceCatalog for SpotifyClient {
    fn id(&self) -> &'static str {
        "spotify"
    }

    fn name(&self) -> &'static str {
        "Spotify"
    }

    fn tracks<'a>(&'a self, playlist_id: &'a str) -> BoxStream<'a, Result<TrackDescriptor>> {
        let first = match self.endpoint(&["playlists", playlist_id, "tracks"]) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("limit", &self.page_size.to_string())
                    .append_pair("offset", "0");
                url.to_string()
            }
            Err(e) => return stream::iter([Err(e)]).boxed(),
        };

        // `next` links are absolute and carry limit/offset already.
        stream::try_unfold(Some(first), move |next| async move {
            let Some(endpoint) = next else {
                return Ok::<_, CatalogError>(None);
            };
            let page = self.fetch_page(&endpoint).await?;
            debug!(
                "Fetched {} items from playlist {}",
                page.items.len(),
                playlist_id
            );
            let descriptors: Vec<Result<TrackDescriptor>> = page
                .items
                .into_iter()
                .filter_map(|item| item.track)
                .map(|track| Ok(TrackDescriptor::from(track)))
                .collect();
            Ok(Some((stream::iter(descriptors), page.next)))
        })
        .try_flatten()
        .boxed()
    }
}

#[async_trait]
impl DestinationCatalog for SpotifyClient {
    fn id(&self) -> &'static str {
        "spotify"
    }

    fn name(&self) -> &'static str {
        "Spotify"
    }

    async fn search_by_identifier(&self, unique_id: &str) -> Result<Vec<CatalogTrack>> {
        self.search(&format!("isrc:{unique_id}")).await
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        self.search(query).await
    }

    async fn create_playlist(&self, spec: &PlaylistSpec) -> Result<String> {
        let user_id = self.current_user_id().await?;
        let body = CreatePlaylistRequest {
            name: &spec.name,
            description: &spec.description,
            public: spec.public,
        };
        let created: CreatedPlaylist = self
            .make_request(
                Method::POST,
                self.endpoint(&["users", user_id.as_str(), "playlists"])?,
                &[],
                Some(&body),
            )
            .await?;
        info!("Created Spotify playlist {} for user {}", created.id, user_id);
        Ok(created.id)
    }

    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }
        let uris = track_ids.iter().join(",");
        self.make_request::<serde_json::Value, ()>(
            Method::POST,
            self.endpoint(&["playlists", playlist_id, "tracks"])?,
            &[("uris", uris.as_str())],
            None,
        )
        .await?;
        Ok(())
    }
}

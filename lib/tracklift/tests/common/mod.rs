#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use shared::{
    playlist::PlaylistSpec,
    track::{CatalogTrack, TrackDescriptor},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tracklift::{
    error::{CatalogError, Result},
    DestinationCatalog, SourceCatalog,
};

pub const PLAYLIST_ID: &str = "dest-playlist";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SearchIdentifier(String),
    Search(String),
    CreatePlaylist(String),
    Append(String, Vec<String>),
}

pub struct FakeSource {
    tracks: Vec<TrackDescriptor>,
    fail_after: Option<usize>,
}

impl FakeSource {
    pub fn new(tracks: Vec<TrackDescriptor>) -> Self {
        Self {
            tracks,
            fail_after: None,
        }
    }

    /// Yields `n` tracks, then a 503.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl SourceCatalog for FakeSource {
    fn id(&self) -> &'static str {
        "fake_source"
    }

    fn name(&self) -> &'static str {
        "Fake Source"
    }

    fn tracks<'a>(&'a self, _playlist_id: &'a str) -> BoxStream<'a, Result<TrackDescriptor>> {
        let mut items: Vec<Result<TrackDescriptor>> = self.tracks.iter().cloned().map(Ok).collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(CatalogError::Api {
                status: 503,
                message: "unavailable".to_string(),
            }));
        }
        stream::iter(items).boxed()
    }
}

#[derive(Default)]
pub struct FakeDestination {
    identifiers: HashMap<String, Vec<CatalogTrack>>,
    queries: HashMap<String, Vec<CatalogTrack>>,
    failing_queries: HashSet<String>,
    search_delays: HashMap<String, Duration>,
    fail_create: bool,
    fail_append_on: Option<usize>,
    calls: Mutex<Vec<Call>>,
    appends: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub fn hit(id: &str, title: &str, artist: &str) -> CatalogTrack {
    CatalogTrack {
        id: id.to_string(),
        title: title.to_string(),
        artists: vec![artist.to_string()],
    }
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, isrc: &str, track_id: &str) -> Self {
        self.identifiers
            .entry(isrc.to_string())
            .or_default()
            .push(hit(track_id, "", ""));
        self
    }

    pub fn with_query(mut self, query: &str, track_id: &str) -> Self {
        self.queries
            .entry(query.to_string())
            .or_default()
            .push(hit(track_id, "", ""));
        self
    }

    pub fn with_results(mut self, query: &str, results: Vec<CatalogTrack>) -> Self {
        self.queries.insert(query.to_string(), results);
        self
    }

    pub fn failing_query(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn delayed_query(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Fails the `n`th bulk append (1-based).
    pub fn failing_append(mut self, n: usize) -> Self {
        self.fail_append_on = Some(n);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Search(_) | Call::SearchIdentifier(_)))
            .collect()
    }

    /// Batches that were sent, including a failed one.
    pub fn appended(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Append(_, ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DestinationCatalog for FakeDestination {
    fn id(&self) -> &'static str {
        "fake_destination"
    }

    fn name(&self) -> &'static str {
        "Fake Destination"
    }

    async fn search_by_identifier(&self, unique_id: &str) -> Result<Vec<CatalogTrack>> {
        self.record(Call::SearchIdentifier(unique_id.to_string()));
        Ok(self.identifiers.get(unique_id).cloned().unwrap_or_default())
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<CatalogTrack>> {
        self.record(Call::Search(query.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_queries.contains(query) {
            return Err(CatalogError::Api {
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        Ok(self.queries.get(query).cloned().unwrap_or_default())
    }

    async fn create_playlist(&self, spec: &PlaylistSpec) -> Result<String> {
        self.record(Call::CreatePlaylist(spec.name.clone()));
        if self.fail_create {
            return Err(CatalogError::Api {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(PLAYLIST_ID.to_string())
    }

    async fn append_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        self.record(Call::Append(playlist_id.to_string(), track_ids.to_vec()));
        let n = self.appends.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_append_on == Some(n) {
            return Err(CatalogError::Api {
                status: 500,
                message: "server error".to_string(),
            });
        }
        Ok(())
    }
}

/// `n` tracks that each match `spotify:track:{i}` by description.
pub fn numbered(n: usize) -> (FakeSource, FakeDestination) {
    let mut destination = FakeDestination::new();
    let mut tracks = Vec::with_capacity(n);
    for i in 0..n {
        tracks.push(TrackDescriptor::new(format!("Song {i}"), "Artist"));
        destination = destination.with_query(&format!("Artist Song {i}"), &format!("spotify:track:{i}"));
    }
    (FakeSource::new(tracks), destination)
}

pub fn ids(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("spotify:track:{i}")).collect()
}

/// Serves the router returned by `build` on an ephemeral port and returns
/// its base URL, e.g. `http://127.0.0.1:41234`.
pub async fn serve(build: impl FnOnce(String) -> axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(base.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    base
}

/// Shared request log for the fake HTTP services.
#[derive(Clone, Default)]
pub struct RequestLog(std::sync::Arc<Mutex<Vec<String>>>);

impl RequestLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

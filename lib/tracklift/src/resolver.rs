use shared::track::{CatalogTrack, MatchResult, MatchStrategy, TrackDescriptor};
use std::str::FromStr;
use tracing::debug;

use crate::{error::Result, traits::DestinationCatalog};

/// Featured-artist annotations cut from descriptive queries. Case-sensitive.
pub const FEATURE_MARKERS: [&str; 2] = ["(feat.", "(ft."];

/// Order in which strategies are tried; the first hit wins.
const STRATEGIES: [MatchStrategy; 2] = [MatchStrategy::Identifier, MatchStrategy::Descriptive];

/// Truncates `query` at the first featured-artist marker and drops the
/// whitespace left in front of it. Applying it twice changes nothing.
pub fn strip_featured(query: &str) -> &str {
    let cut = FEATURE_MARKERS
        .iter()
        .filter_map(|marker| query.find(marker))
        .min()
        .unwrap_or(query.len());
    query[..cut].trim_end()
}

/// Free-text query used for descriptive matching: `artist title`, stripped.
pub fn descriptive_query(descriptor: &TrackDescriptor) -> String {
    strip_featured(&format!("{} {}", descriptor.artist, descriptor.title)).to_string()
}

/// How a descriptive match is picked out of the search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Trust the catalog's relevance order and take the first result.
    #[default]
    First,
    /// Prefer the first result whose title and one of whose artists equal the
    /// descriptor's, ignoring case and featured-artist annotations. Falls back
    /// to the first result.
    Exact,
}

impl MatchPolicy {
    pub fn select(&self, descriptor: &TrackDescriptor, results: Vec<CatalogTrack>) -> Option<CatalogTrack> {
        match self {
            MatchPolicy::First => results.into_iter().next(),
            MatchPolicy::Exact => {
                let index = results
                    .iter()
                    .position(|candidate| is_exact(descriptor, candidate))
                    .unwrap_or(0);
                results.into_iter().nth(index)
            }
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(MatchPolicy::First),
            "exact" => Ok(MatchPolicy::Exact),
            other => Err(format!("unknown match policy '{other}' (expected 'first' or 'exact')")),
        }
    }
}

fn normalize(value: &str) -> String {
    strip_featured(value).trim().to_lowercase()
}

fn is_exact(descriptor: &TrackDescriptor, candidate: &CatalogTrack) -> bool {
    let artist = normalize(&descriptor.artist);
    normalize(&candidate.title) == normalize(&descriptor.title)
        && candidate.artists.iter().any(|a| normalize(a) == artist)
}

/// Maps source descriptors onto destination track identifiers.
pub struct TrackResolver<'a> {
    destination: &'a dyn DestinationCatalog,
    policy: MatchPolicy,
}

impl<'a> TrackResolver<'a> {
    pub fn new(destination: &'a dyn DestinationCatalog, policy: MatchPolicy) -> Self {
        Self {
            destination,
            policy,
        }
    }

    /// Resolves one descriptor. Finding nothing is `Unmatched`, not an error;
    /// a failing search is returned to the caller.
    pub async fn resolve(&self, descriptor: &TrackDescriptor) -> Result<MatchResult> {
        for strategy in STRATEGIES {
            if let Some(track_id) = self.attempt(strategy, descriptor).await? {
                debug!("Matched '{}' by {:?}: {}", descriptor, strategy, track_id);
                return Ok(MatchResult::Matched { track_id, strategy });
            }
        }
        Ok(MatchResult::Unmatched)
    }

    async fn attempt(
        &self,
        strategy: MatchStrategy,
        descriptor: &TrackDescriptor,
    ) -> Result<Option<String>> {
        match strategy {
            MatchStrategy::Identifier => {
                let Some(unique_id) = descriptor
                    .unique_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                else {
                    return Ok(None);
                };
                let results = self.destination.search_by_identifier(unique_id).await?;
                if results.is_empty() {
                    debug!("No {} track carries {}", self.destination.name(), unique_id);
                }
                Ok(results.into_iter().next().map(|track| track.id))
            }
            MatchStrategy::Descriptive => {
                let query = descriptive_query(descriptor);
                if query.is_empty() {
                    return Ok(None);
                }
                let results = self.destination.search_tracks(&query).await?;
                Ok(self.policy.select(descriptor, results).map(|track| track.id))
            }
        }
    }
}

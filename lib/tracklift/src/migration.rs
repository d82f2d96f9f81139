use futures::{stream, StreamExt, TryStreamExt};
use shared::{
    playlist::PlaylistSpec,
    report::{MigrationPhase, MigrationReport},
    track::{MatchResult, TrackDescriptor},
};
use std::str::FromStr;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    batch::{BatchWriter, DEFAULT_MAX_BATCH_SIZE},
    error::MigrationError,
    resolver::{MatchPolicy, TrackResolver},
    traits::{DestinationCatalog, SourceCatalog},
};

/// What to do when a destination search fails for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFailurePolicy {
    /// End the run.
    #[default]
    Abort,
    /// Record the track as skipped and carry on.
    Skip,
}

impl FromStr for SearchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(SearchFailurePolicy::Abort),
            "skip" => Ok(SearchFailurePolicy::Skip),
            other => Err(format!(
                "unknown search failure policy '{other}' (expected 'abort' or 'skip')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub max_batch_size: usize,
    /// Tracks resolved at once. Results are still written in source order.
    pub resolve_concurrency: usize,
    pub match_policy: MatchPolicy,
    pub search_failure_policy: SearchFailurePolicy,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            resolve_concurrency: 1,
            match_policy: MatchPolicy::default(),
            search_failure_policy: SearchFailurePolicy::default(),
        }
    }
}

impl MigrationConfig {
    pub fn validate(&self) -> Result<(), MigrationError> {
        if self.max_batch_size == 0 {
            return Err(MigrationError::InvalidConfig(
                "max batch size must be at least 1".to_string(),
            ));
        }
        if self.resolve_concurrency == 0 {
            return Err(MigrationError::InvalidConfig(
                "resolve concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A run that ended early, with everything it got done before stopping.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MigrationFailure {
    pub error: MigrationError,
    pub report: MigrationReport,
}

impl MigrationFailure {
    /// Failure before the orchestrator started, e.g. while obtaining credentials.
    pub fn before_start(
        source: impl Into<String>,
        source_playlist_id: impl Into<String>,
        error: MigrationError,
    ) -> Self {
        let mut report = MigrationReport::new(source, source_playlist_id);
        report.abort();
        Self { error, report }
    }
}

/// Copies one source playlist into a newly created destination playlist.
///
/// The whole source is read before the destination playlist is created. A
/// failure after creation leaves the playlist in place with every batch
/// flushed so far.
pub struct Migration<'a> {
    source: &'a dyn SourceCatalog,
    destination: &'a dyn DestinationCatalog,
    config: MigrationConfig,
}

impl<'a> Migration<'a> {
    pub fn new(
        source: &'a dyn SourceCatalog,
        destination: &'a dyn DestinationCatalog,
        config: MigrationConfig,
    ) -> Self {
        Self {
            source,
            destination,
            config,
        }
    }

    pub async fn run(
        &self,
        source_playlist_id: &str,
        spec: &PlaylistSpec,
    ) -> Result<MigrationReport, MigrationFailure> {
        let mut report = MigrationReport::new(self.source.id(), source_playlist_id);

        match self.execute(source_playlist_id, spec, &mut report).await {
            Ok(()) => {
                report.complete();
                info!(
                    "Migrated '{}' from {} to {}: {}/{} matched, {} unmatched, {} skipped",
                    spec.name,
                    self.source.name(),
                    self.destination.name(),
                    report.matched,
                    report.tracks_seen,
                    report.unmatched,
                    report.skipped
                );
                Ok(report)
            }
            Err(error) => {
                report.abort();
                error!(
                    "Migration of {} aborted during {:?}: {}",
                    source_playlist_id, report.failed_in, error
                );
                Err(MigrationFailure { error, report })
            }
        }
    }

    async fn execute(
        &self,
        source_playlist_id: &str,
        spec: &PlaylistSpec,
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        self.config.validate()?;

        report.advance(MigrationPhase::ReadingSource);
        let descriptors: Vec<TrackDescriptor> = self
            .source
            .tracks(source_playlist_id)
            .try_collect()
            .await
            .map_err(MigrationError::CatalogUnavailable)?;
        report.tracks_seen = descriptors.len();
        info!(
            "Read {} tracks from {} playlist {}",
            descriptors.len(),
            self.source.name(),
            source_playlist_id
        );

        report.advance(MigrationPhase::CreatingDestination);
        let playlist_id = self
            .destination
            .create_playlist(spec)
            .await
            .map_err(MigrationError::PlaylistCreationFailure)?;
        info!(
            "Created {} playlist '{}' ({})",
            self.destination.name(),
            spec.name,
            playlist_id
        );
        report.destination_playlist_id = Some(playlist_id.clone());

        report.advance(MigrationPhase::ResolvingAndWriting);
        let resolver = TrackResolver::new(self.destination, self.config.match_policy);
        let mut writer = BatchWriter::new(self.destination, playlist_id, self.config.max_batch_size);
        let outcome = self
            .resolve_and_write(&resolver, &mut writer, &descriptors, report)
            .await;

        report.batches_flushed = writer.batches_flushed();
        report.tracks_written = writer.tracks_written();
        outcome
    }

    async fn resolve_and_write(
        &self,
        resolver: &TrackResolver<'_>,
        writer: &mut BatchWriter<'_>,
        descriptors: &[TrackDescriptor],
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        // `buffered` yields in input order, so the writer sees source order
        // whatever the concurrency.
        let mut results = stream::iter(descriptors.iter().cloned())
            .map(|descriptor| async move {
                let result = resolver.resolve(&descriptor).await;
                (descriptor, result)
            })
            .buffered(self.config.resolve_concurrency);

        while let Some((descriptor, result)) = results.next().await {
            let result = match result {
                Ok(result) => result,
                Err(source) => match self.config.search_failure_policy {
                    SearchFailurePolicy::Abort => {
                        return Err(MigrationError::UpstreamSearchFailure {
                            track: descriptor,
                            source,
                        });
                    }
                    SearchFailurePolicy::Skip => {
                        warn!("Skipping '{}', search failed: {}", descriptor, source);
                        report.record_skipped(&descriptor);
                        continue;
                    }
                },
            };

            report.record(&descriptor, &result);
            match result {
                MatchResult::Matched { track_id, .. } => writer.add_match(track_id).await?,
                MatchResult::Unmatched => warn!("No match for '{}'", descriptor),
            }
        }

        writer.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_sizes() {
        let config = MigrationConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MigrationError::InvalidConfig(_))
        ));

        let config = MigrationConfig {
            resolve_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(MigrationConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_search_failure_policy() {
        assert_eq!(
            "skip".parse::<SearchFailurePolicy>(),
            Ok(SearchFailurePolicy::Skip)
        );
        assert_eq!(
            "Abort".parse::<SearchFailurePolicy>(),
            Ok(SearchFailurePolicy::Abort)
        );
        assert!("retry".parse::<SearchFailurePolicy>().is_err());
    }

    #[test]
    fn failure_before_start_is_aborted_awaiting_auth() {
        let failure = MigrationFailure::before_start(
            "spotify",
            "abc",
            MigrationError::InvalidConfig("x".into()),
        );
        assert_eq!(failure.report.phase, MigrationPhase::Aborted);
        assert_eq!(failure.report.failed_in, Some(MigrationPhase::AwaitingAuth));
    }
}

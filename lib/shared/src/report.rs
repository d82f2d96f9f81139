use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::track::{MatchResult, MatchStrategy, TrackDescriptor};

/// Lifecycle of one migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    AwaitingAuth,
    ReadingSource,
    CreatingDestination,
    ResolvingAndWriting,
    Done,
    Aborted,
}

impl MigrationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationPhase::Done | MigrationPhase::Aborted)
    }
}

/// Outcome of a migration run, complete or aborted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub source: String,
    pub source_playlist_id: String,
    pub destination_playlist_id: Option<String>,
    pub phase: MigrationPhase,
    /// Phase the run was in when it aborted.
    pub failed_in: Option<MigrationPhase>,
    pub tracks_seen: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Tracks whose search failed and were skipped instead of aborting the run.
    pub skipped: usize,
    pub matched_by_identifier: usize,
    pub matched_by_description: usize,
    pub batches_flushed: usize,
    pub tracks_written: usize,
    pub unmatched_tracks: Vec<TrackDescriptor>,
    pub skipped_tracks: Vec<TrackDescriptor>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationReport {
    pub fn new(source: impl Into<String>, source_playlist_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_playlist_id: source_playlist_id.into(),
            destination_playlist_id: None,
            phase: MigrationPhase::AwaitingAuth,
            failed_in: None,
            tracks_seen: 0,
            matched: 0,
            unmatched: 0,
            skipped: 0,
            matched_by_identifier: 0,
            matched_by_description: 0,
            batches_flushed: 0,
            tracks_written: 0,
            unmatched_tracks: Vec::new(),
            skipped_tracks: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Moves to `phase`. Terminal phases are final.
    pub fn advance(&mut self, phase: MigrationPhase) {
        if !self.phase.is_terminal() {
            self.phase = phase;
        }
    }

    pub fn record(&mut self, descriptor: &TrackDescriptor, result: &MatchResult) {
        match result {
            MatchResult::Matched { strategy, .. } => {
                self.matched += 1;
                match strategy {
                    MatchStrategy::Identifier => self.matched_by_identifier += 1,
                    MatchStrategy::Descriptive => self.matched_by_description += 1,
                }
            }
            MatchResult::Unmatched => {
                self.unmatched += 1;
                self.unmatched_tracks.push(descriptor.clone());
            }
        }
    }

    pub fn record_skipped(&mut self, descriptor: &TrackDescriptor) {
        self.skipped += 1;
        self.skipped_tracks.push(descriptor.clone());
    }

    /// Tracks that went through resolution so far.
    pub fn processed(&self) -> usize {
        self.matched + self.unmatched + self.skipped
    }

    /// Percentage of seen tracks that were matched.
    pub fn match_rate(&self) -> f64 {
        if self.tracks_seen == 0 {
            return 0.0;
        }
        self.matched as f64 / self.tracks_seen as f64 * 100.0
    }

    pub fn complete(&mut self) {
        self.advance(MigrationPhase::Done);
        self.finished_at = Some(Utc::now());
    }

    pub fn abort(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.failed_in = Some(self.phase);
        self.phase = MigrationPhase::Aborted;
        self.finished_at = Some(Utc::now());
    }
}

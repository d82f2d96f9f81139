use tracing::{debug, info};

use crate::{error::MigrationError, traits::DestinationCatalog};

/// Largest bulk append the destination accepts unless configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 20;

/// Appends matched tracks to the destination playlist in bounded batches.
///
/// Every accumulated identifier is sent in exactly one bulk call, in the order
/// it was added. A failed flush is neither retried nor rolled back: batches
/// flushed before it stay in the playlist.
pub struct BatchWriter<'a> {
    destination: &'a dyn DestinationCatalog,
    playlist_id: String,
    max_batch_size: usize,
    pending: Vec<String>,
    batches_flushed: usize,
    tracks_written: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(
        destination: &'a dyn DestinationCatalog,
        playlist_id: impl Into<String>,
        max_batch_size: usize,
    ) -> Self {
        let max_batch_size = max_batch_size.max(1);
        Self {
            destination,
            playlist_id: playlist_id.into(),
            max_batch_size,
            pending: Vec::with_capacity(max_batch_size),
            batches_flushed: 0,
            tracks_written: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }

    pub fn tracks_written(&self) -> usize {
        self.tracks_written
    }

    /// Queues a matched track, flushing once the batch is full.
    pub async fn add_match(&mut self, track_id: String) -> Result<(), MigrationError> {
        self.pending.push(track_id);
        if self.pending.len() >= self.max_batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// End of stream: flushes whatever is left.
    pub async fn finish(&mut self) -> Result<(), MigrationError> {
        if !self.pending.is_empty() {
            self.flush().await?;
        }
        info!(
            "Wrote {} tracks to playlist {} in {} batches",
            self.tracks_written, self.playlist_id, self.batches_flushed
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), MigrationError> {
        // Taken before the call so a failed batch is never sent twice.
        let batch = std::mem::take(&mut self.pending);
        let number = self.batches_flushed + 1;
        debug!(
            "Flushing batch {} ({} tracks) to {}",
            number,
            batch.len(),
            self.destination.name()
        );

        self.destination
            .append_tracks(&self.playlist_id, &batch)
            .await
            .map_err(|source| MigrationError::UpstreamWriteFailure {
                batch: number,
                size: batch.len(),
                source,
            })?;

        self.batches_flushed = number;
        self.tracks_written += batch.len();
        Ok(())
    }
}

//! Parallel cover embedding using tokio
//!
//! Embeds covers for many pairs concurrently on a bounded pool of blocking
//! workers. Completions are handed to a single aggregator callback, so the
//! caller stays the only writer of progress state.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::archive::ArchiveEntry;
use crate::audio::embed_cover;
use crate::core::{cover_output_name, plain_output_name, NumericKey, Pair};
use crate::error::PipelineError;

/// What happened to one audio entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    /// Cover embedded, staged under the cover name
    Embedded,
    /// No matching cover, original bytes staged
    PassThrough,
    /// Embedding failed, original bytes staged
    EmbedFailed { reason: String },
}

/// An output entry ready for assembly
#[derive(Debug, Clone)]
pub struct StagedPair {
    /// Position in matcher order
    pub index: usize,
    pub key: NumericKey,
    /// Path of the audio entry in the source archive
    pub source_path: String,
    pub entry: ArchiveEntry,
    pub outcome: PairOutcome,
}

/// Embed (or pass through) a single pair
pub fn stage_pair(index: usize, pair: Pair) -> StagedPair {
    let Pair { key, audio, cover } = pair;
    let source_path = audio.path;

    let (entry, outcome) = match cover {
        None => (
            ArchiveEntry::new(plain_output_name(&key), audio.data),
            PairOutcome::PassThrough,
        ),
        Some(cover) => match embed_cover(&key, &audio.data, &cover.data) {
            Ok(bytes) => (
                ArchiveEntry::new(cover_output_name(&key), bytes),
                PairOutcome::Embedded,
            ),
            Err(e) => {
                log::warn!("{} - passing original audio through", e);
                (
                    ArchiveEntry::new(plain_output_name(&key), audio.data),
                    PairOutcome::EmbedFailed {
                        reason: e.source.to_string(),
                    },
                )
            }
        },
    };

    log::debug!("Staged {} ({:?})", entry.path, outcome);
    StagedPair {
        index,
        key,
        source_path,
        entry,
        outcome,
    }
}

/// Stage all pairs on at most `workers` concurrent blocking tasks
///
/// `on_pair_complete` runs on the calling task once per pair, in completion
/// order. The returned entries are in matcher order. A worker that panics
/// aborts the whole batch with `PipelineError::Processing`.
pub async fn embed_pairs_parallel<F>(
    pairs: Vec<Pair>,
    workers: usize,
    mut on_pair_complete: F,
) -> Result<Vec<StagedPair>, PipelineError>
where
    F: FnMut(&StagedPair),
{
    let total = pairs.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    log::info!(
        "Starting cover embedding: {} files with {} workers",
        total,
        workers.max(1)
    );

    let mut futures = FuturesUnordered::new();
    for (index, pair) in pairs.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        futures.push(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| PipelineError::Processing(format!("worker pool closed: {}", e)))?;
            tokio::task::spawn_blocking(move || stage_pair(index, pair))
                .await
                .map_err(|e| PipelineError::Processing(format!("embed worker failed: {}", e)))
        });
    }

    let mut staged: Vec<Option<StagedPair>> = (0..total).map(|_| None).collect();
    while let Some(result) = futures.next().await {
        let pair = result?;
        on_pair_complete(&pair);
        let index = pair.index;
        staged[index] = Some(pair);
    }

    Ok(staged.into_iter().flatten().collect())
}

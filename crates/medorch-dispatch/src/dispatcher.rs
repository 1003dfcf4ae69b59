use futures::future::join_all;
use serde::Serialize;

use crate::error::DispatchError;
use crate::merge::{merge_outcomes, MergedRecord};
use crate::outcome::WorkerOutcome;
use crate::partition::partition;
use crate::source::SourceId;
use crate::worker::Worker;

/// One worker result tagged with where it belongs in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchedOutcome {
    pub source: SourceId,
    /// Index of the key in the dispatched batch.
    pub position: usize,
    pub key: String,
    pub outcome: WorkerOutcome,
}

/// Fans a batch of keys out to one worker invocation per `(source, key)`.
///
/// Keys are grouped per source into `workers_per_source` chunks for logging
/// and aggregation; every invocation in every chunk runs concurrently.
#[derive(Debug, Clone)]
pub struct Dispatcher<W> {
    worker: W,
    sources: Vec<SourceId>,
    workers_per_source: usize,
}

impl<W: Worker> Dispatcher<W> {
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] if `workers_per_source` is
    /// zero or `sources` is empty.
    pub fn new(
        worker: W,
        sources: Vec<SourceId>,
        workers_per_source: usize,
    ) -> Result<Self, DispatchError> {
        if workers_per_source == 0 {
            return Err(DispatchError::InvalidArgument(
                "workers_per_source must be at least 1".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "at least one source is required".to_string(),
            ));
        }
        Ok(Self {
            worker,
            sources,
            workers_per_source,
        })
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Invoke every `(source, key)` pair and wait for all of them.
    ///
    /// Duplicate keys are dispatched once per position. Outcomes come back
    /// grouped by source, then by position.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] for an empty batch. Worker
    /// failures never surface here; they are carried in each outcome.
    pub async fn dispatch(&self, keys: &[String]) -> Result<Vec<DispatchedOutcome>, DispatchError> {
        if keys.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "at least one lookup key is required".to_string(),
            ));
        }

        let mut invocations = Vec::with_capacity(keys.len() * self.sources.len());
        for &source in &self.sources {
            let chunks = partition(keys, self.workers_per_source)?;
            tracing::debug!(
                source = %source,
                keys = keys.len(),
                chunks = chunks.len(),
                "dispatching source"
            );

            let mut offset = 0;
            for chunk in chunks {
                for (i, key) in chunk.iter().enumerate() {
                    let position = offset + i;
                    invocations.push(async move {
                        let outcome = self.worker.invoke(source, key).await;
                        DispatchedOutcome {
                            source,
                            position,
                            key: key.clone(),
                            outcome,
                        }
                    });
                }
                offset += chunk.len();
            }
        }

        let outcomes = join_all(invocations).await;

        let failed = outcomes.iter().filter(|o| !o.outcome.is_success()).count();
        tracing::info!(
            keys = keys.len(),
            invocations = outcomes.len(),
            failed,
            "dispatch complete"
        );

        Ok(outcomes)
    }

    /// Dispatch a batch and merge it into one record per distinct key.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] for an empty batch.
    pub async fn lookup(&self, keys: &[String]) -> Result<Vec<MergedRecord>, DispatchError> {
        let outcomes = self.dispatch(keys).await?;
        Ok(merge_outcomes(keys, &self.sources, outcomes))
    }
}

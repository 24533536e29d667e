// crates/serving-contract-core/src/runtime/session.rs
// ============================================================================
// Module: Inference Session
// Description: Drives batches through a transport and merges the outputs.
// Purpose: Run a full input set against a validated model.
// Dependencies: crate::{core, interfaces, runtime}, thiserror, tracing
// ============================================================================

//! ## Overview
//! An [`InferenceSession`] feeds every batch, in order, to an
//! [`InferenceTransport`], collects each requested output by name, and
//! concatenates the per-batch pieces along the leading axis. The first failure
//! stops the run; nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;
use tracing::debug;
use tracing::info;

use crate::core::ConcatError;
use crate::core::HostTensor;
use crate::core::ModelRef;
use crate::interfaces::InferenceTransport;
use crate::interfaces::TransportError;
use crate::runtime::batcher::BatchError;
use crate::runtime::client::ModelClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Inference run errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Batch generation failed.
    #[error(transparent)]
    Batch(#[from] BatchError),
    /// The transport failed for a batch.
    #[error("batch {batch}: {source}")]
    Transport {
        /// Batch index.
        batch: usize,
        /// Underlying transport error.
        source: TransportError,
    },
    /// A response lacked a requested output.
    #[error("batch {batch}: response is missing output '{output}'")]
    MissingOutput {
        /// Batch index.
        batch: usize,
        /// Output name.
        output: String,
    },
    /// Per-batch outputs could not be merged.
    #[error("output '{output}': {source}")]
    Merge {
        /// Output name.
        output: String,
        /// Underlying concatenation error.
        source: ConcatError,
    },
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceReport {
    /// Merged outputs keyed by output name.
    pub outputs: BTreeMap<String, HostTensor>,
    /// Number of batches sent.
    pub batches: usize,
    /// Wall time spent in the run.
    pub elapsed: Duration,
}

impl InferenceReport {
    /// Returns the average wall time per batch.
    #[must_use]
    pub fn average_batch_time(&self) -> Duration {
        u32::try_from(self.batches)
            .ok()
            .filter(|count| *count > 0)
            .map_or(Duration::ZERO, |count| self.elapsed / count)
    }
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Runs inputs through a validated client and a transport.
#[derive(Debug)]
pub struct InferenceSession<'a, T: ?Sized> {
    /// Validated client.
    client: &'a ModelClient,
    /// Downstream transport.
    transport: &'a T,
    /// Model reference passed to the transport.
    model: ModelRef,
}

impl<'a, T: InferenceTransport + ?Sized> InferenceSession<'a, T> {
    /// Creates a session.
    #[must_use]
    pub const fn new(client: &'a ModelClient, transport: &'a T, model: ModelRef) -> Self {
        Self {
            client,
            transport,
            model,
        }
    }

    /// Runs every batch of `inputs` and merges the outputs.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] on the first batching, transport, or merge failure.
    pub fn run(&self, inputs: Vec<HostTensor>) -> Result<InferenceReport, RunError> {
        let started = Instant::now();
        let mut pieces: BTreeMap<String, Vec<HostTensor>> = self
            .client
            .output_names()
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        let mut batches = 0;

        for batch in self.client.batches(inputs)? {
            let batch = batch?;
            let sent = Instant::now();
            let mut response =
                self.transport.infer(&self.model, &batch).map_err(|source| RunError::Transport {
                    batch: batch.index,
                    source,
                })?;
            for requested in &batch.outputs {
                let output = response.outputs.remove(&requested.name).ok_or_else(|| {
                    RunError::MissingOutput {
                        batch: batch.index,
                        output: requested.name.clone(),
                    }
                })?;
                pieces.entry(requested.name.clone()).or_default().push(output);
            }
            debug!(
                model = %self.model,
                batch = batch.index,
                rows = batch.rows(),
                bytes = batch.inputs.iter().filter_map(|input| input.byte_len()).sum::<usize>(),
                elapsed_ms = sent.elapsed().as_millis(),
                "batch complete"
            );
            batches += 1;
        }

        let mut outputs = BTreeMap::new();
        if batches > 0 {
            for (name, parts) in pieces {
                let merged = HostTensor::concatenate(&parts).map_err(|source| RunError::Merge {
                    output: name.clone(),
                    source,
                })?;
                outputs.insert(name, merged);
            }
        }

        let report = InferenceReport {
            outputs,
            batches,
            elapsed: started.elapsed(),
        };
        info!(
            model = %self.model,
            batches = report.batches,
            total_ms = report.elapsed.as_millis(),
            avg_batch_ms = report.average_batch_time().as_millis(),
            "inference run complete"
        );
        Ok(report)
    }
}

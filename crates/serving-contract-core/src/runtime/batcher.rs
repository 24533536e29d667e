// crates/serving-contract-core/src/runtime/batcher.rs
// ============================================================================
// Module: Batch Generator
// Description: Slices concatenated inputs into server-sized batches.
// Purpose: Produce an ordered, lazy sequence of typed inference requests.
// Dependencies: crate::core, crate::runtime::client, thiserror, tracing
// ============================================================================

//! ## Overview
//! Given one array per declared input, all sharing a leading length `T`, the
//! batcher yields `ceil(T / b)` batches where `b` is the model's maximum batch
//! size (or `T` itself for unbatched models). Batch `k` holds rows
//! `[k*b, min((k+1)*b, T))` of every input, cast to the declared datatype.
//! Concatenating the yielded slices along the leading axis reproduces the
//! inputs exactly.
//!
//! Inputs are checked up front: count, rank, a shared leading length, and
//! trailing dims against the reported shape (`-1` matches any size). Casting
//! happens lazily per batch; the first cast failure ends the sequence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::iter::FusedIterator;
use std::ops::Range;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::core::Batch;
use crate::core::CastError;
use crate::core::HostTensor;
use crate::core::InferInput;
use crate::core::RequestedOutput;
use crate::core::VARIABLE_DIM;
use crate::runtime::client::ModelClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Batch generation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Wrong number of input arrays.
    #[error("expected {expected} inputs, got {actual}")]
    InputCount {
        /// Declared input count.
        expected: usize,
        /// Supplied input count.
        actual: usize,
    },
    /// An input has no leading axis.
    #[error("input '{input}' is a scalar; a leading batch axis is required")]
    ScalarInput {
        /// Input name.
        input: String,
    },
    /// Inputs disagree on leading length.
    #[error("input '{input}' has {actual} rows, expected {expected} to match the first input")]
    LeadingDimension {
        /// Input name.
        input: String,
        /// Leading length of the first input.
        expected: usize,
        /// Leading length of this input.
        actual: usize,
    },
    /// An input's dims do not fit the reported shape.
    #[error("input '{input}' has shape {actual:?}, which does not fit model shape {expected:?}")]
    InputShape {
        /// Input name.
        input: String,
        /// Reported model shape.
        expected: Vec<i64>,
        /// Supplied array shape.
        actual: Vec<usize>,
    },
    /// Casting a slice to the declared datatype failed.
    #[error("input '{input}' batch {batch}: {source}")]
    Cast {
        /// Input name.
        input: String,
        /// Batch index.
        batch: usize,
        /// Underlying cast error.
        source: CastError,
    },
}

// ============================================================================
// SECTION: Batch Plan
// ============================================================================

/// Batch arithmetic for a leading length and a maximum batch size.
///
/// # Invariants
/// - `num_batches == ceil(total / batch_size)`, and `0` when `total == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    /// Leading length of the inputs.
    pub total: usize,
    /// Effective rows per batch.
    pub batch_size: usize,
    /// Number of batches.
    pub num_batches: usize,
}

impl BatchPlan {
    /// Plans batches for `total` rows; `max_batch_size == 0` yields one batch
    /// holding every row.
    ///
    /// `total == 0` yields no batches, even for an unbatched model, since
    /// there is no row to send.
    #[must_use]
    pub fn new(total: usize, max_batch_size: u32) -> Self {
        let batch_size = if max_batch_size > 0 {
            usize::try_from(max_batch_size).unwrap_or(usize::MAX)
        } else {
            total
        };
        let num_batches = if total == 0 { 0 } else { total.div_ceil(batch_size) };
        Self {
            total,
            batch_size,
            num_batches,
        }
    }

    /// Returns the row range of batch `index`.
    #[must_use]
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.num_batches {
            return None;
        }
        let start = index * self.batch_size;
        let end = start.saturating_add(self.batch_size).min(self.total);
        Some(start..end)
    }

    /// Returns the row count of every batch in order.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        (0..self.num_batches)
            .filter_map(|index| self.range(index))
            .map(|range| range.len())
            .collect()
    }
}

// ============================================================================
// SECTION: Batch Iterator
// ============================================================================

/// Lazy, finite, non-restartable batch sequence.
#[derive(Debug)]
pub struct BatchIter<'a> {
    /// Validated client supplying names and datatypes.
    client: &'a ModelClient,
    /// Caller inputs in model order.
    inputs: Vec<HostTensor>,
    /// Requested outputs shared by every batch.
    outputs: Vec<RequestedOutput>,
    /// Batch arithmetic.
    plan: BatchPlan,
    /// Next batch index to produce.
    next: usize,
}

impl BatchIter<'_> {
    /// Returns the batch plan.
    #[must_use]
    pub const fn plan(&self) -> BatchPlan {
        self.plan
    }

    /// Builds batch `index`.
    fn build(&self, index: usize, rows: Range<usize>) -> Result<Batch, BatchError> {
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for (position, input) in self.inputs.iter().enumerate() {
            let name = &self.client.input_names()[position];
            let datatype = self.client.input_datatypes()[position];
            let data = input
                .slice_leading(rows.clone())
                .cast(datatype, self.client.cast_policy())
                .map_err(|source| BatchError::Cast {
                    input: name.clone(),
                    batch: index,
                    source,
                })?;
            inputs.push(InferInput {
                name: name.clone(),
                datatype,
                data,
            });
        }
        Ok(Batch {
            index,
            inputs,
            outputs: self.outputs.clone(),
        })
    }
}

impl Iterator for BatchIter<'_> {
    type Item = Result<Batch, BatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let rows = self.plan.range(index)?;
        let result = self.build(index, rows);
        self.next = if result.is_ok() { index + 1 } else { self.plan.num_batches };
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.plan.num_batches.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for BatchIter<'_> {}

// ============================================================================
// SECTION: Client Entry Point
// ============================================================================

impl ModelClient {
    /// Checks `inputs` and returns the batch sequence for them.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] when the inputs do not match the declared
    /// inputs in count, rank, leading length, or trailing dims.
    pub fn batches(&self, inputs: Vec<HostTensor>) -> Result<BatchIter<'_>, BatchError> {
        if inputs.len() != self.input_names().len() {
            return Err(BatchError::InputCount {
                expected: self.input_names().len(),
                actual: inputs.len(),
            });
        }

        let mut total = None;
        for (position, input) in inputs.iter().enumerate() {
            let name = &self.input_names()[position];
            let Some(rows) = input.leading_len() else {
                return Err(BatchError::ScalarInput {
                    input: name.clone(),
                });
            };
            let expected = *total.get_or_insert(rows);
            if rows != expected {
                return Err(BatchError::LeadingDimension {
                    input: name.clone(),
                    expected,
                    actual: rows,
                });
            }
            self.check_input_shape(position, input)?;
        }

        let plan = BatchPlan::new(total.unwrap_or(0), self.max_batch_size());
        debug!(
            model = %self.model_name(),
            rows = plan.total,
            batch_size = plan.batch_size,
            batches = plan.num_batches,
            "planned batches"
        );
        Ok(BatchIter {
            client: self,
            inputs,
            outputs: self.requested_outputs(),
            plan,
            next: 0,
        })
    }

    /// Compares an input array's dims with the reported shape, skipping the
    /// batch axis for batched models.
    fn check_input_shape(&self, position: usize, input: &HostTensor) -> Result<(), BatchError> {
        let reported = &self.input_shapes()[position];
        let actual = input.shape();
        let (model_dims, array_dims) = if self.max_batch_size() > 0 {
            (reported.get(1..).unwrap_or_default(), actual.get(1..).unwrap_or_default())
        } else {
            (&reported[..], actual)
        };
        let fits = model_dims.len() == array_dims.len()
            && model_dims.iter().zip(array_dims).all(|(model, array)| {
                *model == VARIABLE_DIM || i64::try_from(*array).is_ok_and(|array| array == *model)
            });
        if fits {
            return Ok(());
        }
        Err(BatchError::InputShape {
            input: self.input_names()[position].clone(),
            expected: reported.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

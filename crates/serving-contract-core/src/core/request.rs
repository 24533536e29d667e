// crates/serving-contract-core/src/core/request.rs
// ============================================================================
// Module: Inference Requests
// Description: Model references and per-batch request payloads.
// Purpose: Define what the batcher yields and what a transport consumes.
// Dependencies: crate::core::{datatype, tensor}, serde
// ============================================================================

//! ## Overview
//! A [`Batch`] is one inference-ready request: typed input slices plus the
//! names of the outputs to return. Batches are built fresh for every call and
//! are not retained by the client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::datatype::DataType;
use crate::core::tensor::HostTensor;

// ============================================================================
// SECTION: Model Reference
// ============================================================================

/// Model name plus optional version; an absent version selects the server
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    /// Model name.
    pub name: String,
    /// Optional model version.
    #[serde(default)]
    pub version: Option<String>,
}

impl ModelRef {
    /// Creates a reference to the default version of `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Pins the reference to `version`; an empty string keeps the default.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = if version.trim().is_empty() { None } else { Some(version) };
        self
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ============================================================================
// SECTION: Batch Payloads
// ============================================================================

/// One named input slice of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct InferInput {
    /// Model input name.
    pub name: String,
    /// Declared datatype; `data` has been cast to it.
    pub datatype: DataType,
    /// Slice data of shape `[b, ...dims]` for batched models.
    pub data: HostTensor,
}

impl InferInput {
    /// Returns the slice shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Returns the payload size in bytes, or `None` for variable-length bytes.
    #[must_use]
    pub fn byte_len(&self) -> Option<usize> {
        self.datatype.element_size().map(|size| size * self.data.len())
    }
}

/// Output requested from the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestedOutput {
    /// Model output name.
    pub name: String,
}

/// One inference-ready slice of the full input set.
///
/// # Invariants
/// - `inputs` follow the model's declared input order.
/// - `outputs` are identical for every batch of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Zero-based batch index within the call.
    pub index: usize,
    /// Typed input slices.
    pub inputs: Vec<InferInput>,
    /// Requested outputs.
    pub outputs: Vec<RequestedOutput>,
}

impl Batch {
    /// Returns the number of rows in the batch.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.inputs.first().and_then(|input| input.data.leading_len()).unwrap_or(0)
    }
}

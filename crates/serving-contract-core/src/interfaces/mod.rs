// crates/serving-contract-core/src/interfaces/mod.rs
// ============================================================================
// Module: Serving Contract Interfaces
// Description: Backend-agnostic interfaces for contract fetch and inference.
// Purpose: Define the collaborator surfaces the client consumes but does not
//          implement.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The client never talks to the network itself. Model documents arrive
//! through a [`ContractSource`], and each batch is handed to an
//! [`InferenceTransport`]. Failures in either are reported as-is; retries,
//! timeouts, and cancellation belong to the implementation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::Batch;
use crate::core::HostTensor;
use crate::core::ModelConfig;
use crate::core::ModelMetadata;
use crate::core::ModelRef;

// ============================================================================
// SECTION: Contract Source
// ============================================================================

/// Contract source errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The model is unknown to the server.
    #[error("model not found: {0}")]
    NotFound(String),
    /// The source failed to produce a document.
    #[error("contract source error: {0}")]
    Unavailable(String),
}

/// Upstream provider of model metadata and configuration documents.
pub trait ContractSource {
    /// Fetches the metadata document for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the document cannot be fetched.
    fn model_metadata(&self, model: &ModelRef) -> Result<ModelMetadata, SourceError>;

    /// Fetches the configuration document for `model`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the document cannot be fetched.
    fn model_config(&self, model: &ModelRef) -> Result<ModelConfig, SourceError>;
}

// ============================================================================
// SECTION: Inference Transport
// ============================================================================

/// Inference response exposing named output arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferResponse {
    /// Output arrays keyed by output name.
    pub outputs: BTreeMap<String, HostTensor>,
}

/// Transport errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server rejected or failed the request.
    #[error("inference failed: {0}")]
    Inference(String),
    /// The transport itself failed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Downstream consumer of batches.
pub trait InferenceTransport {
    /// Runs inference for one batch.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request fails.
    fn infer(&self, model: &ModelRef, batch: &Batch) -> Result<InferResponse, TransportError>;
}

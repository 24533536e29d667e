// crates/serving-contract-core/src/lib.rs
// ============================================================================
// Module: Serving Contract Core Library
// Description: Public API surface for the serving contract core.
// Purpose: Expose contract types, collaborator interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Serving contract core validates a served model's reported inputs and
//! outputs against caller expectations, then slices concatenated host arrays
//! into batches sized for the model. Network transport and model execution
//! stay behind the [`ContractSource`] and [`InferenceTransport`] interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::ContractSource;
pub use interfaces::InferResponse;
pub use interfaces::InferenceTransport;
pub use interfaces::SourceError;
pub use interfaces::TransportError;
pub use runtime::BatchError;
pub use runtime::BatchIter;
pub use runtime::BatchPlan;
pub use runtime::ConnectError;
pub use runtime::InferenceReport;
pub use runtime::InferenceSession;
pub use runtime::ModelClient;
pub use runtime::RunError;
pub use runtime::connect;

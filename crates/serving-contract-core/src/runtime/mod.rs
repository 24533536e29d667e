// crates/serving-contract-core/src/runtime/mod.rs
// ============================================================================
// Module: Serving Contract Runtime
// Description: Contract validation, batch generation, and inference sessions.
// Purpose: Turn reported contracts and caller inputs into inference requests.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The runtime is synchronous and holds no shared mutable state. A validated
//! [`ModelClient`] is immutable; batches and reports are built per call.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod batcher;
pub mod client;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use batcher::BatchError;
pub use batcher::BatchIter;
pub use batcher::BatchPlan;
pub use client::ConnectError;
pub use client::ModelClient;
pub use client::connect;
pub use session::InferenceReport;
pub use session::InferenceSession;
pub use session::RunError;

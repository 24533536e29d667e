// crates/serving-contract-config/src/lib.rs
// ============================================================================
// Module: Serving Contract Config Library
// Description: Client configuration model, validation, and examples.
// Purpose: Single source of truth for serving-contract.toml semantics.
// Dependencies: serving-contract-core, serde, toml
// ============================================================================

//! ## Overview
//! `serving-contract-config` defines the configuration a client is built
//! from: the model to target, the tensors the caller expects it to expose,
//! and how batch slices are cast. Loading is strict and fails closed; every
//! limit violation names the offending key.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;

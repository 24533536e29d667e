// crates/serving-contract-core/src/core/mod.rs
// ============================================================================
// Module: Serving Contract Core Types
// Description: Datatypes, contracts, serving documents, requests, and tensors.
// Purpose: Provide stable, serializable types for contract validation.
// Dependencies: half, ndarray, serde, smallvec
// ============================================================================

//! ## Overview
//! Core types describe what a served model reports, what a caller expects,
//! and the host arrays fed to the model. They carry no I/O.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod contract;
pub mod datatype;
pub mod documents;
pub mod format;
pub mod request;
pub mod tensor;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use contract::ContractError;
pub use contract::ContractOrigin;
pub use contract::Dims;
pub use contract::ExpectedContract;
pub use contract::ExpectedTensor;
pub use contract::ModelContract;
pub use contract::TensorRole;
pub use contract::TensorSpec;
pub use contract::VARIABLE_DIM;
pub use datatype::DataType;
pub use datatype::DataTypeError;
pub use documents::ConfigInput;
pub use documents::ConfigOutput;
pub use documents::MetadataTensor;
pub use documents::ModelConfig;
pub use documents::ModelMetadata;
pub use format::FormatError;
pub use format::InputFormat;
pub use format::RawInputFormat;
pub use request::Batch;
pub use request::InferInput;
pub use request::ModelRef;
pub use request::RequestedOutput;
pub use tensor::CastError;
pub use tensor::CastPolicy;
pub use tensor::ConcatError;
pub use tensor::HostTensor;

// crates/serving-contract-core/src/runtime/client.rs
// ============================================================================
// Module: Model Client
// Description: Contract validation and the validated, ready client.
// Purpose: Fail construction eagerly when the served model does not match the
//          caller's expectations.
// Dependencies: crate::core, crate::interfaces, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ModelClient::new`] compares a [`ModelContract`] against an
//! [`ExpectedContract`] and either returns a ready client or the first
//! mismatch. Checks run in a fixed order: counts, then each input, then each
//! output; per tensor the order is datatype, rank, shape. A client that exists
//! has passed every check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing::debug;

use crate::core::CastPolicy;
use crate::core::ContractError;
use crate::core::ContractOrigin;
use crate::core::DataType;
use crate::core::Dims;
use crate::core::ExpectedContract;
use crate::core::ExpectedTensor;
use crate::core::InputFormat;
use crate::core::ModelConfig;
use crate::core::ModelContract;
use crate::core::ModelMetadata;
use crate::core::ModelRef;
use crate::core::RequestedOutput;
use crate::core::TensorRole;
use crate::core::TensorSpec;
use crate::interfaces::ContractSource;
use crate::interfaces::SourceError;

// ============================================================================
// SECTION: Model Client
// ============================================================================

/// Validated client for one served model.
///
/// # Invariants
/// - Input fields are parallel vectors in model input order.
/// - Every reported tensor matched its expectation at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelClient {
    /// Model name as reported.
    model_name: String,
    /// Maximum batch size; `0` means unbatched.
    max_batch_size: u32,
    /// Input names.
    input_names: Vec<String>,
    /// Reported input shapes.
    input_shapes: Vec<Dims>,
    /// Reported input datatypes.
    input_datatypes: Vec<DataType>,
    /// Normalized input formats.
    input_formats: Vec<InputFormat>,
    /// Output names.
    output_names: Vec<String>,
    /// Cast policy applied when batching.
    cast_policy: CastPolicy,
}

impl ModelClient {
    /// Validates `contract` against `expected` and builds a ready client.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContractError`] found.
    pub fn new(
        contract: ModelContract,
        expected: &ExpectedContract,
    ) -> Result<Self, ContractError> {
        let (inputs, outputs) = (contract.inputs.len(), contract.outputs.len());
        let model = &contract.name;
        let origin = ContractOrigin::Metadata;
        check_count(model, TensorRole::Input, origin, inputs, expected.input_count())?;
        check_count(model, TensorRole::Output, origin, outputs, expected.output_count())?;

        let batched = contract.is_batched();
        for (spec, expectation) in contract.inputs.iter().zip(&expected.inputs) {
            check_tensor(&contract.name, TensorRole::Input, spec, expectation, batched)?;
        }
        for (spec, expectation) in contract.outputs.iter().zip(&expected.outputs) {
            check_tensor(&contract.name, TensorRole::Output, spec, expectation, batched)?;
        }

        let mut input_formats = contract.input_formats;
        input_formats.resize(contract.inputs.len(), InputFormat::None);

        debug!(
            model = %contract.name,
            inputs = contract.inputs.len(),
            outputs = contract.outputs.len(),
            max_batch_size = contract.max_batch_size,
            "model contract validated"
        );

        Ok(Self {
            model_name: contract.name,
            max_batch_size: contract.max_batch_size,
            input_names: contract.inputs.iter().map(|spec| spec.name.clone()).collect(),
            input_shapes: contract.inputs.iter().map(|spec| spec.shape.clone()).collect(),
            input_datatypes: contract.inputs.iter().map(|spec| spec.datatype).collect(),
            input_formats,
            output_names: contract.outputs.into_iter().map(|spec| spec.name).collect(),
            cast_policy: CastPolicy::default(),
        })
    }

    /// Replaces the cast policy used when batching.
    #[must_use]
    pub const fn with_cast_policy(mut self, policy: CastPolicy) -> Self {
        self.cast_policy = policy;
        self
    }

    /// Returns the model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the maximum batch size; `0` means unbatched.
    #[must_use]
    pub const fn max_batch_size(&self) -> u32 {
        self.max_batch_size
    }

    /// Returns the input names in model order.
    #[must_use]
    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    /// Returns the reported input shapes in model order.
    #[must_use]
    pub fn input_shapes(&self) -> &[Dims] {
        &self.input_shapes
    }

    /// Returns the input datatypes in model order.
    #[must_use]
    pub fn input_datatypes(&self) -> &[DataType] {
        &self.input_datatypes
    }

    /// Returns the normalized input formats in model order.
    #[must_use]
    pub fn input_formats(&self) -> &[InputFormat] {
        &self.input_formats
    }

    /// Returns the output names in model order.
    #[must_use]
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Returns the cast policy used when batching.
    #[must_use]
    pub const fn cast_policy(&self) -> CastPolicy {
        self.cast_policy
    }

    /// Returns the requested-output list shared by every batch.
    #[must_use]
    pub fn requested_outputs(&self) -> Vec<RequestedOutput> {
        self.output_names
            .iter()
            .map(|name| RequestedOutput {
                name: name.clone(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Connect
// ============================================================================

/// Errors raised while fetching and validating a contract.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The contract source failed before validation started.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The fetched contract did not validate.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// Fetches metadata and configuration for `model` and validates them.
///
/// Both documents are counted against `expected` before the contract is
/// assembled: metadata inputs, configuration inputs, metadata outputs, then
/// configuration outputs.
///
/// # Errors
///
/// Returns [`ConnectError::Source`] when a document cannot be fetched and
/// [`ConnectError::Contract`] when validation fails.
pub fn connect<S: ContractSource + ?Sized>(
    source: &S,
    model: &ModelRef,
    expected: &ExpectedContract,
) -> Result<ModelClient, ConnectError> {
    let metadata = source.model_metadata(model)?;
    let config = source.model_config(model)?;
    check_document_counts(&metadata, &config, expected)?;
    let contract = ModelContract::from_documents(&metadata, &config)?;
    Ok(ModelClient::new(contract, expected)?)
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Ensures the reported tensor count matches the expected count.
fn check_count(
    model: &str,
    role: TensorRole,
    origin: ContractOrigin,
    actual: usize,
    expected: usize,
) -> Result<(), ContractError> {
    if actual == expected {
        return Ok(());
    }
    Err(ContractError::Count {
        model: model.to_string(),
        role,
        origin,
        expected,
        actual,
    })
}

/// Counts both fetched documents against the caller's expectations.
fn check_document_counts(
    metadata: &ModelMetadata,
    config: &ModelConfig,
    expected: &ExpectedContract,
) -> Result<(), ContractError> {
    let model = &metadata.name;
    let (inputs, outputs) = (expected.input_count(), expected.output_count());
    let counts = [
        (TensorRole::Input, ContractOrigin::Metadata, metadata.inputs.len(), inputs),
        (TensorRole::Input, ContractOrigin::Configuration, config.input.len(), inputs),
        (TensorRole::Output, ContractOrigin::Metadata, metadata.outputs.len(), outputs),
        (TensorRole::Output, ContractOrigin::Configuration, config.output.len(), outputs),
    ];
    for (role, origin, actual, required) in counts {
        check_count(model, role, origin, actual, required)?;
    }
    Ok(())
}

/// Checks datatype, rank, and shape of one tensor.
fn check_tensor(
    model: &str,
    role: TensorRole,
    spec: &TensorSpec,
    expectation: &ExpectedTensor,
    batched: bool,
) -> Result<(), ContractError> {
    if !expectation.allows(spec.datatype) {
        return Err(ContractError::Datatype {
            model: model.to_string(),
            role,
            tensor: spec.name.clone(),
            allowed: expectation.datatypes.iter().map(|kind| kind.as_str().to_string()).collect(),
            actual: spec.datatype,
        });
    }

    let expected_shape = expectation.reported_shape(batched);
    if spec.shape.len() != expected_shape.len() {
        return Err(ContractError::Rank {
            model: model.to_string(),
            role,
            tensor: spec.name.clone(),
            expected: expected_shape.len(),
            actual: spec.shape.len(),
        });
    }
    if spec.shape != expected_shape {
        return Err(ContractError::Shape {
            model: model.to_string(),
            role,
            tensor: spec.name.clone(),
            expected: expected_shape.to_vec(),
            actual: spec.shape.to_vec(),
        });
    }
    Ok(())
}

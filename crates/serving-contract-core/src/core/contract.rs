// crates/serving-contract-core/src/core/contract.rs
// ============================================================================
// Module: Model Contracts
// Description: Reported and expected tensor contracts for a served model.
// Purpose: Define the shapes, datatypes, and counts compared at client setup.
// Dependencies: crate::core::{datatype, format}, serde, smallvec, thiserror
// ============================================================================

//! ## Overview
//! A [`ModelContract`] is what the serving framework reports about a model:
//! ordered inputs and outputs with shapes and datatypes, the maximum batch
//! size, and one normalized layout hint per input. An [`ExpectedContract`] is
//! what the caller is prepared to feed and consume. Both lists are positional;
//! index `i` of one side is compared against index `i` of the other.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::core::datatype::DataType;
use crate::core::format::InputFormat;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Dimension value reserved for the batch axis and variable-size axes.
pub const VARIABLE_DIM: i64 = -1;

/// Inline dimension storage; most served tensors have rank <= 6.
pub type Dims = SmallVec<[i64; 6]>;

// ============================================================================
// SECTION: Tensor Specifications
// ============================================================================

/// Which side of the model a tensor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorRole {
    /// Model input.
    Input,
    /// Model output.
    Output,
}

impl TensorRole {
    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for TensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reported tensor specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    /// Tensor name, unique within its list.
    pub name: String,
    /// Reported shape; `-1` marks the batch axis or a variable axis.
    pub shape: Dims,
    /// Element datatype.
    pub datatype: DataType,
}

impl TensorSpec {
    /// Creates a tensor specification.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: &[i64], datatype: DataType) -> Self {
        Self {
            name: name.into(),
            shape: Dims::from_slice(shape),
            datatype,
        }
    }
}

// ============================================================================
// SECTION: Model Contract
// ============================================================================

/// Contract reported by the serving framework for one model.
///
/// # Invariants
/// - `input_formats` has one entry per input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelContract {
    /// Model name as reported.
    pub name: String,
    /// Ordered model inputs.
    pub inputs: Vec<TensorSpec>,
    /// Ordered model outputs.
    pub outputs: Vec<TensorSpec>,
    /// Maximum batch size; `0` means the model takes fixed, unbatched shapes.
    pub max_batch_size: u32,
    /// Normalized layout hint per input.
    pub input_formats: Vec<InputFormat>,
}

impl ModelContract {
    /// Creates a contract with no layout hints.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
        max_batch_size: u32,
    ) -> Self {
        let input_formats = vec![InputFormat::None; inputs.len()];
        Self {
            name: name.into(),
            inputs,
            outputs,
            max_batch_size,
            input_formats,
        }
    }

    /// Returns true when the leading axis of every tensor is the batch axis.
    #[must_use]
    pub const fn is_batched(&self) -> bool {
        self.max_batch_size > 0
    }
}

// ============================================================================
// SECTION: Expected Contract
// ============================================================================

/// Caller expectation for one tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedTensor {
    /// Datatypes the caller accepts for this position.
    pub datatypes: Vec<DataType>,
    /// Expected dims, excluding the batch axis.
    pub dims: Dims,
}

impl ExpectedTensor {
    /// Creates a tensor expectation.
    #[must_use]
    pub fn new(datatypes: &[DataType], dims: &[i64]) -> Self {
        Self {
            datatypes: datatypes.to_vec(),
            dims: Dims::from_slice(dims),
        }
    }

    /// Returns true when `datatype` is in the allowed set.
    #[must_use]
    pub fn allows(&self, datatype: DataType) -> bool {
        self.datatypes.contains(&datatype)
    }

    /// Returns the full shape the model must report.
    #[must_use]
    pub fn reported_shape(&self, batched: bool) -> Dims {
        let mut shape = Dims::new();
        if batched {
            shape.push(VARIABLE_DIM);
        }
        shape.extend_from_slice(&self.dims);
        shape
    }
}

/// Caller-declared contract; the required counts are the list lengths.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpectedContract {
    /// Ordered input expectations.
    pub inputs: Vec<ExpectedTensor>,
    /// Ordered output expectations.
    pub outputs: Vec<ExpectedTensor>,
}

impl ExpectedContract {
    /// Creates an expected contract.
    #[must_use]
    pub const fn new(inputs: Vec<ExpectedTensor>, outputs: Vec<ExpectedTensor>) -> Self {
        Self {
            inputs,
            outputs,
        }
    }

    /// Required number of inputs.
    #[must_use]
    pub const fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Required number of outputs.
    #[must_use]
    pub const fn output_count(&self) -> usize {
        self.outputs.len()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Where a contract count was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractOrigin {
    /// Model metadata document.
    Metadata,
    /// Model configuration document.
    Configuration,
}

impl fmt::Display for ContractOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("model metadata"),
            Self::Configuration => f.write_str("model configuration"),
        }
    }
}

/// Contract validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Every variant names the model and enough context to locate the mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Wrong number of inputs or outputs.
    #[error("expecting {expected} {role}s in {origin} of model '{model}', got {actual}")]
    Count {
        /// Model name.
        model: String,
        /// Tensor role.
        role: TensorRole,
        /// Document the count was read from.
        origin: ContractOrigin,
        /// Required count.
        expected: usize,
        /// Reported count.
        actual: usize,
    },
    /// Reported datatype outside the allowed set.
    #[error(
        "expecting {role} datatype to be in {allowed:?}, model '{model}' {role} '{tensor}' type is {actual}"
    )]
    Datatype {
        /// Model name.
        model: String,
        /// Tensor role.
        role: TensorRole,
        /// Tensor name.
        tensor: String,
        /// Allowed datatype names.
        allowed: Vec<String>,
        /// Reported datatype.
        actual: DataType,
    },
    /// Reported rank differs from the expected rank.
    #[error(
        "expecting {role} '{tensor}' to have {expected} dimensions, but model '{model}' {role} has {actual}"
    )]
    Rank {
        /// Model name.
        model: String,
        /// Tensor role.
        role: TensorRole,
        /// Tensor name.
        tensor: String,
        /// Expected rank including the batch axis.
        expected: usize,
        /// Reported rank.
        actual: usize,
    },
    /// Reported shape differs from the expected shape.
    #[error(
        "expecting {role} '{tensor}' to have shape {expected:?}, but model '{model}' has {actual:?}"
    )]
    Shape {
        /// Model name.
        model: String,
        /// Tensor role.
        role: TensorRole,
        /// Tensor name.
        tensor: String,
        /// Expected shape including the batch placeholder.
        expected: Vec<i64>,
        /// Reported shape.
        actual: Vec<i64>,
    },
    /// Input format in the configuration is not recognized.
    #[error("model '{model}' input '{tensor}' has an unknown format: {detail}")]
    Format {
        /// Model name.
        model: String,
        /// Tensor name.
        tensor: String,
        /// Format error detail.
        detail: String,
    },
    /// Reported maximum batch size is negative or out of range.
    #[error("model '{model}' reports invalid max_batch_size {value}")]
    MaxBatchSize {
        /// Model name.
        model: String,
        /// Reported value.
        value: i64,
    },
}

// crates/serving-contract-core/src/core/documents.rs
// ============================================================================
// Module: Serving Documents
// Description: Model metadata and model configuration documents.
// Purpose: Deserialize the documents fetched from the serving framework and
//          assemble them into a model contract.
// Dependencies: crate::core::{contract, datatype, format}, serde, serde_json
// ============================================================================

//! ## Overview
//! The serving framework describes a model through two documents: metadata
//! (names, datatypes, reported shapes) and configuration (max batch size and
//! per-input layout hints). Protobuf JSON renders 64-bit integers as strings,
//! so integer fields accept both encodings. Zero-valued fields may be omitted
//! entirely and default accordingly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::core::contract::ContractError;
use crate::core::contract::ContractOrigin;
use crate::core::contract::Dims;
use crate::core::contract::ModelContract;
use crate::core::contract::TensorRole;
use crate::core::contract::TensorSpec;
use crate::core::datatype::DataType;
use crate::core::format::InputFormat;
use crate::core::format::RawInputFormat;

// ============================================================================
// SECTION: Metadata Document
// ============================================================================

/// Tensor entry in a metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTensor {
    /// Tensor name.
    pub name: String,
    /// Element datatype.
    pub datatype: DataType,
    /// Reported shape.
    #[serde(deserialize_with = "deserialize_dims")]
    pub shape: Dims,
}

/// Model metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name.
    pub name: String,
    /// Available model versions.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Backend platform label.
    #[serde(default)]
    pub platform: String,
    /// Ordered inputs.
    #[serde(default)]
    pub inputs: Vec<MetadataTensor>,
    /// Ordered outputs.
    #[serde(default)]
    pub outputs: Vec<MetadataTensor>,
}

// ============================================================================
// SECTION: Configuration Document
// ============================================================================

/// Input entry in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInput {
    /// Tensor name.
    pub name: String,
    /// Datatype in configuration spelling.
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Layout hint, by name or code.
    #[serde(default)]
    pub format: Option<RawInputFormat>,
    /// Configured dims, excluding the batch axis.
    #[serde(default, deserialize_with = "deserialize_dims")]
    pub dims: Dims,
}

/// Output entry in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOutput {
    /// Tensor name.
    pub name: String,
    /// Datatype in configuration spelling.
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Configured dims, excluding the batch axis.
    #[serde(default, deserialize_with = "deserialize_dims")]
    pub dims: Dims,
}

/// Model configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default)]
    pub name: String,
    /// Backend platform label.
    #[serde(default)]
    pub platform: String,
    /// Maximum batch size; absent means `0`.
    #[serde(default, deserialize_with = "deserialize_int")]
    pub max_batch_size: i64,
    /// Ordered inputs.
    #[serde(default)]
    pub input: Vec<ConfigInput>,
    /// Ordered outputs.
    #[serde(default)]
    pub output: Vec<ConfigOutput>,
}

/// Wrapper returned by some endpoints: `{"config": {...}}`.
#[derive(Debug, Clone, Deserialize)]
struct ConfigEnvelope {
    /// Wrapped configuration.
    config: ModelConfig,
}

impl ModelConfig {
    /// Parses a configuration document, accepting the bare form and the
    /// `{"config": ...}` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when neither form parses.
    pub fn from_json_value(value: Value) -> Result<Self, serde_json::Error> {
        if value.get("config").is_some_and(Value::is_object) {
            let envelope: ConfigEnvelope = serde_json::from_value(value)?;
            return Ok(envelope.config);
        }
        serde_json::from_value(value)
    }
}

// ============================================================================
// SECTION: Contract Assembly
// ============================================================================

impl ModelContract {
    /// Assembles a contract from metadata and configuration documents.
    ///
    /// Names, datatypes, and shapes come from metadata; the batch size and
    /// input formats come from configuration. The configuration must declare
    /// as many inputs and outputs as the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when the documents disagree on counts, the
    /// batch size is invalid, or an input format is not recognized.
    pub fn from_documents(
        metadata: &ModelMetadata,
        config: &ModelConfig,
    ) -> Result<Self, ContractError> {
        let model = metadata.name.clone();
        if config.input.len() != metadata.inputs.len() {
            return Err(ContractError::Count {
                model,
                role: TensorRole::Input,
                origin: ContractOrigin::Configuration,
                expected: metadata.inputs.len(),
                actual: config.input.len(),
            });
        }
        if config.output.len() != metadata.outputs.len() {
            return Err(ContractError::Count {
                model,
                role: TensorRole::Output,
                origin: ContractOrigin::Configuration,
                expected: metadata.outputs.len(),
                actual: config.output.len(),
            });
        }
        let max_batch_size =
            u32::try_from(config.max_batch_size).map_err(|_| ContractError::MaxBatchSize {
                model: model.clone(),
                value: config.max_batch_size,
            })?;

        let mut input_formats = Vec::with_capacity(config.input.len());
        for (meta, input) in metadata.inputs.iter().zip(&config.input) {
            let format = match &input.format {
                None => InputFormat::None,
                Some(raw) => raw.normalize().map_err(|err| ContractError::Format {
                    model: model.clone(),
                    tensor: meta.name.clone(),
                    detail: err.to_string(),
                })?,
            };
            input_formats.push(format);
        }

        Ok(Self {
            name: model,
            inputs: metadata.inputs.iter().map(to_spec).collect(),
            outputs: metadata.outputs.iter().map(to_spec).collect(),
            max_batch_size,
            input_formats,
        })
    }
}

/// Converts a metadata tensor into a tensor specification.
fn to_spec(tensor: &MetadataTensor) -> TensorSpec {
    TensorSpec {
        name: tensor.name.clone(),
        shape: tensor.shape.clone(),
        datatype: tensor.datatype,
    }
}

// ============================================================================
// SECTION: Lenient Integers
// ============================================================================

/// Integer encoded as a JSON number or a decimal string.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInt {
    /// JSON number.
    Number(i64),
    /// Decimal string (protobuf JSON int64 rendering).
    Text(String),
}

impl LenientInt {
    /// Resolves the integer value.
    fn resolve<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            Self::Number(value) => Ok(value),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid integer: {text}"))),
        }
    }
}

/// Deserializes an integer from a number or a decimal string.
fn deserialize_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    LenientInt::deserialize(deserializer)?.resolve()
}

/// Deserializes a dims list whose entries are numbers or decimal strings.
fn deserialize_dims<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Dims, D::Error> {
    let raw = Vec::<LenientInt>::deserialize(deserializer)?;
    raw.into_iter().map(LenientInt::resolve).collect()
}

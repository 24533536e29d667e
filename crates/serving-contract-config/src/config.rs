// crates/serving-contract-config/src/config.rs
// ============================================================================
// Module: Serving Contract Configuration
// Description: Configuration loading and validation for contract clients.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serving-contract-core, serde, toml, tracing
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected. The expected tensor lists are positional: the
//! first `[[inputs]]` entry describes the model's first input, and so on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serving_contract_core::CastPolicy;
use serving_contract_core::DataType;
use serving_contract_core::ExpectedContract;
use serving_contract_core::ExpectedTensor;
use serving_contract_core::ModelRef;
use serving_contract_core::VARIABLE_DIM;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "serving-contract.toml";
/// Environment variable overriding the configuration path.
pub(crate) const CONFIG_ENV_VAR: &str = "SERVING_CONTRACT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of expected inputs or outputs.
pub(crate) const MAX_TENSORS: usize = 64;
/// Maximum rank of an expected tensor.
pub(crate) const MAX_RANK: usize = 16;
/// Maximum length of model names, versions, and server URLs.
pub(crate) const MAX_NAME_LENGTH: usize = 256;
/// Default inference server address.
const DEFAULT_SERVER_URL: &str = "localhost:8000";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Serving contract client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Inference server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Target model.
    pub model: ModelSection,
    /// Batch slicing settings.
    #[serde(default)]
    pub batching: BatchingConfig,
    /// Expected inputs in model order.
    #[serde(default)]
    pub inputs: Vec<TensorExpectation>,
    /// Expected outputs in model order.
    #[serde(default)]
    pub outputs: Vec<TensorExpectation>,
}

impl ClientConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config = Self::from_toml_str(content)?;
        debug!(
            path = %resolved.display(),
            model = %config.model.name,
            inputs = config.inputs.len(),
            outputs = config.outputs.len(),
            "loaded client config"
        );
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.model.validate()?;
        validate_tensor_list("inputs", &self.inputs)?;
        validate_tensor_list("outputs", &self.outputs)?;
        Ok(())
    }

    /// Returns the caller expectations for contract validation.
    #[must_use]
    pub fn expected_contract(&self) -> ExpectedContract {
        ExpectedContract::new(
            self.inputs.iter().map(TensorExpectation::to_expected).collect(),
            self.outputs.iter().map(TensorExpectation::to_expected).collect(),
        )
    }

    /// Returns the configured model reference.
    #[must_use]
    pub fn model_ref(&self) -> ModelRef {
        let model = ModelRef::new(self.model.name.clone());
        match &self.model.version {
            Some(version) => model.with_version(version.clone()),
            None => model,
        }
    }

    /// Returns the configured cast policy.
    #[must_use]
    pub const fn cast_policy(&self) -> CastPolicy {
        self.batching.cast_policy
    }
}

/// Inference server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Server address in `host:port` form.
    #[serde(default = "default_server_url")]
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

impl ServerConfig {
    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("server.url", &self.url)
    }
}

/// Target model selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    /// Model name as registered with the server.
    pub name: String,
    /// Model version; the server's default when absent.
    #[serde(default)]
    pub version: Option<String>,
}

impl ModelSection {
    /// Validates model selection.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("model.name", &self.name)?;
        if let Some(version) = &self.version {
            validate_name("model.version", version)?;
        }
        Ok(())
    }
}

/// Batch slicing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchingConfig {
    /// Conversion policy for casting slices to declared datatypes.
    #[serde(default)]
    pub cast_policy: CastPolicy,
}

/// Caller expectation for one tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TensorExpectation {
    /// Accepted datatypes.
    pub datatypes: Vec<DataType>,
    /// Expected dims, excluding the batch axis.
    pub dims: Vec<i64>,
}

impl TensorExpectation {
    /// Converts into the core expectation type.
    fn to_expected(&self) -> ExpectedTensor {
        ExpectedTensor::new(&self.datatypes, &self.dims)
    }

    /// Validates one expectation at `position` in `field`.
    fn validate(&self, field: &str, position: usize) -> Result<(), ConfigError> {
        if self.datatypes.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "{field}[{position}].datatypes must be non-empty"
            )));
        }
        if self.dims.len() > MAX_RANK {
            return Err(ConfigError::Invalid(format!(
                "{field}[{position}].dims exceeds max rank {MAX_RANK}"
            )));
        }
        if let Some(dim) = self.dims.iter().find(|dim| **dim != VARIABLE_DIM && **dim <= 0) {
            return Err(ConfigError::Invalid(format!(
                "{field}[{position}].dims has invalid dim {dim}; use -1 or a positive size"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the default server address.
fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a required short string field.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates an expected tensor list.
fn validate_tensor_list(field: &str, tensors: &[TensorExpectation]) -> Result<(), ConfigError> {
    if tensors.len() > MAX_TENSORS {
        return Err(ConfigError::Invalid(format!("{field} exceeds max of {MAX_TENSORS} entries")));
    }
    for (position, tensor) in tensors.iter().enumerate() {
        tensor.validate(field, position)?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use super::*;

    #[test]
    fn validate_name_rejects_whitespace_only() {
        let result = validate_name("model.name", "   ");
        assert!(result.unwrap_err().to_string().contains("model.name must be non-empty"));
    }

    #[test]
    fn validate_name_rejects_overlong_value() {
        let result = validate_name("server.url", &"a".repeat(MAX_NAME_LENGTH + 1));
        assert!(result.unwrap_err().to_string().contains("server.url exceeds max length"));
    }

    #[test]
    fn validate_path_accepts_relative_path() {
        assert!(validate_path(Path::new("./configs/serving-contract.toml")).is_ok());
    }

    #[test]
    fn explicit_path_wins_resolution() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }
}

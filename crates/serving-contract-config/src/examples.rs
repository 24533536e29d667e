// crates/serving-contract-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for serving contract configuration. The output is
//! deterministic and always passes [`crate::ClientConfig::validate`].

/// Returns a canonical example `serving-contract.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Inference server address.
[server]
url = "localhost:8000"

# Model to validate. Omit `version` to use the server default.
[model]
name = "resnet_inference"
version = "1"

# `checked` rejects values that do not survive a cast; `lossy` wraps and
# truncates like a numeric `as` conversion.
[batching]
cast_policy = "checked"

# Expected tensors, in model order. Dims exclude the batch axis; -1 is a
# variable-size dim and must also be -1 on the server.
[[inputs]]
datatypes = ["FP32"]
dims = [3, 224, 224]

[[outputs]]
datatypes = ["FP32", "FP16"]
dims = [1000]
"#,
    )
}

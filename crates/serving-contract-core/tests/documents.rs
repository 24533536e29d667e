// crates/serving-contract-core/tests/documents.rs
// ============================================================================
// Module: Serving Document Tests
// Description: Parsing of metadata/config documents and contract assembly.
// Purpose: Ensure both JSON renderings parse and document mismatches fail.
// Dependencies: serving-contract-core, serde_json
// ============================================================================

//! Document parsing and contract assembly tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use serde_json::json;
use serving_contract_core::ContractError;
use serving_contract_core::ContractOrigin;
use serving_contract_core::DataType;
use serving_contract_core::InputFormat;
use serving_contract_core::ModelConfig;
use serving_contract_core::ModelContract;
use serving_contract_core::ModelMetadata;
use serving_contract_core::TensorRole;

fn metadata() -> ModelMetadata {
    serde_json::from_value(json!({
        "name": "resnet_inference",
        "versions": ["1"],
        "platform": "onnxruntime_onnx",
        "inputs": [{"name": "input", "datatype": "FP32", "shape": [-1, 3, 224, 224]}],
        "outputs": [{"name": "embedding", "datatype": "FP32", "shape": [-1, 1000]}]
    }))
    .unwrap()
}

#[test]
fn metadata_and_config_assemble_into_contract() {
    let config = ModelConfig::from_json_value(json!({
        "name": "resnet_inference",
        "max_batch_size": 8,
        "input": [{"name": "input", "data_type": "TYPE_FP32", "format": "FORMAT_NCHW", "dims": [3, 224, 224]}],
        "output": [{"name": "embedding", "data_type": "TYPE_FP32", "dims": [1000]}]
    }))
    .unwrap();
    let contract = ModelContract::from_documents(&metadata(), &config).unwrap();
    assert_eq!(contract.name, "resnet_inference");
    assert_eq!(contract.max_batch_size, 8);
    assert_eq!(contract.inputs[0].shape.as_slice(), [-1, 3, 224, 224]);
    assert_eq!(contract.inputs[0].datatype, DataType::Fp32);
    assert_eq!(contract.outputs[0].name, "embedding");
    assert_eq!(contract.input_formats, vec![InputFormat::Nchw]);
}

#[test]
fn protobuf_json_rendering_is_accepted() {
    let metadata: ModelMetadata = serde_json::from_value(json!({
        "name": "resnet_inference",
        "inputs": [{"name": "input", "datatype": "FP32", "shape": ["-1", "3", "224", "224"]}],
        "outputs": [{"name": "embedding", "datatype": "FP32", "shape": ["-1", "1000"]}]
    }))
    .unwrap();
    let config = ModelConfig::from_json_value(json!({
        "config": {
            "name": "resnet_inference",
            "max_batch_size": "16",
            "input": [{"name": "input", "data_type": "TYPE_FP32", "format": 2, "dims": ["3", "224", "224"]}],
            "output": [{"name": "embedding", "data_type": "TYPE_FP32", "dims": ["1000"]}]
        }
    }))
    .unwrap();
    let contract = ModelContract::from_documents(&metadata, &config).unwrap();
    assert_eq!(contract.max_batch_size, 16);
    assert_eq!(contract.inputs[0].shape.as_slice(), [-1, 3, 224, 224]);
    assert_eq!(contract.input_formats, vec![InputFormat::Nchw]);
}

#[test]
fn omitted_zero_fields_default() {
    let config = ModelConfig::from_json_value(json!({
        "input": [{"name": "input"}],
        "output": [{"name": "embedding"}]
    }))
    .unwrap();
    assert_eq!(config.max_batch_size, 0);
    let contract = ModelContract::from_documents(&metadata(), &config).unwrap();
    assert_eq!(contract.max_batch_size, 0);
    assert_eq!(contract.input_formats, vec![InputFormat::None]);
}

#[test]
fn config_count_must_match_metadata() {
    let config = ModelConfig::from_json_value(json!({
        "max_batch_size": 8,
        "input": [{"name": "input"}, {"name": "extra"}],
        "output": [{"name": "embedding"}]
    }))
    .unwrap();
    let err = ModelContract::from_documents(&metadata(), &config).unwrap_err();
    assert_eq!(
        err,
        ContractError::Count {
            model: "resnet_inference".to_string(),
            role: TensorRole::Input,
            origin: ContractOrigin::Configuration,
            expected: 1,
            actual: 2,
        }
    );
    assert!(err.to_string().contains("model configuration"));
}

#[test]
fn unknown_format_is_rejected() {
    let config = ModelConfig::from_json_value(json!({
        "input": [{"name": "input", "format": "FORMAT_NDHWC"}],
        "output": [{"name": "embedding"}]
    }))
    .unwrap();
    let err = ModelContract::from_documents(&metadata(), &config).unwrap_err();
    assert!(matches!(err, ContractError::Format { ref tensor, .. } if tensor == "input"));
}

#[test]
fn negative_batch_size_is_rejected() {
    let config = ModelConfig::from_json_value(json!({
        "max_batch_size": -4,
        "input": [{"name": "input"}],
        "output": [{"name": "embedding"}]
    }))
    .unwrap();
    let err = ModelContract::from_documents(&metadata(), &config).unwrap_err();
    assert!(matches!(err, ContractError::MaxBatchSize { value: -4, .. }));
}

#[test]
fn datatype_names_parse_in_both_spellings() {
    assert_eq!("FP16".parse::<DataType>().unwrap(), DataType::Fp16);
    assert_eq!("TYPE_FP16".parse::<DataType>().unwrap(), DataType::Fp16);
    assert_eq!("TYPE_STRING".parse::<DataType>().unwrap(), DataType::Bytes);
    assert_eq!("BYTES".parse::<DataType>().unwrap(), DataType::Bytes);
    assert!("FLOAT".parse::<DataType>().is_err());
    for kind in DataType::ALL {
        assert_eq!(kind.as_str().parse::<DataType>().unwrap(), kind);
        assert_eq!(kind.config_name().parse::<DataType>().unwrap(), kind);
    }
    assert_eq!(serde_json::to_value(DataType::Bf16).unwrap(), json!("BF16"));
}

#[test]
fn unknown_datatype_fails_document_parse() {
    let result = serde_json::from_value::<ModelMetadata>(json!({
        "name": "m",
        "inputs": [{"name": "x", "datatype": "COMPLEX64", "shape": [1]}]
    }));
    assert!(result.is_err());
}

// crates/serving-contract-core/tests/contract_validation.rs
// ============================================================================
// Module: Contract Validation Tests
// Description: Acceptance and rejection of reported model contracts.
// Purpose: Ensure client construction fails on the first count, datatype,
//          rank, or shape mismatch and succeeds on exact matches.
// Dependencies: serving-contract-core
// ============================================================================

//! Contract validation tests for [`ModelClient::new`].

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

use serving_contract_core::CastPolicy;
use serving_contract_core::ContractError;
use serving_contract_core::ContractOrigin;
use serving_contract_core::DataType;
use serving_contract_core::ExpectedContract;
use serving_contract_core::ExpectedTensor;
use serving_contract_core::InputFormat;
use serving_contract_core::ModelClient;
use serving_contract_core::ModelContract;
use serving_contract_core::TensorRole;
use serving_contract_core::TensorSpec;

fn resnet_expected() -> ExpectedContract {
    ExpectedContract::new(
        vec![ExpectedTensor::new(&[DataType::Fp32], &[3, 224, 224])],
        vec![ExpectedTensor::new(&[DataType::Fp32, DataType::Fp16], &[1000])],
    )
}

fn resnet_contract(input_shape: &[i64], max_batch_size: u32) -> ModelContract {
    ModelContract::new(
        "resnet_inference",
        vec![TensorSpec::new("input", input_shape, DataType::Fp32)],
        vec![TensorSpec::new("embedding", &[-1, 1000], DataType::Fp32)],
        max_batch_size,
    )
}

#[test]
fn exact_batched_contract_constructs() {
    let client = ModelClient::new(resnet_contract(&[-1, 3, 224, 224], 8), &resnet_expected())
        .expect("contract should validate");
    assert_eq!(client.model_name(), "resnet_inference");
    assert_eq!(client.max_batch_size(), 8);
    assert_eq!(client.input_names(), ["input".to_string()]);
    assert_eq!(client.input_datatypes(), [DataType::Fp32]);
    assert_eq!(client.input_shapes()[0].as_slice(), [-1, 3, 224, 224]);
    assert_eq!(client.input_formats(), [InputFormat::None]);
    assert_eq!(client.output_names(), ["embedding".to_string()]);
    assert_eq!(client.cast_policy(), CastPolicy::Checked);
}

#[test]
fn unbatched_contract_compares_without_placeholder() {
    let contract = ModelContract::new(
        "fixed",
        vec![TensorSpec::new("input", &[3, 224, 224], DataType::Fp32)],
        vec![TensorSpec::new("embedding", &[1000], DataType::Fp16)],
        0,
    );
    let client = ModelClient::new(contract, &resnet_expected()).unwrap();
    assert_eq!(client.max_batch_size(), 0);
}

#[test]
fn off_by_one_dimension_is_a_shape_error() {
    let err = ModelClient::new(resnet_contract(&[-1, 3, 224, 225], 8), &resnet_expected())
        .unwrap_err();
    assert_eq!(
        err,
        ContractError::Shape {
            model: "resnet_inference".to_string(),
            role: TensorRole::Input,
            tensor: "input".to_string(),
            expected: vec![-1, 3, 224, 224],
            actual: vec![-1, 3, 224, 225],
        }
    );
    assert!(err.to_string().contains("'input'"));
}

#[test]
fn missing_batch_axis_is_a_rank_error() {
    let err =
        ModelClient::new(resnet_contract(&[3, 224, 224], 8), &resnet_expected()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Rank {
            role: TensorRole::Input,
            expected: 4,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn fixed_batch_axis_is_a_shape_error() {
    let err =
        ModelClient::new(resnet_contract(&[8, 3, 224, 224], 8), &resnet_expected()).unwrap_err();
    assert!(matches!(err, ContractError::Shape { .. }));
}

#[test]
fn datatype_outside_allowed_set_is_rejected() {
    let mut contract = resnet_contract(&[-1, 3, 224, 224], 8);
    contract.inputs[0].datatype = DataType::Uint8;
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert_eq!(
        err,
        ContractError::Datatype {
            model: "resnet_inference".to_string(),
            role: TensorRole::Input,
            tensor: "input".to_string(),
            allowed: vec!["FP32".to_string()],
            actual: DataType::Uint8,
        }
    );
}

#[test]
fn output_datatype_is_checked_against_its_own_set() {
    let mut contract = resnet_contract(&[-1, 3, 224, 224], 8);
    contract.outputs[0].datatype = DataType::Fp16;
    assert!(ModelClient::new(contract.clone(), &resnet_expected()).is_ok());

    contract.outputs[0].datatype = DataType::Int64;
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Datatype {
            role: TensorRole::Output,
            ..
        }
    ));
}

#[test]
fn output_shape_mismatch_is_rejected() {
    let mut contract = resnet_contract(&[-1, 3, 224, 224], 8);
    contract.outputs[0] = TensorSpec::new("embedding", &[-1, 512], DataType::Fp32);
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Shape {
            role: TensorRole::Output,
            ..
        }
    ));
}

#[test]
fn wrong_input_count_is_rejected_before_tensor_checks() {
    let mut contract = resnet_contract(&[-1, 3, 224, 225], 8);
    contract.inputs.push(TensorSpec::new("timestamp", &[-1, 1], DataType::Int64));
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert_eq!(
        err,
        ContractError::Count {
            model: "resnet_inference".to_string(),
            role: TensorRole::Input,
            origin: ContractOrigin::Metadata,
            expected: 1,
            actual: 2,
        }
    );
}

#[test]
fn wrong_output_count_is_rejected() {
    let mut contract = resnet_contract(&[-1, 3, 224, 224], 8);
    contract.outputs.clear();
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Count {
            role: TensorRole::Output,
            expected: 1,
            actual: 0,
            ..
        }
    ));
}

#[test]
fn inputs_are_checked_before_outputs() {
    let mut contract = resnet_contract(&[-1, 3, 224, 225], 8);
    contract.outputs[0].datatype = DataType::Bool;
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Shape {
            role: TensorRole::Input,
            ..
        }
    ));
}

#[test]
fn datatype_is_checked_before_shape() {
    let mut contract = resnet_contract(&[-1, 1], 8);
    contract.inputs[0].datatype = DataType::Bytes;
    let err = ModelClient::new(contract, &resnet_expected()).unwrap_err();
    assert!(matches!(err, ContractError::Datatype { .. }));
}

#[test]
fn variable_dims_compare_literally() {
    let expected = ExpectedContract::new(
        vec![ExpectedTensor::new(&[DataType::Int64], &[-1])],
        vec![ExpectedTensor::new(&[DataType::Fp32], &[-1, 768])],
    );
    let contract = ModelContract::new(
        "encoder",
        vec![TensorSpec::new("tokens", &[-1, -1], DataType::Int64)],
        vec![TensorSpec::new("hidden", &[-1, -1, 768], DataType::Fp32)],
        4,
    );
    assert!(ModelClient::new(contract.clone(), &expected).is_ok());

    let mut fixed = contract;
    fixed.inputs[0].shape[1] = 128;
    assert!(matches!(ModelClient::new(fixed, &expected), Err(ContractError::Shape { .. })));
}

#[test]
fn formats_and_policy_pass_through() {
    let mut contract = resnet_contract(&[-1, 3, 224, 224], 8);
    contract.input_formats = vec![InputFormat::Nchw];
    let client = ModelClient::new(contract, &resnet_expected())
        .unwrap()
        .with_cast_policy(CastPolicy::Lossy);
    assert_eq!(client.input_formats(), [InputFormat::Nchw]);
    assert_eq!(client.cast_policy(), CastPolicy::Lossy);
    assert_eq!(client.requested_outputs().len(), 1);
}

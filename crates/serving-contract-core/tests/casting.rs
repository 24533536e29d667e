// crates/serving-contract-core/tests/casting.rs
// ============================================================================
// Module: Host Tensor Casting Tests
// Description: Datatype conversion policies, slicing, and concatenation.
// Purpose: Ensure checked casts refuse lossy values and lossy casts follow
//          numeric conversion semantics.
// Dependencies: serving-contract-core, half, ndarray
// ============================================================================

//! Host tensor casting and concatenation tests.

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

use half::f16;
use ndarray::ArrayD;
use ndarray::IxDyn;
use serving_contract_core::CastError;
use serving_contract_core::CastPolicy;
use serving_contract_core::ConcatError;
use serving_contract_core::DataType;
use serving_contract_core::HostTensor;

fn vector<T>(values: Vec<T>) -> HostTensor
where
    HostTensor: From<ArrayD<T>>,
{
    let len = values.len();
    HostTensor::from(ArrayD::from_shape_vec(IxDyn(&[len]), values).unwrap())
}

#[test]
fn same_datatype_cast_is_identity() {
    let tensor = vector(vec![1.5_f32, -2.0]);
    assert_eq!(tensor.cast(DataType::Fp32, CastPolicy::Checked).unwrap(), tensor);
}

#[test]
fn widening_integer_cast_preserves_values() {
    let cast = vector(vec![-3_i8, 0, 127]).cast(DataType::Int64, CastPolicy::Checked).unwrap();
    assert_eq!(cast, vector(vec![-3_i64, 0, 127]));
}

#[test]
fn checked_cast_rejects_out_of_range_integers() {
    let err = vector(vec![1_i32, 300]).cast(DataType::Uint8, CastPolicy::Checked).unwrap_err();
    assert_eq!(
        err,
        CastError::NotRepresentable {
            to: DataType::Uint8,
            value: "300".to_string(),
        }
    );
    let err = vector(vec![-1_i64]).cast(DataType::Uint32, CastPolicy::Checked).unwrap_err();
    assert!(matches!(err, CastError::NotRepresentable { .. }));
}

#[test]
fn lossy_cast_wraps_integers() {
    let cast = vector(vec![1_i32, 300, -1]).cast(DataType::Uint8, CastPolicy::Lossy).unwrap();
    assert_eq!(cast, vector(vec![1_u8, 44, 255]));
}

#[test]
fn checked_cast_rejects_fractional_floats_into_integers() {
    let err = vector(vec![2.0_f64, 2.5]).cast(DataType::Int32, CastPolicy::Checked).unwrap_err();
    assert!(matches!(err, CastError::NotRepresentable { to: DataType::Int32, .. }));
    let whole = vector(vec![2.0_f64, -7.0]).cast(DataType::Int32, CastPolicy::Checked).unwrap();
    assert_eq!(whole, vector(vec![2_i32, -7]));
}

#[test]
fn lossy_cast_truncates_and_saturates_floats() {
    let cast = vector(vec![2.9_f32, -1.5, 1.0e10, f32::NAN])
        .cast(DataType::Int16, CastPolicy::Lossy)
        .unwrap();
    assert_eq!(cast, vector(vec![2_i16, -1, i16::MAX, 0]));
}

#[test]
fn float_narrowing_rounds_but_rejects_overflow() {
    let cast = vector(vec![0.1_f32, 1.0]).cast(DataType::Fp16, CastPolicy::Checked).unwrap();
    assert_eq!(cast, vector(vec![f16::from_f32(0.1), f16::ONE]));

    let err = vector(vec![1.0e6_f32]).cast(DataType::Fp16, CastPolicy::Checked).unwrap_err();
    assert!(matches!(err, CastError::NotRepresentable { to: DataType::Fp16, .. }));

    let lossy = vector(vec![1.0e6_f32]).cast(DataType::Fp16, CastPolicy::Lossy).unwrap();
    assert_eq!(lossy, vector(vec![f16::INFINITY]));
}

#[test]
fn bool_casts_follow_policy() {
    let cast = vector(vec![0_u8, 1]).cast(DataType::Bool, CastPolicy::Checked).unwrap();
    assert_eq!(cast, vector(vec![false, true]));
    assert!(vector(vec![2_u8]).cast(DataType::Bool, CastPolicy::Checked).is_err());
    let lossy = vector(vec![2_u8, 0]).cast(DataType::Bool, CastPolicy::Lossy).unwrap();
    assert_eq!(lossy, vector(vec![true, false]));
    let numeric = vector(vec![true, false]).cast(DataType::Fp32, CastPolicy::Checked).unwrap();
    assert_eq!(numeric, vector(vec![1.0_f32, 0.0]));
}

#[test]
fn bytes_never_convert_to_numbers() {
    let bytes = vector(vec![b"a".to_vec()]);
    assert_eq!(
        bytes.cast(DataType::Fp32, CastPolicy::Lossy).unwrap_err(),
        CastError::Unsupported {
            from: DataType::Bytes,
            to: DataType::Fp32,
        }
    );
    assert_eq!(
        vector(vec![1_i32]).cast(DataType::Bytes, CastPolicy::Lossy).unwrap_err(),
        CastError::Unsupported {
            from: DataType::Int32,
            to: DataType::Bytes,
        }
    );
    assert_eq!(bytes.cast(DataType::Bytes, CastPolicy::Checked).unwrap(), bytes);
}

#[test]
fn cast_preserves_shape() {
    let tensor = HostTensor::from(
        ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1_u16, 2, 3, 4, 5, 6]).unwrap(),
    );
    let cast = tensor.cast(DataType::Fp64, CastPolicy::Checked).unwrap();
    assert_eq!(cast.shape(), [2, 3]);
    assert_eq!(cast.datatype(), DataType::Fp64);
}

#[test]
fn slice_leading_clamps_to_length() {
    let tensor = vector(vec![10_i32, 20, 30]);
    assert_eq!(tensor.slice_leading(1..9), vector(vec![20_i32, 30]));
    assert!(tensor.slice_leading(5..9).is_empty());
}

#[test]
fn concatenate_rejects_bad_parts() {
    assert_eq!(HostTensor::concatenate(&[]).unwrap_err(), ConcatError::Empty);
    let err = HostTensor::concatenate(&[vector(vec![1_i32]), vector(vec![1.0_f32])]).unwrap_err();
    assert_eq!(
        err,
        ConcatError::MixedDatatypes {
            first: DataType::Int32,
            other: DataType::Fp32,
        }
    );
    let wide = HostTensor::from(ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![1_i32, 2]).unwrap());
    let narrow =
        HostTensor::from(ArrayD::from_shape_vec(IxDyn(&[1, 3]), vec![1_i32, 2, 3]).unwrap());
    assert!(matches!(HostTensor::concatenate(&[wide, narrow]), Err(ConcatError::Shape(_))));
}

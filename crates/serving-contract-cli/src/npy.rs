// crates/serving-contract-cli/src/npy.rs
// ============================================================================
// Module: NPY Input Decoding
// Description: Decodes `.npy` payloads into host tensors.
// Purpose: Let the CLI feed saved NumPy arrays to the batch generator.
// Dependencies: half, ndarray, npyz, serving-contract-core, thiserror
// ============================================================================

//! ## Overview
//! Decodes a single `.npy` array into a [`HostTensor`], dispatching on the
//! header's type character and element size. Fortran-ordered arrays keep
//! their logical shape. Record, complex, datetime, and unicode arrays are
//! rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use half::f16;
use ndarray::ArrayD;
use ndarray::ShapeBuilder;
use npyz::DType;
use npyz::NpyFile;
use npyz::Order;
use npyz::TypeChar;
use serving_contract_core::HostTensor;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `.npy` decoding errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub(crate) enum NpyError {
    /// The header or payload could not be read.
    #[error("invalid npy data: {0}")]
    Read(String),
    /// The element type has no host tensor counterpart.
    #[error("unsupported npy dtype {0}")]
    Unsupported(String),
    /// The payload does not fill the declared shape.
    #[error("npy shape error: {0}")]
    Shape(String),
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes an in-memory `.npy` payload.
pub(crate) fn decode_npy(bytes: &[u8]) -> Result<HostTensor, NpyError> {
    let file = NpyFile::new(bytes).map_err(|err| NpyError::Read(err.to_string()))?;
    let DType::Plain(type_str) = file.dtype() else {
        return Err(NpyError::Unsupported(file.dtype().descr()));
    };
    let shape = file
        .shape()
        .iter()
        .map(|dim| {
            usize::try_from(*dim).map_err(|_| NpyError::Shape(format!("dim {dim} too large")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let fortran = file.order() == Order::Fortran;
    match (type_str.type_char(), type_str.size_field()) {
        (TypeChar::Bool, 1) => read_array::<bool>(file, shape, fortran),
        (TypeChar::Uint, 1) => read_array::<u8>(file, shape, fortran),
        (TypeChar::Uint, 2) => read_array::<u16>(file, shape, fortran),
        (TypeChar::Uint, 4) => read_array::<u32>(file, shape, fortran),
        (TypeChar::Uint, 8) => read_array::<u64>(file, shape, fortran),
        (TypeChar::Int, 1) => read_array::<i8>(file, shape, fortran),
        (TypeChar::Int, 2) => read_array::<i16>(file, shape, fortran),
        (TypeChar::Int, 4) => read_array::<i32>(file, shape, fortran),
        (TypeChar::Int, 8) => read_array::<i64>(file, shape, fortran),
        (TypeChar::Float, 2) => read_array::<f16>(file, shape, fortran),
        (TypeChar::Float, 4) => read_array::<f32>(file, shape, fortran),
        (TypeChar::Float, 8) => read_array::<f64>(file, shape, fortran),
        (TypeChar::ByteStr, _) => read_array::<Vec<u8>>(file, shape, fortran),
        _ => Err(NpyError::Unsupported(type_str.to_string())),
    }
}

/// Reads every element and shapes the result.
fn read_array<T>(
    file: NpyFile<&[u8]>,
    shape: Vec<usize>,
    fortran: bool,
) -> Result<HostTensor, NpyError>
where
    T: npyz::Deserialize,
    HostTensor: From<ArrayD<T>>,
{
    let data = file.into_vec::<T>().map_err(|err| NpyError::Read(err.to_string()))?;
    let array = ArrayD::from_shape_vec(shape.set_f(fortran), data)
        .map_err(|err| NpyError::Shape(err.to_string()))?;
    Ok(HostTensor::from(array))
}

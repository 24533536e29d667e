// crates/serving-contract-core/src/core/tensor.rs
// ============================================================================
// Module: Host Tensors
// Description: Typed n-dimensional host arrays and datatype casting.
// Purpose: Hold caller input data, slice it along the batch axis, and convert
//          it to the datatype declared by the model.
// Dependencies: crate::core::datatype, half, ndarray, serde, thiserror
// ============================================================================

//! ## Overview
//! [`HostTensor`] wraps an [`ndarray::ArrayD`] for each element kind the
//! serving framework understands. Casting goes through a small scalar
//! intermediate so every source/target pair shares one conversion path.
//!
//! Casting behavior is selected by [`CastPolicy`]:
//! - `Checked` rejects values that cannot be represented in the target kind
//!   (out of range, fractional into integer, overflow to infinity). Float
//!   narrowing that only rounds is accepted.
//! - `Lossy` follows `as` conversion semantics: integers wrap, floats saturate
//!   into integers, NaN becomes zero.
//!
//! `BYTES` never converts to or from a numeric kind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ops::Range;

use half::bf16;
use half::f16;
use ndarray::ArrayD;
use ndarray::ArrayViewD;
use ndarray::Axis;
use ndarray::IxDyn;
use ndarray::Slice;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::datatype::DataType;

// ============================================================================
// SECTION: Cast Policy
// ============================================================================

/// Value conversion policy applied when casting to a declared datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastPolicy {
    /// Reject values that do not survive the conversion.
    #[default]
    Checked,
    /// Convert with `as` semantics, silently wrapping or truncating.
    Lossy,
}

/// Casting errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// No conversion exists between the two kinds.
    #[error("cannot cast {from} to {to}")]
    Unsupported {
        /// Source datatype.
        from: DataType,
        /// Target datatype.
        to: DataType,
    },
    /// A value cannot be represented in the target kind.
    #[error("value {value} is not representable as {to}")]
    NotRepresentable {
        /// Target datatype.
        to: DataType,
        /// Offending value rendered as text.
        value: String,
    },
    /// The converted buffer could not be shaped into an array.
    #[error("cast layout error: {0}")]
    Layout(String),
}

/// Concatenation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConcatError {
    /// No parts were supplied.
    #[error("nothing to concatenate")]
    Empty,
    /// Parts have different datatypes.
    #[error("cannot concatenate {first} with {other}")]
    MixedDatatypes {
        /// Datatype of the first part.
        first: DataType,
        /// First mismatching datatype.
        other: DataType,
    },
    /// Parts disagree on trailing dims or are scalars.
    #[error("concatenate shape error: {0}")]
    Shape(String),
}

// ============================================================================
// SECTION: Scalar Intermediate
// ============================================================================

/// Widened scalar used as the common conversion currency.
#[derive(Debug, Clone, Copy)]
enum Scalar {
    /// Boolean value.
    Bool(bool),
    /// Any integer value.
    Int(i128),
    /// Any floating point value.
    Float(f64),
}

impl Scalar {
    /// Builds a representability error for `to`.
    fn reject(self, to: DataType) -> CastError {
        let value = match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
        };
        CastError::NotRepresentable {
            to,
            value,
        }
    }
}

/// Numeric element kinds that can be cast through [`Scalar`].
trait Element: Clone + Sized {
    /// Datatype tag for the element kind.
    const DATATYPE: DataType;
    /// Widens the element.
    fn widen(&self) -> Scalar;
    /// Narrows a scalar into the element kind.
    fn narrow(scalar: Scalar, policy: CastPolicy) -> Result<Self, CastError>;
    /// Wraps an array of this kind.
    fn wrap(array: ArrayD<Self>) -> HostTensor;
}

impl Element for bool {
    const DATATYPE: DataType = DataType::Bool;

    fn widen(&self) -> Scalar {
        Scalar::Bool(*self)
    }

    fn narrow(scalar: Scalar, policy: CastPolicy) -> Result<Self, CastError> {
        match (scalar, policy) {
            (Scalar::Bool(value), _) => Ok(value),
            (Scalar::Int(value), CastPolicy::Lossy) => Ok(value != 0),
            (Scalar::Float(value), CastPolicy::Lossy) => Ok(value != 0.0),
            (Scalar::Int(0), CastPolicy::Checked) => Ok(false),
            (Scalar::Int(1), CastPolicy::Checked) => Ok(true),
            (Scalar::Float(value), CastPolicy::Checked) if value == 0.0 => Ok(false),
            (Scalar::Float(value), CastPolicy::Checked) if value == 1.0 => Ok(true),
            (other, CastPolicy::Checked) => Err(other.reject(Self::DATATYPE)),
        }
    }

    fn wrap(array: ArrayD<Self>) -> HostTensor {
        HostTensor::Bool(array)
    }
}

/// Implements [`Element`] for primitive integer kinds.
macro_rules! int_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DATATYPE: DataType = DataType::$variant;

                fn widen(&self) -> Scalar {
                    Scalar::Int(i128::from(*self))
                }

                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_possible_wrap,
                    reason = "Lossy policy opts into `as` conversion semantics."
                )]
                fn narrow(scalar: Scalar, policy: CastPolicy) -> Result<Self, CastError> {
                    match (scalar, policy) {
                        (Scalar::Bool(value), _) => Ok(Self::from(value)),
                        (Scalar::Int(value), CastPolicy::Lossy) => Ok(value as Self),
                        (Scalar::Float(value), CastPolicy::Lossy) => Ok(value as Self),
                        (Scalar::Int(value), CastPolicy::Checked) => {
                            Self::try_from(value).map_err(|_| scalar.reject(Self::DATATYPE))
                        }
                        (Scalar::Float(value), CastPolicy::Checked) => {
                            if !value.is_finite() || value.fract() != 0.0 {
                                return Err(scalar.reject(Self::DATATYPE));
                            }
                            Self::try_from(value as i128).map_err(|_| scalar.reject(Self::DATATYPE))
                        }
                    }
                }

                fn wrap(array: ArrayD<Self>) -> HostTensor {
                    HostTensor::$variant(array)
                }
            }
        )*
    };
}

int_element!(
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
);

/// Implements [`Element`] for floating point kinds via `f64` conversions.
macro_rules! float_element {
    ($($ty:ty => $variant:ident, $to_f64:expr, $from_f64:expr);* $(;)?) => {
        $(
            impl Element for $ty {
                const DATATYPE: DataType = DataType::$variant;

                fn widen(&self) -> Scalar {
                    Scalar::Float($to_f64(*self))
                }

                #[allow(
                    clippy::cast_precision_loss,
                    reason = "Integer to float conversion rounds like the numeric library."
                )]
                fn narrow(scalar: Scalar, policy: CastPolicy) -> Result<Self, CastError> {
                    let wide = match scalar {
                        Scalar::Bool(value) => f64::from(u8::from(value)),
                        Scalar::Int(value) => value as f64,
                        Scalar::Float(value) => value,
                    };
                    let narrowed: Self = $from_f64(wide);
                    let back: f64 = $to_f64(narrowed);
                    if policy == CastPolicy::Checked && wide.is_finite() && !back.is_finite() {
                        return Err(scalar.reject(Self::DATATYPE));
                    }
                    Ok(narrowed)
                }

                fn wrap(array: ArrayD<Self>) -> HostTensor {
                    HostTensor::$variant(array)
                }
            }
        )*
    };
}

/// Narrows an `f64` into an `f32`.
#[allow(clippy::cast_possible_truncation, reason = "FP32 narrowing rounds to nearest.")]
fn f64_to_f32(value: f64) -> f32 {
    value as f32
}

float_element!(
    f16 => Fp16, f16::to_f64, f16::from_f64;
    bf16 => Bf16, bf16::to_f64, bf16::from_f64;
    f32 => Fp32, f64::from, f64_to_f32;
    f64 => Fp64, std::convert::identity, std::convert::identity;
);

/// Casts every element of `array` into `T`, preserving shape.
fn convert<S: Element, T: Element>(
    array: &ArrayD<S>,
    policy: CastPolicy,
) -> Result<HostTensor, CastError> {
    let data = array
        .iter()
        .map(|value| T::narrow(value.widen(), policy))
        .collect::<Result<Vec<T>, CastError>>()?;
    let converted = ArrayD::from_shape_vec(IxDyn(array.shape()), data)
        .map_err(|err| CastError::Layout(err.to_string()))?;
    Ok(T::wrap(converted))
}

/// Casts a numeric array into the numeric `target` kind.
fn convert_to<S: Element>(
    array: &ArrayD<S>,
    target: DataType,
    policy: CastPolicy,
) -> Result<HostTensor, CastError> {
    match target {
        DataType::Bool => convert::<S, bool>(array, policy),
        DataType::Uint8 => convert::<S, u8>(array, policy),
        DataType::Uint16 => convert::<S, u16>(array, policy),
        DataType::Uint32 => convert::<S, u32>(array, policy),
        DataType::Uint64 => convert::<S, u64>(array, policy),
        DataType::Int8 => convert::<S, i8>(array, policy),
        DataType::Int16 => convert::<S, i16>(array, policy),
        DataType::Int32 => convert::<S, i32>(array, policy),
        DataType::Int64 => convert::<S, i64>(array, policy),
        DataType::Fp16 => convert::<S, f16>(array, policy),
        DataType::Fp32 => convert::<S, f32>(array, policy),
        DataType::Fp64 => convert::<S, f64>(array, policy),
        DataType::Bf16 => convert::<S, bf16>(array, policy),
        DataType::Bytes => Err(CastError::Unsupported {
            from: S::DATATYPE,
            to: DataType::Bytes,
        }),
    }
}

// ============================================================================
// SECTION: Host Tensor
// ============================================================================

/// Typed n-dimensional host array.
#[derive(Debug, Clone, PartialEq)]
pub enum HostTensor {
    /// `BOOL` elements.
    Bool(ArrayD<bool>),
    /// `UINT8` elements.
    Uint8(ArrayD<u8>),
    /// `UINT16` elements.
    Uint16(ArrayD<u16>),
    /// `UINT32` elements.
    Uint32(ArrayD<u32>),
    /// `UINT64` elements.
    Uint64(ArrayD<u64>),
    /// `INT8` elements.
    Int8(ArrayD<i8>),
    /// `INT16` elements.
    Int16(ArrayD<i16>),
    /// `INT32` elements.
    Int32(ArrayD<i32>),
    /// `INT64` elements.
    Int64(ArrayD<i64>),
    /// `FP16` elements.
    Fp16(ArrayD<f16>),
    /// `FP32` elements.
    Fp32(ArrayD<f32>),
    /// `FP64` elements.
    Fp64(ArrayD<f64>),
    /// `BYTES` elements.
    Bytes(ArrayD<Vec<u8>>),
    /// `BF16` elements.
    Bf16(ArrayD<bf16>),
}

/// Applies an expression to the inner array of any variant.
macro_rules! with_array {
    ($tensor:expr, $array:ident => $body:expr) => {
        match $tensor {
            HostTensor::Bool($array) => $body,
            HostTensor::Uint8($array) => $body,
            HostTensor::Uint16($array) => $body,
            HostTensor::Uint32($array) => $body,
            HostTensor::Uint64($array) => $body,
            HostTensor::Int8($array) => $body,
            HostTensor::Int16($array) => $body,
            HostTensor::Int32($array) => $body,
            HostTensor::Int64($array) => $body,
            HostTensor::Fp16($array) => $body,
            HostTensor::Fp32($array) => $body,
            HostTensor::Fp64($array) => $body,
            HostTensor::Bytes($array) => $body,
            HostTensor::Bf16($array) => $body,
        }
    };
}

/// Applies an array-to-array expression, keeping the variant.
macro_rules! map_array {
    ($tensor:expr, $array:ident => $body:expr) => {
        match $tensor {
            HostTensor::Bool($array) => HostTensor::Bool($body),
            HostTensor::Uint8($array) => HostTensor::Uint8($body),
            HostTensor::Uint16($array) => HostTensor::Uint16($body),
            HostTensor::Uint32($array) => HostTensor::Uint32($body),
            HostTensor::Uint64($array) => HostTensor::Uint64($body),
            HostTensor::Int8($array) => HostTensor::Int8($body),
            HostTensor::Int16($array) => HostTensor::Int16($body),
            HostTensor::Int32($array) => HostTensor::Int32($body),
            HostTensor::Int64($array) => HostTensor::Int64($body),
            HostTensor::Fp16($array) => HostTensor::Fp16($body),
            HostTensor::Fp32($array) => HostTensor::Fp32($body),
            HostTensor::Fp64($array) => HostTensor::Fp64($body),
            HostTensor::Bytes($array) => HostTensor::Bytes($body),
            HostTensor::Bf16($array) => HostTensor::Bf16($body),
        }
    };
}

impl HostTensor {
    /// Returns the element datatype.
    #[must_use]
    pub const fn datatype(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Uint8(_) => DataType::Uint8,
            Self::Uint16(_) => DataType::Uint16,
            Self::Uint32(_) => DataType::Uint32,
            Self::Uint64(_) => DataType::Uint64,
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Fp16(_) => DataType::Fp16,
            Self::Fp32(_) => DataType::Fp32,
            Self::Fp64(_) => DataType::Fp64,
            Self::Bytes(_) => DataType::Bytes,
            Self::Bf16(_) => DataType::Bf16,
        }
    }

    /// Returns the array shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        with_array!(self, array => array.shape())
    }

    /// Returns the length of the leading axis, or `None` for a scalar.
    #[must_use]
    pub fn leading_len(&self) -> Option<usize> {
        self.shape().first().copied()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        with_array!(self, array => array.len())
    }

    /// Returns true when the tensor holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an owned copy of rows `range` along the leading axis.
    ///
    /// The range is clamped to the leading length; a scalar is returned
    /// unchanged.
    #[must_use]
    pub fn slice_leading(&self, range: Range<usize>) -> Self {
        let Some(total) = self.leading_len() else {
            return self.clone();
        };
        let end = range.end.min(total);
        let start = range.start.min(end);
        let slice = Slice::from(start..end);
        map_array!(self, array => array.slice_axis(Axis(0), slice).to_owned())
    }

    /// Casts the tensor to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CastError`] when no conversion exists or, under
    /// [`CastPolicy::Checked`], when a value does not survive it.
    pub fn cast(&self, target: DataType, policy: CastPolicy) -> Result<Self, CastError> {
        if self.datatype() == target {
            return Ok(self.clone());
        }
        match self {
            Self::Bool(array) => convert_to(array, target, policy),
            Self::Uint8(array) => convert_to(array, target, policy),
            Self::Uint16(array) => convert_to(array, target, policy),
            Self::Uint32(array) => convert_to(array, target, policy),
            Self::Uint64(array) => convert_to(array, target, policy),
            Self::Int8(array) => convert_to(array, target, policy),
            Self::Int16(array) => convert_to(array, target, policy),
            Self::Int32(array) => convert_to(array, target, policy),
            Self::Int64(array) => convert_to(array, target, policy),
            Self::Fp16(array) => convert_to(array, target, policy),
            Self::Fp32(array) => convert_to(array, target, policy),
            Self::Fp64(array) => convert_to(array, target, policy),
            Self::Bf16(array) => convert_to(array, target, policy),
            Self::Bytes(_) => Err(CastError::Unsupported {
                from: DataType::Bytes,
                to: target,
            }),
        }
    }

    /// Concatenates tensors of one datatype along the leading axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConcatError`] when `parts` is empty, mixes datatypes, or
    /// disagrees on trailing dims.
    pub fn concatenate(parts: &[Self]) -> Result<Self, ConcatError> {
        let first = parts.first().ok_or(ConcatError::Empty)?;
        if let Some(other) = parts.iter().find(|part| part.datatype() != first.datatype()) {
            return Err(ConcatError::MixedDatatypes {
                first: first.datatype(),
                other: other.datatype(),
            });
        }
        if parts.iter().any(|part| part.shape().is_empty()) {
            return Err(ConcatError::Shape("scalar tensors have no leading axis".to_string()));
        }
        Ok(match first {
            Self::Bool(_) => Self::Bool(join(parts, |part| match part {
                Self::Bool(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Uint8(_) => Self::Uint8(join(parts, |part| match part {
                Self::Uint8(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Uint16(_) => Self::Uint16(join(parts, |part| match part {
                Self::Uint16(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Uint32(_) => Self::Uint32(join(parts, |part| match part {
                Self::Uint32(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Uint64(_) => Self::Uint64(join(parts, |part| match part {
                Self::Uint64(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Int8(_) => Self::Int8(join(parts, |part| match part {
                Self::Int8(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Int16(_) => Self::Int16(join(parts, |part| match part {
                Self::Int16(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Int32(_) => Self::Int32(join(parts, |part| match part {
                Self::Int32(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Int64(_) => Self::Int64(join(parts, |part| match part {
                Self::Int64(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Fp16(_) => Self::Fp16(join(parts, |part| match part {
                Self::Fp16(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Fp32(_) => Self::Fp32(join(parts, |part| match part {
                Self::Fp32(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Fp64(_) => Self::Fp64(join(parts, |part| match part {
                Self::Fp64(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Bytes(_) => Self::Bytes(join(parts, |part| match part {
                Self::Bytes(array) => Some(array.view()),
                _ => None,
            })?),
            Self::Bf16(_) => Self::Bf16(join(parts, |part| match part {
                Self::Bf16(array) => Some(array.view()),
                _ => None,
            })?),
        })
    }
}

/// Concatenates same-kind views extracted by `pick` along axis 0.
fn join<'a, T: Clone + 'a>(
    parts: &'a [HostTensor],
    pick: impl Fn(&'a HostTensor) -> Option<ArrayViewD<'a, T>>,
) -> Result<ArrayD<T>, ConcatError> {
    let views = parts
        .iter()
        .map(|part| {
            pick(part).ok_or_else(|| ConcatError::Shape("datatype changed mid-join".to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ndarray::concatenate(Axis(0), &views).map_err(|err| ConcatError::Shape(err.to_string()))
}

/// Implements `From<ArrayD<T>>` for each element kind.
macro_rules! from_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$ty>> for HostTensor {
                fn from(array: ArrayD<$ty>) -> Self {
                    Self::$variant(array)
                }
            }
        )*
    };
}

from_array!(
    bool => Bool,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f16 => Fp16,
    f32 => Fp32,
    f64 => Fp64,
    Vec<u8> => Bytes,
    bf16 => Bf16,
);

// crates/serving-contract-core/src/core/format.rs
// ============================================================================
// Module: Input Formats
// Description: Normalized per-input layout hints from model configuration.
// Purpose: Accept both string and integer encodings of the input format.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Model configuration documents describe an optional layout hint per input.
//! Depending on how the document was rendered, the hint arrives as the enum
//! name (`FORMAT_NCHW`) or as its integer code (`2`). [`InputFormat`] is the
//! normalized form carried by a validated client.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Input Format
// ============================================================================

/// Normalized input layout hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputFormat {
    /// No layout hint.
    #[default]
    None,
    /// Channels-last image layout.
    Nhwc,
    /// Channels-first image layout.
    Nchw,
}

impl InputFormat {
    /// Returns the configuration enum name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "FORMAT_NONE",
            Self::Nhwc => "FORMAT_NHWC",
            Self::Nchw => "FORMAT_NCHW",
        }
    }

    /// Returns the configuration enum code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Nhwc => 1,
            Self::Nchw => 2,
        }
    }

    /// Resolves an enum code.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnknownCode`] for codes outside the enum.
    pub const fn from_code(code: i64) -> Result<Self, FormatError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Nhwc),
            2 => Ok(Self::Nchw),
            other => Err(FormatError::UnknownCode(other)),
        }
    }

    /// Resolves an enum name, with or without the `FORMAT_` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnknownName`] for unrecognized names.
    pub fn from_name(name: &str) -> Result<Self, FormatError> {
        let trimmed = name.trim();
        match trimmed.strip_prefix("FORMAT_").unwrap_or(trimmed) {
            "NONE" => Ok(Self::None),
            "NHWC" => Ok(Self::Nhwc),
            "NCHW" => Ok(Self::Nchw),
            _ => Err(FormatError::UnknownName(name.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw format value as it appears in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInputFormat {
    /// Integer enum code.
    Code(i64),
    /// Enum name.
    Name(String),
}

impl RawInputFormat {
    /// Normalizes the raw value.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when the value is not a known format.
    pub fn normalize(&self) -> Result<InputFormat, FormatError> {
        match self {
            Self::Code(code) => InputFormat::from_code(*code),
            Self::Name(name) => InputFormat::from_name(name),
        }
    }
}

/// Input format errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Unknown enum code.
    #[error("unknown input format code: {0}")]
    UnknownCode(i64),
    /// Unknown enum name.
    #[error("unknown input format name: {0}")]
    UnknownName(String),
}

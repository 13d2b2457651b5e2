//! Error types shared by the detection engine.
//!
//! Only [`DetectError`] ever reaches a caller of the classifier. Everything a
//! probe can fail with is folded into [`ProbeError`] and treated as "this is
//! not my format".

use std::io;

use thiserror::Error;

use crate::asn1::AsnError;

/// Fatal conditions that stop a classification before any probe runs
#[derive(Debug, Error)]
pub enum DetectError {
    /// Zero bytes were supplied
    #[error("no input bytes to classify")]
    EmptyInput,

    /// The bytes could not be obtained from their origin
    #[error("failed to read {origin}: {source}")]
    InputUnavailable {
        origin: String,
        #[source]
        source: io::Error,
    },

    /// The input is bigger than the configured ceiling
    #[error("{origin} is {size} bytes, above the {limit} byte limit")]
    InputTooLarge { origin: String, size: u64, limit: u64 },
}

/// Why a single probe declined the input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The bytes do not have the shape this probe looks for
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// The bytes declare sizes or nesting the reader refuses to follow
    #[error("resource limit: {0}")]
    ResourceExhaustion(String),
}

impl ProbeError {
    pub fn mismatch(reason: impl Into<String>) -> Self {
        Self::StructuralMismatch(reason.into())
    }
}

/// A read ran off the end of a [`crate::ByteSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("wanted {wanted} bytes at offset {offset}, only {available} available")]
    InsufficientData {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}

impl From<SourceError> for ProbeError {
    fn from(err: SourceError) -> Self {
        Self::StructuralMismatch(err.to_string())
    }
}

impl From<AsnError> for ProbeError {
    fn from(err: AsnError) -> Self {
        match err {
            AsnError::TooDeep(_) | AsnError::LengthOverflow { .. } => {
                Self::ResourceExhaustion(err.to_string())
            }
            _ => Self::StructuralMismatch(err.to_string()),
        }
    }
}

/// Result type for probe internals
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

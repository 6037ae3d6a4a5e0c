use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid key length: expected 1..={max} bytes, got {actual}")]
    InvalidKeyLength { max: usize, actual: usize },

    #[error("invalid identifier encoding: {0}")]
    InvalidEncoding(String),
}

/// Coarse classification shared by every error in the workspace.
///
/// Store, assignment and validation errors each map onto exactly one kind so
/// callers can branch on the category without inspecting backend details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload rejected before assignment began.
    Validation,
    /// The key is already stored. Drives the assignment retry loop.
    DuplicateKey,
    /// No payload is stored under the key.
    KeyNotFound,
    /// I/O, connectivity or protocol fault in a backend.
    Backend,
    /// The retry budget was consumed without finding a free key.
    AssignmentExhausted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::DuplicateKey => "duplicate_key",
            Self::KeyNotFound => "key_not_found",
            Self::Backend => "backend",
            Self::AssignmentExhausted => "assignment_exhausted",
        };
        f.write_str(s)
    }
}

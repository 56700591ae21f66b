//! Crate-wide error type
//!
//! Every module defines its own `thiserror` error enum scoped to its own
//! failure modes (`StorageError`, `HippocampalIndexError`, ...). This module
//! unifies them into the `{success, code, message}` shape tool-surface
//! callers see, and fixes the error kinds every module maps into.

use serde::{Deserialize, Serialize};

/// The error kinds a Vestige operation can fail with.
///
/// Math/scoring paths never produce these — they degrade to 0/NaN-free
/// defaults by convention instead of failing.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Referenced id does not exist.
    NotFound,
    /// Input failed schema/validation checks.
    Invalid,
    /// Unique-constraint violation not otherwise handled by an upsert.
    Conflict,
    /// Embedding generation or lookup was unavailable; caller should
    /// fall back to a keyword-only path.
    EmbeddingUnavailable,
    /// A remote adapter call (store or embedding provider) failed.
    AdapterFailure,
    /// The operation was cancelled before completing.
    Cancelled,
    /// An internal invariant was violated.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Conflict => "conflict",
            ErrorKind::EmbeddingUnavailable => "embedding_unavailable",
            ErrorKind::AdapterFailure => "adapter_failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Crate-wide error, used at the tool-surface boundary (§7).
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct VestigeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl VestigeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invalid, message)
    }

    pub fn internal(invariant: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, invariant)
    }

    /// The `{success, code, message}` envelope every tool returns on failure (§7).
    pub fn to_envelope(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "code": self.kind.as_str(),
            "message": self.message,
        })
    }
}

pub type Result<T> = std::result::Result<T, VestigeError>;

impl From<crate::storage::StorageError> for VestigeError {
    fn from(e: crate::storage::StorageError) -> Self {
        use crate::storage::StorageError as S;
        let kind = match &e {
            S::NotFound(_) => ErrorKind::NotFound,
            S::Invalid(_) => ErrorKind::Invalid,
            S::Conflict(_) => ErrorKind::Conflict,
            S::Cancelled => ErrorKind::Cancelled,
            S::Database(_) | S::Io(_) => ErrorKind::AdapterFailure,
            S::Init(_) => ErrorKind::Internal,
        };
        VestigeError::new(kind, e.to_string())
    }
}

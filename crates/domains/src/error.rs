//! # DomainError
//!
//! Centralized error handling for the social core.
//! Maps authorization and persistence failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Post, PostComment, Community)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// An authorization rule rejected the actor (not visible, not staff, blocked...)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// State already exists or collides (e.g., duplicate mute, taken username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Malformed input (e.g., edit removing all content, non-reaction emoji group)
    #[error("invalid: {0}")]
    Invalid(String),

    /// Infrastructure failure (e.g., storage unavailable, media I/O)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        Self::NotFound(kind.to_string(), id.to_string())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    /// True for the errors a transport reports with one uniform rejection
    /// status, so callers cannot tell "exists but hidden" from "missing".
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotFound(..) | Self::Forbidden(_))
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A specialized Result type for domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;

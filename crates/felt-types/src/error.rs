//! Error types for Felt
//!
//! Every failure at the core boundary is typed and surfaced to the caller.
//! None of them is fatal to the process.

use thiserror::Error;

use crate::ListingStatus;

/// Result type for Felt operations
pub type Result<T> = std::result::Result<T, FeltError>;

/// Felt error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeltError {
    /// Malformed input: bad score range, empty required field, self-rating
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// Reference to a nonexistent listing, user or conversation
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Disallowed listing status change
    #[error("Listing {listing_id} cannot move from {from} to {to}")]
    InvalidTransition {
        listing_id: String,
        from: ListingStatus,
        to: ListingStatus,
    },

    /// Listing removal attempted while Active or Completed
    #[error("Listing {listing_id} cannot be deleted while {status}")]
    NotDeletable {
        listing_id: String,
        status: ListingStatus,
    },

    /// The acting user may not perform this operation
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The text enhancement collaborator failed or is not configured
    #[error("Service unavailable: {reason}")]
    ServiceUnavailable { reason: String },
}

impl FeltError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Create a service-unavailable error
    pub fn service_unavailable(reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            reason: reason.into(),
        }
    }

    /// Check if re-invoking later may succeed without changing the input
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    /// Get an error code for presentation layers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotDeletable { .. } => "NOT_DELETABLE",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
        }
    }
}

//! # Desk Error Types
//!
//! Typed error handling for the booking workflow.
//! All workflow and collaborator operations return `Result<T, DeskError>`.

use crate::step::Step;
use thiserror::Error;

/// Core error type for all booking workflow operations
#[derive(Debug, Clone, Error)]
pub enum DeskError {
    /// Local validation failure, never reaches the network
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Attempted transition without its precondition
    #[error("Cannot leave step {step}: {reason}")]
    GuardFailed { step: Step, reason: String },

    /// Network/HTTP error talking to a collaborator (transient)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend or gateway refused the request (business rejection)
    #[error("Rejected: {message}")]
    Rejected { message: String },

    /// Workflow fields required by the current step are missing
    #[error("Workflow state lost, restart at step {restart_at}: {reason}")]
    StateLost { restart_at: Step, reason: String },

    /// Record not found on the backend
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error category, mirrors how the front-end reacts to each error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Guard,
    Transient,
    Business,
    StateLoss,
    Fatal,
}

impl DeskError {
    /// Shorthand for a field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DeskError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a guard failure at `step`
    pub fn guard(step: Step, reason: impl Into<String>) -> Self {
        DeskError::GuardFailed {
            step,
            reason: reason.into(),
        }
    }

    /// Shorthand for a business rejection
    pub fn rejected(message: impl Into<String>) -> Self {
        DeskError::Rejected {
            message: message.into(),
        }
    }

    /// Returns true if this error may be retried automatically.
    /// Only polling honours this; single-shot calls never retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeskError::Network(_))
    }

    /// Category of the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeskError::Validation { .. } => ErrorKind::Validation,
            DeskError::GuardFailed { .. } => ErrorKind::Guard,
            DeskError::Network(_) => ErrorKind::Transient,
            DeskError::Rejected { .. } | DeskError::NotFound(_) => ErrorKind::Business,
            DeskError::StateLost { .. } => ErrorKind::StateLoss,
            DeskError::Configuration(_)
            | DeskError::Serialization(_)
            | DeskError::Internal(_) => ErrorKind::Fatal,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            DeskError::Validation { .. } => 400,
            DeskError::GuardFailed { .. } => 409,
            DeskError::Network(_) => 503,
            DeskError::Rejected { .. } => 422,
            DeskError::StateLost { .. } => 409,
            DeskError::NotFound(_) => 404,
            DeskError::Configuration(_) => 500,
            DeskError::Serialization(_) => 502,
            DeskError::Internal(_) => 500,
        }
    }
}

/// Result type alias for desk operations
pub type DeskResult<T> = Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(DeskError::Network("timeout".into()).is_retryable());
        assert!(!DeskError::rejected("declined").is_retryable());
        assert!(!DeskError::validation("phone", "too short").is_retryable());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            DeskError::guard(Step::ConfirmBooking, "no conversion").kind(),
            ErrorKind::Guard
        );
        assert_eq!(DeskError::rejected("no funds").kind(), ErrorKind::Business);
        assert_eq!(
            DeskError::StateLost {
                restart_at: Step::SelectRoom,
                reason: "no room".into()
            }
            .kind(),
            ErrorKind::StateLoss
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DeskError::validation("adults", "min 1").status_code(), 400);
        assert_eq!(DeskError::NotFound("booking 7".into()).status_code(), 404);
        assert_eq!(
            DeskError::guard(Step::Payment, "unpaid").status_code(),
            409
        );
    }

    #[test]
    fn test_display() {
        let err = DeskError::guard(Step::GuestDetails, "booking not created");
        assert_eq!(
            err.to_string(),
            "Cannot leave step 2 (guest details): booking not created"
        );
    }
}

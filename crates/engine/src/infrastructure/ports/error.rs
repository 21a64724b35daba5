//! Error types for port operations.

/// Repository operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Storage operation failed - includes operation name for tracing.
    #[error("Storage error in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// Business constraint violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Storage error with operation context.
    pub fn storage(operation: &'static str, message: impl ToString) -> Self {
        Self::Storage {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a ConstraintViolation error.
    pub fn constraint(message: impl ToString) -> Self {
        Self::ConstraintViolation(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<lorekeeper_domain::DomainError> for RepoError {
    fn from(e: lorekeeper_domain::DomainError) -> Self {
        Self::constraint(e)
    }
}

/// Errors from the generation backends.
///
/// `Configuration` is a setup problem (missing or placeholder credential,
/// unknown backend selection) and is never retried. The other variants are
/// transient and eligible for retry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("Provider not configured: {0}")]
    Configuration(String),
    #[error("Provider request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            // Don't retry auth/bad-request responses either
            Self::RequestFailed(msg) => {
                !msg.contains("401") && !msg.contains("403") && !msg.contains("400")
            }
            Self::InvalidResponse(_) => true,
        }
    }
}

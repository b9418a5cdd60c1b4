//! Authentication and authorization error types.
//!
//! Credential verification failures never appear here directly: the session
//! resolver folds them into [`AuthError::AuthenticationRequired`]. Only the
//! variants below reach the HTTP layer.

use crate::role::Role;

/// Errors that can occur during authentication and authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no valid credential.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Sign-in failed: unknown email, wrong password or inactive account.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The authenticated user's role is below the required one.
    #[error("Insufficient role: {required} required, {actual} given")]
    InsufficientRole {
        /// Role carried by the caller's credential (may be an unknown string).
        actual: String,
        /// Role the operation requires.
        required: String,
    },

    /// The request is invalid or malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The requested record does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was not found.
        message: String,
    },

    /// An error occurred while storing or retrieving auth data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The auth configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InsufficientRole` error.
    #[must_use]
    pub fn insufficient_role(actual: impl Into<String>, required: Role) -> Self {
        Self::InsufficientRole {
            actual: actual.into(),
            required: required.as_str().to_string(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the error category for logging and metrics.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationRequired | Self::InvalidCredentials => {
                ErrorCategory::Authentication
            }
            Self::InsufficientRole { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } | Self::NotFound { .. } => ErrorCategory::Request,
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                ErrorCategory::Server
            }
        }
    }

    /// Machine-readable error code used in response bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InsufficientRole { .. } => "insufficient_role",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::NotFound { .. } => "not_found",
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }
}

/// Broad categories of auth errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Who is calling could not be established (401).
    Authentication,
    /// The caller is known but not allowed (403).
    Authorization,
    /// The request itself is wrong (4xx).
    Request,
    /// Server-side failure (5xx).
    Server,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Request => write!(f, "request"),
            Self::Server => write!(f, "server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_role_message() {
        let err = AuthError::insufficient_role("EMPLOYEE", Role::Manager);
        assert_eq!(
            err.to_string(),
            "Insufficient role: MANAGER required, EMPLOYEE given"
        );
        assert_eq!(err.code(), "insufficient_role");
        assert_eq!(err.category(), ErrorCategory::Authorization);
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            AuthError::AuthenticationRequired.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::InvalidCredentials.category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::not_found("user").category(),
            ErrorCategory::Request
        );
        assert_eq!(
            AuthError::storage("down").category(),
            ErrorCategory::Server
        );
        assert_eq!(ErrorCategory::Server.to_string(), "server");
    }
}

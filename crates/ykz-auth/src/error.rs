//! Authentication and authorization error types.
//!
//! Every failure the dashboard's access layer can produce is expressed as an
//! [`AuthError`]. Callers branch on [`AuthError::category`] to pick the
//! deliberate outcome (login redirect, access-denied page, server error).

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while authenticating or authorizing an operator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No identity is bound to the session.
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Description of why the request is unauthenticated.
        message: String,
    },

    /// The identity is bound but not allowed to access the resource.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of why access is forbidden.
        message: String,
    },

    /// The OAuth callback carried an invalid or missing parameter.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The identity provider refused the handshake or returned garbage.
    #[error("Identity provider error: {provider} - {message}")]
    IdentityProvider {
        /// The identity provider name.
        provider: String,
        /// Description of the error.
        message: String,
    },

    /// The remote admin directory could not answer (transport or parse failure).
    #[error("Admin directory unavailable: {message}")]
    DirectoryUnavailable {
        /// Description of the upstream failure.
        message: String,
    },

    /// An error occurred while storing or retrieving session data.
    #[error("Session storage error: {message}")]
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
    /// Creates a new `Unauthenticated` error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Creates a new `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityProvider` error.
    #[must_use]
    pub fn identity_provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Creates a new `DirectoryUnavailable` error.
    #[must_use]
    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
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

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated { .. } | Self::Forbidden { .. } | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthenticated { .. } => ErrorCategory::Authentication,
            Self::Forbidden { .. } => ErrorCategory::Authorization,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::IdentityProvider { .. } => ErrorCategory::Federation,
            Self::DirectoryUnavailable { .. } => ErrorCategory::Upstream,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code matching this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            Self::IdentityProvider { .. } | Self::DirectoryUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Self::Storage { .. } | Self::Configuration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Categories of authentication/authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// No identity bound.
    Authentication,
    /// Identity bound but refused.
    Authorization,
    /// Malformed callback or request.
    Validation,
    /// Identity provider federation errors.
    Federation,
    /// Remote admin directory failures.
    Upstream,
    /// Session storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Validation => write!(f, "validation"),
            Self::Federation => write!(f, "federation"),
            Self::Upstream => write!(f, "upstream"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::forbidden("admin required");
        assert_eq!(err.to_string(), "Forbidden: admin required");

        let err = AuthError::identity_provider("discord", "token exchange failed");
        assert_eq!(
            err.to_string(),
            "Identity provider error: discord - token exchange failed"
        );

        let err = AuthError::directory_unavailable("connection refused");
        assert_eq!(
            err.to_string(),
            "Admin directory unavailable: connection refused"
        );
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::unauthenticated("x").is_client_error());
        assert!(AuthError::forbidden("x").is_client_error());
        assert!(!AuthError::forbidden("x").is_server_error());
        assert!(AuthError::directory_unavailable("x").is_server_error());
        assert!(AuthError::storage("x").is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::unauthenticated("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::forbidden("x").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            AuthError::directory_unavailable("x").category(),
            ErrorCategory::Upstream
        );
        assert_eq!(ErrorCategory::Upstream.to_string(), "upstream");
    }

    #[test]
    fn test_status_codes_keep_forbidden_and_upstream_apart() {
        assert_eq!(
            AuthError::forbidden("x").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::directory_unavailable("x").status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}

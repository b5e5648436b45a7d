//! Direct grant error types.
//!
//! Every failure of the grant pipeline is reported as a [`GrantError`]. The
//! protocol-level variants carry a complete [`OAuthError`] record (including
//! the correlating `state`) so the HTTP binding can return it unchanged.

use std::fmt;

use crate::oauth::error::{ErrorCode, OAuthError};

/// Errors that terminate a direct grant request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrantError {
    /// The request did not arrive over a secure transport.
    #[error("Transport layer security is required")]
    InsecureTransport,

    /// No security context, or a security context without a principal.
    #[error("Request is not authenticated")]
    Unauthenticated,

    /// The client id is missing or unknown, or the registry rejected it.
    #[error("Invalid client: {0}")]
    InvalidClient(OAuthError),

    /// The requested scope is not satisfiable for the client.
    #[error("Invalid scope: {0}")]
    InvalidScope(OAuthError),

    /// The token issuer failed to produce a token.
    #[error("Token issuance failed: {message}")]
    IssuanceFailure {
        /// Description of the issuer failure.
        message: String,
    },
}

impl GrantError {
    /// Creates an `InvalidClient` error carrying the given state.
    #[must_use]
    pub fn invalid_client(description: impl Into<String>, state: Option<String>) -> Self {
        Self::InvalidClient(OAuthError::invalid_client(description).with_state(state))
    }

    /// Creates an `InvalidScope` error carrying the given state.
    #[must_use]
    pub fn invalid_scope(description: impl Into<String>, state: Option<String>) -> Self {
        Self::InvalidScope(OAuthError::invalid_scope(description).with_state(state))
    }

    /// Creates an `IssuanceFailure` error.
    #[must_use]
    pub fn issuance_failure(message: impl Into<String>) -> Self {
        Self::IssuanceFailure {
            message: message.into(),
        }
    }

    /// Returns the OAuth error record, if this error is reported as one.
    #[must_use]
    pub fn error_record(&self) -> Option<&OAuthError> {
        match self {
            Self::InvalidClient(record) | Self::InvalidScope(record) => Some(record),
            Self::InsecureTransport | Self::Unauthenticated | Self::IssuanceFailure { .. } => {
                None
            }
        }
    }

    /// Returns the correlating state carried by this error.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.error_record().and_then(|record| record.state.as_deref())
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// For registry-supplied records this is the registry's own code.
    #[must_use]
    pub fn oauth_error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidClient(record) | Self::InvalidScope(record) => record.error,
            Self::InsecureTransport => ErrorCode::InvalidRequest,
            Self::Unauthenticated => ErrorCode::AccessDenied,
            Self::IssuanceFailure { .. } => ErrorCode::ServerError,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InsecureTransport | Self::InvalidClient(_) | Self::InvalidScope(_) => 400,
            Self::Unauthenticated => 401,
            Self::IssuanceFailure { .. } => 500,
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InsecureTransport => ErrorCategory::Transport,
            Self::Unauthenticated => ErrorCategory::Authentication,
            Self::InvalidClient(_) => ErrorCategory::Client,
            Self::InvalidScope(_) => ErrorCategory::Authorization,
            Self::IssuanceFailure { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of grant errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport security violations.
    Transport,
    /// Missing or incomplete authentication.
    Authentication,
    /// Client resolution failures.
    Client,
    /// Scope validation failures.
    Authorization,
    /// Collaborator failures (token issuer).
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport"),
            Self::Authentication => write!(f, "authentication"),
            Self::Client => write!(f, "client"),
            Self::Authorization => write!(f, "authorization"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

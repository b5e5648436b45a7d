//! OAuth 2.0 error records.
//!
//! An [`OAuthError`] is the structured body returned to the caller when a
//! direct grant request is rejected. It always carries the `state` value of
//! the inbound request when one was supplied, so the caller can correlate the
//! failure with the request it made.

use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth 2.0 error codes used by the direct grant endpoint.
///
/// Defined in RFC 6749 Sections 4.1.2.1 and 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is missing a required parameter or is otherwise malformed.
    InvalidRequest,

    /// The client is unknown, inactive, or could not be resolved.
    InvalidClient,

    /// The client is not authorized to request a token this way.
    UnauthorizedClient,

    /// The resource owner or authorization server denied the request.
    AccessDenied,

    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,

    /// The authorization server encountered an unexpected condition.
    ServerError,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::AccessDenied => "access_denied",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured OAuth error body.
///
/// # Example Response
///
/// ```json
/// {
///   "error": "invalid_scope",
///   "error_description": "Scope 'admin' is not allowed for this client",
///   "state": "af0ifjsldkj"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthError {
    /// OAuth 2.0 error code.
    pub error: ErrorCode,

    /// Human-readable error description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI of a page with additional information about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,

    /// Correlation value copied from the inbound request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl OAuthError {
    /// Creates a new error without description.
    #[must_use]
    pub fn new(error: ErrorCode) -> Self {
        Self {
            error,
            error_description: None,
            error_uri: None,
            state: None,
        }
    }

    /// Creates a new error with description.
    #[must_use]
    pub fn with_description(error: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            error_description: Some(description.into()),
            ..Self::new(error)
        }
    }

    /// Creates an `invalid_client` error.
    #[must_use]
    pub fn invalid_client(description: impl Into<String>) -> Self {
        Self::with_description(ErrorCode::InvalidClient, description)
    }

    /// Creates an `invalid_scope` error.
    #[must_use]
    pub fn invalid_scope(description: impl Into<String>) -> Self {
        Self::with_description(ErrorCode::InvalidScope, description)
    }

    /// Creates an `invalid_request` error.
    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::with_description(ErrorCode::InvalidRequest, description)
    }

    /// Replaces the correlation state.
    ///
    /// Passing `None` clears any state the error already carried, so the
    /// record always reflects the request currently being answered.
    #[must_use]
    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    /// Sets the error URI.
    #[must_use]
    pub fn with_error_uri(mut self, uri: impl Into<String>) -> Self {
        self.error_uri = Some(uri.into());
        self
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(description) => write!(f, "{}: {}", self.error, description),
            None => write!(f, "{}", self.error),
        }
    }
}

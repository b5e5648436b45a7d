//! Issued tokens and the token response body.
//!
//! The token issuer returns a [`TokenRecord`]; the processor adapts it into
//! the caller-facing [`TokenResponse`].
//!
//! # Example Response
//!
//! ```json
//! {
//!   "access_token": "mF_9.B5f-4.1JqM",
//!   "token_type": "Bearer",
//!   "expires_in": 3600,
//!   "scope": "read write",
//!   "state": "af0ifjsldkj",
//!   "issued_at": 1767225600
//! }
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

/// Token produced by the token issuer.
///
/// Owned by the issuer's store; the grant pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    /// The access token value handed to the client.
    pub token_key: String,

    /// Token type, typically "Bearer".
    pub token_type: String,

    /// Refresh token, if the issuer created one.
    pub refresh_token: Option<String>,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// When the token was issued.
    pub issued_at: OffsetDateTime,

    /// Scope granted to the token, in order.
    pub scopes: Vec<String>,

    /// Client the token was issued to.
    pub client_id: String,

    /// Login of the user the token was issued for.
    pub subject: String,

    /// Grant type the token was issued under.
    pub grant_type: String,

    /// Issuer-specific extra response parameters.
    pub parameters: BTreeMap<String, String>,
}

/// Successful direct grant response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Refresh token, if one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Correlation value copied from the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Issue time in seconds since the epoch. Optional parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,

    /// Issuer-specific parameters. Optional.
    #[serde(flatten)]
    pub parameters: BTreeMap<String, String>,
}

impl TokenResponse {
    /// Adapts an issued token into the response body.
    ///
    /// `approved_scope` is reported when the issuer recorded no scope of its
    /// own. `issued_at` and the issuer's extra parameters are only written
    /// when `write_optional_parameters` is set.
    #[must_use]
    pub fn from_record(
        record: &TokenRecord,
        approved_scope: &[String],
        state: Option<String>,
        write_optional_parameters: bool,
    ) -> Self {
        let scopes = if record.scopes.is_empty() {
            approved_scope
        } else {
            record.scopes.as_slice()
        };

        let mut response = Self {
            access_token: record.token_key.clone(),
            token_type: record.token_type.clone(),
            expires_in: record.expires_in,
            scope: scopes.join(" "),
            refresh_token: record.refresh_token.clone(),
            state,
            issued_at: None,
            parameters: BTreeMap::new(),
        };

        if write_optional_parameters {
            response.issued_at = Some(record.issued_at.unix_timestamp());
            response.parameters = record
                .parameters
                .iter()
                .filter(|(key, _)| !is_reserved_parameter(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
        }

        response
    }

    /// Granted scopes as individual tokens.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

/// Names that extra parameters must not shadow.
fn is_reserved_parameter(name: &str) -> bool {
    matches!(
        name,
        "access_token"
            | "token_type"
            | "expires_in"
            | "scope"
            | "refresh_token"
            | "state"
            | "issued_at"
    )
}

//! Token-issuance request assembly.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::scope::ScopeSet;
use crate::types::{Client, UserIdentity};

/// Grant types this crate issues tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Token issued directly to an already-authenticated user.
    DirectToken,
}

impl GrantType {
    /// Returns the grant type identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectToken => "direct_token",
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything the token issuer needs to create a token.
///
/// Borrows the client and identity; it lives only for the issuer call.
#[derive(Debug, Clone, Copy)]
pub struct GrantRequest<'a> {
    /// The requesting client.
    pub client: &'a Client,

    /// The end user the token is issued for.
    pub identity: &'a UserIdentity,

    /// Scopes requested by the client.
    pub requested_scope: &'a [String],

    /// Scopes approved for the token.
    pub approved_scope: &'a [String],

    /// Grant type tag.
    pub grant_type: GrantType,
}

/// Assembles [`GrantRequest`]s from validated inputs.
///
/// Performs no validation of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantBuilder;

impl GrantBuilder {
    /// Builds the direct grant request.
    #[must_use]
    pub fn build<'a>(
        client: &'a Client,
        identity: &'a UserIdentity,
        scopes: &'a ScopeSet,
    ) -> GrantRequest<'a> {
        GrantRequest {
            client,
            identity,
            requested_scope: scopes.requested(),
            approved_scope: scopes.approved(),
            grant_type: GrantType::DirectToken,
        }
    }
}

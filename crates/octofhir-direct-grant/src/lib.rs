//! # octofhir-direct-grant
//!
//! OAuth 2.0 "direct grant" processing for the OctoFHIR server.
//!
//! A user who is already authenticated by the hosting environment (SSO,
//! client certificate, trusted proxy) obtains an access token on behalf of
//! a registered client in a single request, without an interactive consent
//! step or a redirect.
//!
//! ## Overview
//!
//! Each request passes through a fixed pipeline:
//!
//! 1. transport security and authentication checks
//! 2. end-user identity resolution
//! 3. client resolution
//! 4. scope validation
//! 5. token issuance through a [`TokenIssuer`]
//!
//! Every failure short-circuits to a [`GrantError`]. Client and scope errors
//! carry an OAuth error record including the request `state`.
//!
//! ## Modules
//!
//! - [`config`] - Pipeline configuration
//! - [`error`] - Error taxonomy
//! - [`grant`] - Pipeline stages and the [`GrantProcessor`]
//! - [`http`] - Axum handler for the endpoint
//! - [`oauth`] - OAuth wire types
//! - [`storage`] - Client registry and token issuer traits
//! - [`types`] - Clients, identities and request context

pub mod config;
pub mod error;
pub mod grant;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod types;

pub use config::{ConfigError, DirectGrantConfig, ScopeConfig, TransportSecurityMode};
pub use error::{ErrorCategory, GrantError};
pub use grant::{
    ClientResolver, ExactScopeMatcher, GrantBuilder, GrantProcessor, GrantRequest, GrantStage,
    GrantType, HierarchicalScopeMatcher, IdentityMapper, IdentityMappingError, ScopeMatcher,
    ScopeResolver, ScopeSet, UserIdentityResolver,
};
pub use http::{DirectGrantState, direct_grant_handler};
pub use oauth::{ErrorCode, OAuthError, TokenRecord, TokenResponse};
pub use storage::{ClientRegistry, IssuerError, RegistryError, TokenIssuer};
pub use types::{
    Client, ClientValidationError, FormParams, RequestContext, SecurityContext,
    TransportSecurity, UserIdentity,
};

/// Type alias for direct grant results.
pub type GrantResult<T> = Result<T, GrantError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use octofhir_direct_grant::prelude::*;
/// ```
pub mod prelude {
    pub use crate::GrantResult;
    pub use crate::config::{DirectGrantConfig, TransportSecurityMode};
    pub use crate::error::{ErrorCategory, GrantError};
    pub use crate::grant::{GrantProcessor, GrantRequest, IdentityMapper, ScopeMatcher};
    pub use crate::http::{DirectGrantState, direct_grant_handler};
    pub use crate::oauth::{ErrorCode, OAuthError, TokenRecord, TokenResponse};
    pub use crate::storage::{ClientRegistry, IssuerError, RegistryError, TokenIssuer};
    pub use crate::types::{Client, RequestContext, SecurityContext, TransportSecurity, UserIdentity};
}

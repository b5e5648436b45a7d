//! The direct grant pipeline.
//!
//! - [`security`] - Transport and authentication checks
//! - [`identity`] - End-user identity resolution
//! - [`client`] - Client lookup and validation
//! - [`scope`] - Scope parsing and matching
//! - [`builder`] - Token-issuance request assembly
//! - [`processor`] - Orchestration of the stages above

pub mod builder;
pub mod client;
pub mod identity;
pub mod processor;
pub mod scope;
pub mod security;

pub use builder::{GrantBuilder, GrantRequest, GrantType};
pub use client::ClientResolver;
pub use identity::{IdentityMapper, IdentityMappingError, UserIdentityResolver};
pub use processor::{GrantProcessor, GrantStage};
pub use scope::{
    ExactScopeMatcher, HierarchicalScopeMatcher, ScopeMatcher, ScopeResolver, ScopeSet,
    parse_scope,
};
pub use security::validate_security_context;

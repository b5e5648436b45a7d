//! Domain types for the direct grant pipeline.

pub mod client;
pub mod context;
pub mod identity;

pub use client::{Client, ClientValidationError};
pub use context::{FormParams, RequestContext, SecurityContext, TransportSecurity, params};
pub use identity::UserIdentity;

//! In-memory collaborators for the OctoFHIR direct grant.
//!
//! Provides lock-free implementations of
//! [`ClientRegistry`](octofhir_direct_grant::ClientRegistry) and
//! [`TokenIssuer`](octofhir_direct_grant::TokenIssuer) backed by papaya
//! hash maps. Suitable for tests, development and single-node deployments
//! where issued tokens need not survive a restart.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use octofhir_direct_grant::{Client, DirectGrantConfig, GrantProcessor};
//! use octofhir_direct_grant_memory::{InMemoryClientRegistry, InMemoryTokenIssuer};
//!
//! let registry = Arc::new(InMemoryClientRegistry::new());
//! registry.register(Client::new("portal", vec!["read".into()]))?;
//!
//! let issuer = Arc::new(InMemoryTokenIssuer::default());
//! let processor = GrantProcessor::new(registry, issuer, DirectGrantConfig::default());
//! ```

pub mod issuer;
pub mod registry;

pub use issuer::{InMemoryTokenIssuer, TokenIssuerConfig, generate_token, hash_token};
pub use registry::InMemoryClientRegistry;

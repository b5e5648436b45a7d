//! Collaborator interfaces for the grant pipeline.
//!
//! The client registry and the token issuer are owned outside this crate.
//! Implementations are provided by storage backends (see
//! `octofhir-direct-grant-memory` for an in-memory one).

pub mod client;
pub mod token;

pub use client::{ClientRegistry, RegistryError};
pub use token::{IssuerError, TokenIssuer};

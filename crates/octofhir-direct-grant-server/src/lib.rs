//! HTTP server for the OctoFHIR direct grant endpoint.
//!
//! Wires the in-memory client registry and token issuer into a
//! [`GrantProcessor`](octofhir_direct_grant::GrantProcessor) and exposes it
//! behind a trusted-proxy authentication layer.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::ServerConfig;
pub use server::{DirectGrantServer, ServerBuilder, build_app};

//! Axum HTTP binding for the direct grant endpoint.

pub mod direct;

pub use direct::{DirectGrantState, direct_grant_handler};

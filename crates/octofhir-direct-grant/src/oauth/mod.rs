//! OAuth 2.0 wire types for the direct grant endpoint.
//!
//! - [`error`] - Structured error records (`{error, error_description, state}`)
//! - [`token`] - Issued token records and the token response body

pub mod error;
pub mod token;

pub use error::{ErrorCode, OAuthError};
pub use token::{TokenRecord, TokenResponse};

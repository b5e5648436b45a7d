//! Token issuer trait.

use async_trait::async_trait;

use crate::grant::GrantRequest;
use crate::oauth::token::TokenRecord;

/// Creates access tokens for validated grant requests.
///
/// Implementations generate the token material (random or JWT) and persist
/// it. They must be safe to call concurrently.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Create an access token for the grant.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be generated or stored.
    async fn create_access_token(
        &self,
        grant: &GrantRequest<'_>,
    ) -> Result<TokenRecord, IssuerError>;
}

/// Errors reported by a token issuer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IssuerError {
    /// The token could not be persisted.
    #[error("Token storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The token material could not be generated.
    #[error("Token generation error: {message}")]
    Generation {
        /// Description of the generation error.
        message: String,
    },
}

impl IssuerError {
    /// Creates a `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a `Generation` error.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }
}

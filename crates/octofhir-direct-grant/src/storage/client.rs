//! Client registry trait.

use async_trait::async_trait;

use crate::oauth::error::OAuthError;
use crate::types::Client;

// =============================================================================
// Client Registry Trait
// =============================================================================

/// Read access to registered OAuth clients.
///
/// # Example
///
/// ```ignore
/// use octofhir_direct_grant::storage::ClientRegistry;
///
/// async fn example(registry: &impl ClientRegistry) {
///     if let Some(client) = registry.find_client("my-app").await? {
///         println!("Found client: {}", client.name);
///     }
/// }
/// ```
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    /// Find a client by its OAuth client_id.
    ///
    /// Returns `None` if the client is not registered.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Rejected`] when the registry refuses the
    /// lookup with a structured OAuth error, or
    /// [`RegistryError::Unavailable`] when it cannot answer at all.
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, RegistryError>;
}

/// Errors reported by a client registry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// The registry rejected the lookup with an OAuth error payload.
    #[error("Client registry rejected lookup: {0}")]
    Rejected(OAuthError),

    /// The registry could not be reached or failed internally.
    #[error("Client registry unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

impl RegistryError {
    /// Creates an `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

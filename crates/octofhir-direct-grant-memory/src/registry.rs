//! In-memory client registry.

use async_trait::async_trait;
use octofhir_direct_grant::{Client, ClientRegistry, ClientValidationError, RegistryError};
use papaya::HashMap as PapayaHashMap;
use tracing::debug;

/// Client registry backed by a papaya lock-free map.
#[derive(Debug, Default)]
pub struct InMemoryClientRegistry {
    clients: PapayaHashMap<String, Client>,
}

impl InMemoryClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with `clients`.
    ///
    /// # Errors
    ///
    /// Returns the first client validation failure.
    pub fn from_clients(
        clients: impl IntoIterator<Item = Client>,
    ) -> Result<Self, ClientValidationError> {
        let registry = Self::new();
        for client in clients {
            registry.register(client)?;
        }
        Ok(registry)
    }

    /// Registers a client, replacing any client with the same id.
    ///
    /// Returns the replaced client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client fails validation.
    pub fn register(&self, client: Client) -> Result<Option<Client>, ClientValidationError> {
        client.validate()?;
        debug!(client_id = %client.client_id, "Registering client");
        Ok(self
            .clients
            .pin()
            .insert(client.client_id.clone(), client)
            .cloned())
    }

    /// Removes a client, returning it if it was registered.
    pub fn remove(&self, client_id: &str) -> Option<Client> {
        self.clients.pin().remove(client_id).cloned()
    }

    /// Returns a registered client by id.
    pub fn get(&self, client_id: &str) -> Option<Client> {
        self.clients.pin().get(client_id).cloned()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns `true` if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn find_client(&self, client_id: &str) -> Result<Option<Client>, RegistryError> {
        Ok(self.get(client_id))
    }
}

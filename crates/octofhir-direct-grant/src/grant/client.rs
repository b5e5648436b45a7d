//! Client resolution for the direct grant.
//!
//! The direct grant has no redirect URI, so every client error is returned
//! straight to the caller. Whatever branch fails, the error record carries
//! the `state` of the request.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::GrantResult;
use crate::error::GrantError;
use crate::storage::{ClientRegistry, RegistryError};
use crate::types::{Client, FormParams};

const CLIENT_ID_MISSING: &str = "Client ID is missing";
const CLIENT_ID_INVALID: &str = "Client ID is invalid";

/// Looks up and validates the requesting client.
#[derive(Clone)]
pub struct ClientResolver {
    registry: Arc<dyn ClientRegistry>,
}

impl ClientResolver {
    /// Creates a resolver backed by the given registry.
    #[must_use]
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Resolves `client_id` to an active registered client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClient` if:
    /// - `client_id` is absent or blank (whitespace only)
    /// - the registry rejects the lookup (its own error record is returned,
    ///   with the request state attached)
    /// - the registry is unavailable, or the client is unknown or inactive
    ///
    /// A non-blank `client_id` is looked up exactly as sent.
    pub async fn resolve(&self, client_id: Option<&str>, params: &FormParams) -> GrantResult<Client> {
        let state = params.state().map(str::to_string);

        let Some(client_id) = client_id.filter(|id| !id.trim().is_empty()) else {
            return Err(GrantError::invalid_client(CLIENT_ID_MISSING, state));
        };

        let client = match self.registry.find_client(client_id).await {
            Ok(client) => client,
            Err(RegistryError::Rejected(record)) => {
                debug!(client_id, error = %record, "Client registry rejected lookup");
                return Err(GrantError::InvalidClient(record.with_state(state)));
            }
            Err(e @ RegistryError::Unavailable { .. }) => {
                warn!(client_id, error = %e, "Client lookup failed");
                None
            }
        };

        match client {
            Some(client) if client.active => Ok(client),
            Some(_) => {
                debug!(client_id, "Client is inactive");
                Err(GrantError::invalid_client(CLIENT_ID_INVALID, state))
            }
            None => Err(GrantError::invalid_client(CLIENT_ID_INVALID, state)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{ErrorCode, OAuthError};
    use async_trait::async_trait;
    use std::collections::HashMap;

    enum Behaviour {
        Clients(HashMap<String, Client>),
        Reject(OAuthError),
        Unavailable,
    }

    struct MockRegistry {
        behaviour: Behaviour,
    }

    #[async_trait]
    impl ClientRegistry for MockRegistry {
        async fn find_client(&self, client_id: &str) -> Result<Option<Client>, RegistryError> {
            match &self.behaviour {
                Behaviour::Clients(clients) => Ok(clients.get(client_id).cloned()),
                Behaviour::Reject(record) => Err(RegistryError::Rejected(record.clone())),
                Behaviour::Unavailable => Err(RegistryError::unavailable("connection refused")),
            }
        }
    }

    fn resolver(behaviour: Behaviour) -> ClientResolver {
        ClientResolver::new(Arc::new(MockRegistry { behaviour }))
    }

    fn registry_with(clients: Vec<Client>) -> ClientResolver {
        resolver(Behaviour::Clients(
            clients
                .into_iter()
                .map(|c| (c.client_id.clone(), c))
                .collect(),
        ))
    }

    fn params(state: Option<&str>) -> FormParams {
        let mut pairs = vec![("client_id".to_string(), "c1".to_string())];
        if let Some(state) = state {
            pairs.push(("state".to_string(), state.to_string()));
        }
        FormParams::from_pairs(pairs)
    }

    #[tokio::test]
    async fn test_resolves_registered_client() {
        let resolver = registry_with(vec![Client::new("c1", vec!["read".to_string()])]);
        let client = resolver.resolve(Some("c1"), &params(None)).await.unwrap();
        assert_eq!(client.client_id, "c1");
    }

    #[tokio::test]
    async fn test_unknown_client_carries_state() {
        let resolver = registry_with(vec![]);
        let err = resolver
            .resolve(Some("nope"), &params(Some("abc123")))
            .await
            .unwrap_err();

        let record = err.error_record().unwrap();
        assert_eq!(record.error, ErrorCode::InvalidClient);
        assert_eq!(record.error_description.as_deref(), Some(CLIENT_ID_INVALID));
        assert_eq!(record.state.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_registry_rejection_carries_state() {
        let payload = OAuthError::new(ErrorCode::UnauthorizedClient)
            .with_state(Some("registry-internal".to_string()));
        let resolver = resolver(Behaviour::Reject(payload));

        let err = resolver
            .resolve(Some("c1"), &params(Some("abc123")))
            .await
            .unwrap_err();

        let record = err.error_record().unwrap();
        assert_eq!(record.error, ErrorCode::UnauthorizedClient);
        assert_eq!(record.state.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_registry_unavailable_is_generic_invalid_client() {
        let resolver = resolver(Behaviour::Unavailable);
        let err = resolver
            .resolve(Some("c1"), &params(Some("abc123")))
            .await
            .unwrap_err();

        assert!(matches!(err, GrantError::InvalidClient(_)));
        assert_eq!(err.state(), Some("abc123"));
        assert_eq!(
            err.error_record().unwrap().error_description.as_deref(),
            Some(CLIENT_ID_INVALID)
        );
    }

    #[tokio::test]
    async fn test_missing_client_id() {
        let resolver = registry_with(vec![]);
        for client_id in [None, Some(""), Some("  ")] {
            let err = resolver
                .resolve(client_id, &params(Some("s")))
                .await
                .unwrap_err();
            assert_eq!(err.state(), Some("s"));
            assert_eq!(
                err.error_record().unwrap().error_description.as_deref(),
                Some(CLIENT_ID_MISSING)
            );
        }
    }

    #[tokio::test]
    async fn test_client_id_not_trimmed() {
        let resolver = registry_with(vec![Client::new("c1", vec!["read".to_string()])]);
        let err = resolver
            .resolve(Some(" c1 "), &params(Some("s")))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_record().unwrap().error_description.as_deref(),
            Some(CLIENT_ID_INVALID)
        );
        assert_eq!(err.state(), Some("s"));
    }

    #[tokio::test]
    async fn test_inactive_client_rejected() {
        let mut client = Client::new("c1", vec![]);
        client.active = false;
        let resolver = registry_with(vec![client]);

        let err = resolver.resolve(Some("c1"), &params(None)).await.unwrap_err();
        assert!(matches!(err, GrantError::InvalidClient(_)));
        assert!(err.state().is_none());
    }
}

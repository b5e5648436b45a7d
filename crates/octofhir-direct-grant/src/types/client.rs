//! OAuth 2.0 Client domain types.
//!
//! The client registry owns these records; the grant pipeline only reads
//! them for the lifetime of a single request.

use serde::{Deserialize, Serialize};

// =============================================================================
// Client
// =============================================================================

/// Registered OAuth 2.0 client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub client_id: String,

    /// Human-readable display name.
    #[serde(default)]
    pub name: String,

    /// OAuth scopes this client is allowed to request.
    /// Empty list means all scopes are allowed.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Scopes granted when a request names no scope at all.
    #[serde(default)]
    pub default_scopes: Vec<String>,

    /// Whether this is a confidential client.
    #[serde(default)]
    pub confidential: bool,

    /// Registered redirect URIs. Unused by the direct grant.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Whether this client is currently active and can be used.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Client {
    /// Creates an active public client with the given allowed scopes.
    #[must_use]
    pub fn new(client_id: impl Into<String>, scopes: Vec<String>) -> Self {
        let client_id = client_id.into();
        Self {
            name: client_id.clone(),
            client_id,
            scopes,
            default_scopes: Vec::new(),
            confidential: false,
            redirect_uris: Vec::new(),
            active: true,
        }
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Validates the client registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client id is empty, or a default scope is
    /// not among the allowed scopes of a restricted client.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ClientValidationError::EmptyClientId);
        }

        if !self.has_unrestricted_scopes() {
            if let Some(scope) = self
                .default_scopes
                .iter()
                .find(|scope| !self.scopes.contains(scope))
            {
                return Err(ClientValidationError::DefaultScopeNotAllowed(scope.clone()));
            }
        }

        Ok(())
    }

    /// Returns `true` when the client registered no scope restriction.
    #[must_use]
    pub fn has_unrestricted_scopes(&self) -> bool {
        self.scopes.is_empty()
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Errors that can occur during client validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    /// Client ID cannot be empty.
    #[error("Client ID cannot be empty")]
    EmptyClientId,

    /// Default scopes must be a subset of the allowed scopes.
    #[error("Default scope '{0}' is not among the allowed scopes")]
    DefaultScopeNotAllowed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scopes(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_client_defaults() {
        let client = Client::new("c1", scopes(&["read"]));
        assert_eq!(client.client_id, "c1");
        assert_eq!(client.name, "c1");
        assert!(client.active);
        assert!(!client.confidential);
        assert!(client.default_scopes.is_empty());
    }

    #[test]
    fn test_validate_ok() {
        let client = Client::new("c1", scopes(&["read", "write"]))
            .with_default_scopes(scopes(&["read"]));
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_id() {
        let client = Client::new("  ", vec![]);
        assert_eq!(client.validate(), Err(ClientValidationError::EmptyClientId));
    }

    #[test]
    fn test_validate_default_scope_outside_allowed() {
        let client =
            Client::new("c1", scopes(&["read"])).with_default_scopes(scopes(&["write"]));
        assert_eq!(
            client.validate(),
            Err(ClientValidationError::DefaultScopeNotAllowed(
                "write".to_string()
            ))
        );
    }

    #[test]
    fn test_unrestricted_client_accepts_any_default() {
        let client = Client::new("c1", vec![]).with_default_scopes(scopes(&["anything"]));
        assert!(client.has_unrestricted_scopes());
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "clientId": "mobile-app",
            "scopes": ["read", "write"],
            "defaultScopes": ["read"]
        }"#;

        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.client_id, "mobile-app");
        assert_eq!(client.default_scopes, scopes(&["read"]));
        assert!(client.active);
        assert!(client.name.is_empty());
    }
}

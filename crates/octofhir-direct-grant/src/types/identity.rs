//! Canonical end-user identity.

use std::collections::BTreeMap;

use serde::Serialize;

/// The end user a direct grant token is issued for.
///
/// Built once per request by the identity resolver and never mutated
/// afterwards; the consuming `with_*` methods are only meant for
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserIdentity {
    id: String,
    login: String,
    roles: Vec<String>,
    attributes: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication_scheme: Option<String>,
}

impl UserIdentity {
    /// Creates an identity whose id and login are both `login`.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            id: login.clone(),
            login,
            roles: Vec::new(),
            attributes: BTreeMap::new(),
            authentication_scheme: None,
        }
    }

    /// Sets a stable identifier distinct from the login name.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the user's roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Sets the scheme the user authenticated with.
    #[must_use]
    pub fn with_authentication_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.authentication_scheme = Some(scheme.into());
        self
    }

    /// Stable user identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Login name of the user.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Roles held by the user.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Returns `true` if the user has a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Gets an attribute value by key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// All attributes.
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.attributes
    }

    /// Scheme the user authenticated with, if known.
    #[must_use]
    pub fn authentication_scheme(&self) -> Option<&str> {
        self.authentication_scheme.as_deref()
    }
}

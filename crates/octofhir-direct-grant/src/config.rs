//! Direct grant configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [grant]
//! transport_security = "require"
//! write_optional_parameters = true
//!
//! [grant.scope]
//! partial_match = true
//! separators = ".:/"
//! ```

use serde::{Deserialize, Serialize};

/// Root configuration of the direct grant pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectGrantConfig {
    /// How insecure (non-TLS) requests are treated.
    pub transport_security: TransportSecurityMode,

    /// Scope validation settings.
    pub scope: ScopeConfig,

    /// Write optional token response fields (`issued_at`, issuer parameters).
    pub write_optional_parameters: bool,
}

impl Default for DirectGrantConfig {
    fn default() -> Self {
        Self {
            transport_security: TransportSecurityMode::Require,
            scope: ScopeConfig::default(),
            write_optional_parameters: true,
        }
    }
}

/// Transport security enforcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportSecurityMode {
    /// Reject requests that did not arrive over TLS.
    #[default]
    Require,
    /// Log a warning and continue.
    Warn,
}

/// Scope validation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Accept requested scopes that refine an allowed scope.
    /// When disabled, every requested scope must be allowed verbatim.
    pub partial_match: bool,

    /// Characters that delimit scope hierarchy levels for partial matching.
    pub separators: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            partial_match: false,
            separators: ".:/".to_string(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl DirectGrantConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if partial matching is enabled without
    /// separators, and `ConfigError::InvalidValue` if a separator is
    /// whitespace or not a valid scope character.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scope.partial_match && self.scope.separators.is_empty() {
            return Err(ConfigError::Missing(
                "scope.separators (required when scope.partial_match is enabled)".to_string(),
            ));
        }

        if let Some(invalid) = self
            .scope
            .separators
            .chars()
            .find(|c| !crate::grant::scope::is_scope_char(*c))
        {
            return Err(ConfigError::InvalidValue(format!(
                "scope.separators contains '{}', which cannot appear in a scope",
                invalid.escape_default()
            )));
        }

        Ok(())
    }
}

use std::{net::SocketAddr, time::Duration};

use octofhir_direct_grant::{Client, DirectGrantConfig};
use octofhir_direct_grant_memory::TokenIssuerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Trusted-proxy authentication
    #[serde(default)]
    pub authentication: AuthenticationSettings,
    /// Direct grant pipeline
    #[serde(default)]
    pub grant: DirectGrantConfig,
    /// In-memory token issuer
    #[serde(default)]
    pub issuer: TokenIssuerConfig,
    /// Clients registered at startup
    #[serde(default)]
    pub clients: Vec<ClientSettings>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.request_timeout.is_zero() {
            return Err("server.request_timeout must be > 0".into());
        }
        if !self.server.endpoint_path.starts_with('/') {
            return Err("server.endpoint_path must start with '/'".into());
        }
        if self.server.endpoint_path == "/healthz" {
            return Err("server.endpoint_path conflicts with /healthz".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.authentication.principal_header.trim().is_empty() {
            return Err("authentication.principal_header must not be empty".into());
        }
        self.grant
            .validate()
            .map_err(|e| format!("grant config error: {e}"))?;
        self.issuer
            .validate()
            .map_err(|e| format!("issuer config error: {e}"))?;
        for client in &self.clients {
            client
                .to_client()
                .validate()
                .map_err(|e| format!("client '{}' config error: {e}", client.client_id))?;
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Clients to register at startup.
    pub fn registered_clients(&self) -> impl Iterator<Item = Client> + '_ {
        self.clients.iter().map(ClientSettings::to_client)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
    /// Upper bound for handling a single request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Path of the direct grant endpoint
    pub endpoint_path: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8090,
            request_timeout: Duration::from_secs(30),
            endpoint_path: "/oauth/authorize-direct".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Headers set by the authenticating reverse proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationSettings {
    /// Header carrying the authenticated principal
    pub principal_header: String,
    /// Header carrying comma-separated roles
    pub roles_header: Option<String>,
    /// Honour `X-Forwarded-Proto` when deciding whether the request was secure.
    ///
    /// Off by default. Only enable it when the listener is reachable solely
    /// through the proxy that sets the header, since any direct caller could
    /// otherwise claim HTTPS.
    pub trust_forwarded_proto: bool,
}

impl Default for AuthenticationSettings {
    fn default() -> Self {
        Self {
            principal_header: "x-remote-user".into(),
            roles_header: Some("x-remote-roles".into()),
            trust_forwarded_proto: false,
        }
    }
}

/// A client registration as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub client_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub default_scopes: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ClientSettings {
    pub fn to_client(&self) -> Client {
        let mut client = Client::new(self.client_id.clone(), self.scopes.clone())
            .with_default_scopes(self.default_scopes.clone());
        if let Some(name) = &self.name {
            client = client.with_name(name.clone());
        }
        client.active = self.active;
        client
    }
}

pub mod loader {
    use super::ServerConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "direct-grant.toml";

    pub fn load_config(path: Option<&str>) -> Result<ServerConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., DIRECT_GRANT__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("DIRECT_GRANT")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: ServerConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_direct_grant::TransportSecurityMode;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = ServerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.endpoint_path, "/oauth/authorize-direct");
        assert_eq!(cfg.addr().port(), 8090);
    }

    #[test]
    fn test_forwarded_proto_untrusted_by_default() {
        let cfg = ServerConfig::default();
        assert!(!cfg.authentication.trust_forwarded_proto);

        let cfg = loader::load_config(Some("does-not-exist.toml")).unwrap();
        assert!(!cfg.authentication.trust_forwarded_proto);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().unwrap_err().contains("logging.level"));

        let mut cfg = ServerConfig::default();
        cfg.server.endpoint_path = "oauth".into();
        assert!(cfg.validate().is_err());

        let mut cfg = ServerConfig::default();
        cfg.grant.scope.partial_match = true;
        cfg.grant.scope.separators = String::new();
        assert!(cfg.validate().unwrap_err().starts_with("grant config error"));
    }

    #[test]
    fn test_invalid_client_rejected() {
        let mut cfg = ServerConfig::default();
        cfg.clients.push(ClientSettings {
            client_id: "portal".into(),
            name: None,
            scopes: vec!["read".into()],
            default_scopes: vec!["admin".into()],
            active: true,
        });
        assert!(cfg.validate().unwrap_err().contains("portal"));
    }

    #[test]
    fn test_client_settings_to_client() {
        let settings = ClientSettings {
            client_id: "portal".into(),
            name: Some("Patient Portal".into()),
            scopes: vec!["read".into(), "write".into()],
            default_scopes: vec!["read".into()],
            active: false,
        };
        let client = settings.to_client();
        assert_eq!(client.name, "Patient Portal");
        assert_eq!(client.default_scopes, vec!["read".to_string()]);
        assert!(!client.active);
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let cfg = loader::load_config(Some("does-not-exist.toml")).unwrap();
        assert_eq!(cfg.grant.transport_security, TransportSecurityMode::Require);
        assert!(cfg.clients.is_empty());
    }
}

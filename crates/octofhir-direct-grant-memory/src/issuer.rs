//! In-memory token issuer.
//!
//! Access tokens are opaque 256-bit random values. Only their SHA-256 hash
//! is kept in memory; the raw value is handed out once, in the record
//! returned from [`TokenIssuer::create_access_token`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use octofhir_direct_grant::{ConfigError, GrantRequest, IssuerError, TokenIssuer, TokenRecord};
use papaya::HashMap as PapayaHashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

/// Token issuer configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [issuer]
/// access_token_lifetime = "1h"
/// issue_refresh_tokens = false
/// token_type = "Bearer"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenIssuerConfig {
    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Issue a refresh token alongside every access token.
    pub issue_refresh_tokens: bool,

    /// Token type reported to the client.
    pub token_type: String,
}

impl Default for TokenIssuerConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(3600),
            issue_refresh_tokens: false,
            token_type: "Bearer".to_string(),
        }
    }
}

impl TokenIssuerConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero lifetime or an empty
    /// token type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "issuer.access_token_lifetime must be greater than zero".to_string(),
            ));
        }
        if self.token_type.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer.token_type cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hash a token for storage using SHA-256, hex encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a cryptographically secure random token.
///
/// Returns a 256-bit random value encoded as base64url (43 characters).
#[must_use]
pub fn generate_token() -> String {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Token issuer keeping issued tokens in a papaya lock-free map.
///
/// Stored records hold the token hashes in place of the raw values.
#[derive(Debug, Default)]
pub struct InMemoryTokenIssuer {
    config: TokenIssuerConfig,
    tokens: PapayaHashMap<String, TokenRecord>,
    issued: AtomicU64,
}

impl InMemoryTokenIssuer {
    /// Creates an issuer with the given configuration.
    #[must_use]
    pub fn new(config: TokenIssuerConfig) -> Self {
        Self {
            config,
            tokens: PapayaHashMap::new(),
            issued: AtomicU64::new(0),
        }
    }

    /// Gets the issuer configuration.
    #[must_use]
    pub fn config(&self) -> &TokenIssuerConfig {
        &self.config
    }

    /// Looks up an unexpired token by its raw access token value.
    pub fn find_by_access_token(&self, access_token: &str) -> Option<TokenRecord> {
        let record = self.tokens.pin().get(&hash_token(access_token)).cloned()?;
        (!is_expired(&record, OffsetDateTime::now_utc())).then_some(record)
    }

    /// Drops expired records. Returns how many were removed.
    ///
    /// Runs on every issuance, so the map only grows with live tokens.
    pub fn cleanup_expired(&self) -> u64 {
        let now = OffsetDateTime::now_utc();
        let tokens = self.tokens.pin();
        let before = tokens.len();
        tokens.retain(|_, record| !is_expired(record, now));
        before.saturating_sub(tokens.len()) as u64
    }

    /// Number of records currently held.
    pub fn stored_count(&self) -> usize {
        self.tokens.pin().len()
    }

    /// Total number of tokens issued since creation.
    pub fn issued_count(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

fn is_expired(record: &TokenRecord, now: OffsetDateTime) -> bool {
    let lifetime = i64::try_from(record.expires_in).unwrap_or(i64::MAX);
    record.issued_at.saturating_add(time::Duration::seconds(lifetime)) <= now
}

#[async_trait]
impl TokenIssuer for InMemoryTokenIssuer {
    async fn create_access_token(
        &self,
        grant: &GrantRequest<'_>,
    ) -> Result<TokenRecord, IssuerError> {
        let removed = self.cleanup_expired();
        if removed > 0 {
            debug!(removed, "Expired access tokens removed");
        }

        let access_token = generate_token();
        let refresh_token = self.config.issue_refresh_tokens.then(generate_token);

        let mut parameters = BTreeMap::new();
        parameters.insert("user_login".to_string(), grant.identity.login().to_string());

        let record = TokenRecord {
            token_key: access_token,
            token_type: self.config.token_type.clone(),
            refresh_token,
            expires_in: self.config.access_token_lifetime.as_secs(),
            issued_at: OffsetDateTime::now_utc(),
            scopes: grant.approved_scope.to_vec(),
            client_id: grant.client.client_id.clone(),
            subject: grant.identity.id().to_string(),
            grant_type: grant.grant_type.to_string(),
            parameters,
        };

        let key = hash_token(&record.token_key);
        let stored = TokenRecord {
            token_key: key.clone(),
            refresh_token: record.refresh_token.as_deref().map(hash_token),
            ..record.clone()
        };

        if self.tokens.pin().try_insert(key, stored).is_err() {
            return Err(IssuerError::generation(
                "Generated access token collides with an existing token",
            ));
        }
        self.issued.fetch_add(1, Ordering::Relaxed);

        debug!(
            client_id = %record.client_id,
            expires_in = record.expires_in,
            refresh_token = record.refresh_token.is_some(),
            "Access token issued"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_direct_grant::{Client, GrantBuilder, ScopeSet, UserIdentity};

    async fn issue(issuer: &InMemoryTokenIssuer) -> TokenRecord {
        let client = Client::new("c1", vec!["read".to_string()]);
        let identity = UserIdentity::new("alice").with_id("user-1");
        let scopes = ScopeSet::approve_all(vec!["read".to_string()]);
        let grant = GrantBuilder::build(&client, &identity, &scopes);

        issuer.create_access_token(&grant).await.unwrap()
    }

    #[test]
    fn test_generate_token_format() {
        let token = generate_token();
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_hash_token_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_eq!(hash_token("abc").len(), 64);
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[tokio::test]
    async fn test_issue_and_lookup() {
        let issuer = InMemoryTokenIssuer::default();
        let record = issue(&issuer).await;

        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.expires_in, 3600);
        assert_eq!(record.scopes, vec!["read".to_string()]);
        assert_eq!(record.subject, "user-1");
        assert_eq!(record.grant_type, "direct_token");
        assert!(record.refresh_token.is_none());
        assert_eq!(issuer.issued_count(), 1);

        let stored = issuer.find_by_access_token(&record.token_key).unwrap();
        assert_eq!(stored.token_key, hash_token(&record.token_key));
        assert_eq!(stored.client_id, "c1");
        assert!(issuer.find_by_access_token("unknown").is_none());
    }

    #[tokio::test]
    async fn test_refresh_tokens_are_hashed() {
        let issuer = InMemoryTokenIssuer::new(TokenIssuerConfig {
            issue_refresh_tokens: true,
            ..TokenIssuerConfig::default()
        });
        let record = issue(&issuer).await;

        let refresh = record.refresh_token.clone().unwrap();
        let stored = issuer.find_by_access_token(&record.token_key).unwrap();
        assert_eq!(stored.refresh_token, Some(hash_token(&refresh)));
    }

    #[tokio::test]
    async fn test_expired_tokens_removed_on_issue() {
        let issuer = InMemoryTokenIssuer::new(TokenIssuerConfig {
            access_token_lifetime: Duration::from_secs(1),
            ..TokenIssuerConfig::default()
        });
        let first = issue(&issuer).await;
        assert_eq!(issuer.stored_count(), 1);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(issuer.find_by_access_token(&first.token_key).is_none());

        let second = issue(&issuer).await;
        assert_eq!(issuer.stored_count(), 1);
        assert_eq!(issuer.issued_count(), 2);
        assert!(issuer.find_by_access_token(&second.token_key).is_some());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_live_tokens() {
        let issuer = InMemoryTokenIssuer::default();
        issue(&issuer).await;
        issue(&issuer).await;

        assert_eq!(issuer.cleanup_expired(), 0);
        assert_eq!(issuer.stored_count(), 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(TokenIssuerConfig::default().validate().is_ok());

        let zero = TokenIssuerConfig {
            access_token_lifetime: Duration::ZERO,
            ..TokenIssuerConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::InvalidValue(_))));

        let blank = TokenIssuerConfig {
            token_type: " ".to_string(),
            ..TokenIssuerConfig::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_humantime() {
        let config: TokenIssuerConfig =
            serde_json::from_str(r#"{"access_token_lifetime": "15m"}"#).unwrap();
        assert_eq!(config.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(config.token_type, "Bearer");
    }
}

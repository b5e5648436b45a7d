//! End-user identity resolution.
//!
//! The resolver tries, in order:
//!
//! 1. every registered [`IdentityMapper`], first one producing an identity wins
//! 2. an identity attached to the request by an upstream filter
//! 3. a default identity derived from the security context's principal

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::GrantResult;
use crate::error::GrantError;
use crate::types::{RequestContext, SecurityContext, UserIdentity};

/// Strategy that maps a request to a user identity.
///
/// Mappers receive the whole request context and are trusted to have taken
/// the security context into account. Returning `Ok(None)` passes the
/// decision to the next strategy.
///
/// # Example
///
/// ```ignore
/// struct DirectoryMapper { directory: Arc<Directory> }
///
/// #[async_trait]
/// impl IdentityMapper for DirectoryMapper {
///     async fn map_identity(
///         &self,
///         request: &RequestContext,
///     ) -> Result<Option<UserIdentity>, IdentityMappingError> {
///         let Some(login) = request.security_context().and_then(|c| c.principal_name()) else {
///             return Ok(None);
///         };
///         let entry = self.directory.lookup(login).await?;
///         Ok(entry.map(|e| UserIdentity::new(login).with_id(e.uid)))
///     }
/// }
/// ```
#[async_trait]
pub trait IdentityMapper: Send + Sync {
    /// Map the request to an identity, or `None` to defer.
    ///
    /// # Errors
    ///
    /// Returns an error when the subject cannot be established at all.
    async fn map_identity(
        &self,
        request: &RequestContext,
    ) -> Result<Option<UserIdentity>, IdentityMappingError>;
}

/// Failure of an identity mapping strategy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Identity mapping failed: {message}")]
pub struct IdentityMappingError {
    /// Description of the failure.
    pub message: String,
}

impl IdentityMappingError {
    /// Creates a new mapping error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolves the canonical identity of the authenticated end user.
#[derive(Clone, Default)]
pub struct UserIdentityResolver {
    mappers: Vec<Arc<dyn IdentityMapper>>,
}

impl UserIdentityResolver {
    /// Creates a resolver with no mapping strategies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a mapping strategy; strategies run in registration order.
    #[must_use]
    pub fn with_mapper(mut self, mapper: Arc<dyn IdentityMapper>) -> Self {
        self.mappers.push(mapper);
        self
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn mapper_count(&self) -> usize {
        self.mappers.len()
    }

    /// Resolves the identity for an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` if a mapping strategy fails.
    pub async fn resolve(
        &self,
        security_context: &SecurityContext,
        request: &RequestContext,
    ) -> GrantResult<UserIdentity> {
        for (index, mapper) in self.mappers.iter().enumerate() {
            match mapper.map_identity(request).await {
                Ok(Some(identity)) => {
                    debug!(mapper = index, "Identity produced by mapping strategy");
                    return Ok(identity);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(mapper = index, error = %e, "Identity mapping strategy failed");
                    return Err(GrantError::Unauthenticated);
                }
            }
        }

        if let Some(identity) = request.attached_identity() {
            debug!("Reusing identity attached to the request");
            return Ok(identity.clone());
        }

        default_identity(security_context)
    }
}

/// Derives the minimal identity for the security context's principal.
fn default_identity(security_context: &SecurityContext) -> GrantResult<UserIdentity> {
    let login = security_context
        .principal_name()
        .ok_or(GrantError::Unauthenticated)?;

    let identity = UserIdentity::new(login).with_roles(security_context.roles.clone());
    Ok(match &security_context.authentication_scheme {
        Some(scheme) => identity.with_authentication_scheme(scheme.clone()),
        None => identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedMapper {
        identity: Option<UserIdentity>,
        calls: AtomicUsize,
    }

    impl FixedMapper {
        fn new(identity: Option<UserIdentity>) -> Arc<Self> {
            Arc::new(Self {
                identity,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityMapper for FixedMapper {
        async fn map_identity(
            &self,
            _request: &RequestContext,
        ) -> Result<Option<UserIdentity>, IdentityMappingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.identity.clone())
        }
    }

    struct FailingMapper;

    #[async_trait]
    impl IdentityMapper for FailingMapper {
        async fn map_identity(
            &self,
            _request: &RequestContext,
        ) -> Result<Option<UserIdentity>, IdentityMappingError> {
            Err(IdentityMappingError::new("directory offline"))
        }
    }

    fn security_context() -> SecurityContext {
        SecurityContext::authenticated("alice")
            .with_roles(vec!["nurse".to_string()])
            .with_scheme("SSO")
    }

    fn request() -> RequestContext {
        RequestContext::new(FormParams::default()).with_security_context(security_context())
    }

    #[tokio::test]
    async fn test_default_identity_from_principal() {
        let resolver = UserIdentityResolver::new();
        let identity = resolver.resolve(&security_context(), &request()).await.unwrap();

        assert_eq!(identity.id(), "alice");
        assert_eq!(identity.login(), "alice");
        assert!(identity.has_role("nurse"));
        assert_eq!(identity.authentication_scheme(), Some("SSO"));
    }

    #[tokio::test]
    async fn test_default_identity_is_deterministic() {
        let resolver = UserIdentityResolver::new();
        let first = resolver.resolve(&security_context(), &request()).await.unwrap();
        let second = resolver.resolve(&security_context(), &request()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_attached_identity_is_reused() {
        let attached = UserIdentity::new("alice").with_id("user-7");
        let request = request().with_identity(attached.clone());

        let identity = UserIdentityResolver::new()
            .resolve(&security_context(), &request)
            .await
            .unwrap();
        assert_eq!(identity, attached);
    }

    #[tokio::test]
    async fn test_mapper_overrides_attached_identity() {
        let mapped = UserIdentity::new("alice").with_id("mapped");
        let resolver =
            UserIdentityResolver::new().with_mapper(FixedMapper::new(Some(mapped.clone())));
        let request = request().with_identity(UserIdentity::new("alice").with_id("attached"));

        let identity = resolver.resolve(&security_context(), &request).await.unwrap();
        assert_eq!(identity.id(), "mapped");
    }

    #[tokio::test]
    async fn test_first_producing_mapper_wins() {
        let deferring = FixedMapper::new(None);
        let first = FixedMapper::new(Some(UserIdentity::new("alice").with_id("first")));
        let second = FixedMapper::new(Some(UserIdentity::new("alice").with_id("second")));

        let resolver = UserIdentityResolver::new()
            .with_mapper(deferring.clone())
            .with_mapper(first.clone())
            .with_mapper(second.clone());
        assert_eq!(resolver.mapper_count(), 3);

        let identity = resolver.resolve(&security_context(), &request()).await.unwrap();
        assert_eq!(identity.id(), "first");
        assert_eq!(deferring.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deferring_mapper_falls_back_to_default() {
        let resolver = UserIdentityResolver::new().with_mapper(FixedMapper::new(None));
        let identity = resolver.resolve(&security_context(), &request()).await.unwrap();
        assert_eq!(identity.id(), "alice");
    }

    #[tokio::test]
    async fn test_failing_mapper_is_unauthenticated() {
        let resolver = UserIdentityResolver::new().with_mapper(Arc::new(FailingMapper));
        let err = resolver
            .resolve(&security_context(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, GrantError::Unauthenticated));
    }
}

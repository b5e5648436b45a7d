//! Direct grant orchestration.
//!
//! A request moves through the stages
//!
//! ```text
//! Start -> AuthChecked -> IdentityResolved -> ClientResolved -> ScopeValidated -> TokenIssued
//! ```
//!
//! Any failure moves it to `Failed` and ends processing; later stages never
//! run and no token is created.
//!
//! # Usage
//!
//! ```ignore
//! use octofhir_direct_grant::{DirectGrantConfig, GrantProcessor};
//!
//! let processor = GrantProcessor::new(registry, issuer, DirectGrantConfig::default())
//!     .with_identity_mapper(directory_mapper);
//!
//! let response = processor.process(&request_context).await?;
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::builder::GrantBuilder;
use super::client::ClientResolver;
use super::identity::{IdentityMapper, UserIdentityResolver};
use super::scope::{ScopeMatcher, ScopeResolver};
use super::security::validate_security_context;
use crate::GrantResult;
use crate::config::DirectGrantConfig;
use crate::error::{ErrorCategory, GrantError};
use crate::oauth::token::TokenResponse;
use crate::storage::{ClientRegistry, TokenIssuer};
use crate::types::RequestContext;

/// Processing stage of a direct grant request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStage {
    /// Nothing checked yet.
    Start,
    /// Transport and security context validated.
    AuthChecked,
    /// End-user identity resolved.
    IdentityResolved,
    /// Client resolved and active.
    ClientResolved,
    /// Requested scope validated.
    ScopeValidated,
    /// Token created.
    TokenIssued,
    /// Processing stopped with an error of the given category.
    Failed(ErrorCategory),
}

impl fmt::Display for GrantStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::AuthChecked => write!(f, "auth_checked"),
            Self::IdentityResolved => write!(f, "identity_resolved"),
            Self::ClientResolved => write!(f, "client_resolved"),
            Self::ScopeValidated => write!(f, "scope_validated"),
            Self::TokenIssued => write!(f, "token_issued"),
            Self::Failed(category) => write!(f, "failed({category})"),
        }
    }
}

/// Runs the direct grant pipeline.
///
/// Holds only immutable configuration and shared collaborators, so a single
/// instance can serve concurrent requests behind an `Arc`.
#[derive(Clone)]
pub struct GrantProcessor {
    identity_resolver: UserIdentityResolver,
    client_resolver: ClientResolver,
    scope_resolver: ScopeResolver,
    token_issuer: Arc<dyn TokenIssuer>,
    config: DirectGrantConfig,
}

impl GrantProcessor {
    /// Creates a processor.
    ///
    /// Partial scope matching uses the hierarchical matcher configured by
    /// `config.scope`.
    #[must_use]
    pub fn new(
        registry: Arc<dyn ClientRegistry>,
        token_issuer: Arc<dyn TokenIssuer>,
        config: DirectGrantConfig,
    ) -> Self {
        Self {
            identity_resolver: UserIdentityResolver::new(),
            client_resolver: ClientResolver::new(registry),
            scope_resolver: ScopeResolver::from_config(&config.scope),
            token_issuer,
            config,
        }
    }

    /// Appends an identity mapping strategy.
    #[must_use]
    pub fn with_identity_mapper(mut self, mapper: Arc<dyn IdentityMapper>) -> Self {
        self.identity_resolver = self.identity_resolver.with_mapper(mapper);
        self
    }

    /// Replaces the matcher used in partial scope mode.
    #[must_use]
    pub fn with_scope_matcher(mut self, matcher: Arc<dyn ScopeMatcher>) -> Self {
        self.scope_resolver = ScopeResolver::new(matcher);
        self
    }

    /// Gets the processor configuration.
    #[must_use]
    pub fn config(&self) -> &DirectGrantConfig {
        &self.config
    }

    /// Processes a direct grant request.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails:
    /// - `InsecureTransport` / `Unauthenticated` from the security check
    /// - `Unauthenticated` if an identity mapping strategy fails
    /// - `InvalidClient` from client resolution
    /// - `InvalidScope` from scope validation
    /// - `IssuanceFailure` if the token issuer fails
    ///
    /// # Security
    ///
    /// Token values and the `state` parameter are never logged.
    pub async fn process(&self, request: &RequestContext) -> GrantResult<TokenResponse> {
        let span = info_span!(
            "direct_grant",
            request_id = %Uuid::new_v4(),
            client_id = tracing::field::Empty,
        );

        async {
            let mut stage = GrantStage::Start;
            let result = self.run(request, &mut stage).await;

            match &result {
                Ok(response) => {
                    info!(
                        scope = %response.scope,
                        expires_in = response.expires_in,
                        "Direct grant token issued"
                    );
                }
                Err(e) => {
                    let reached = stage;
                    stage = GrantStage::Failed(e.category());
                    warn!(
                        reached = %reached,
                        stage = %stage,
                        error = %e,
                        "Direct grant request failed"
                    );
                }
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &RequestContext,
        stage: &mut GrantStage,
    ) -> GrantResult<TokenResponse> {
        let security_context =
            validate_security_context(request, self.config.transport_security)?;
        advance(stage, GrantStage::AuthChecked);

        let identity = self
            .identity_resolver
            .resolve(security_context, request)
            .await?;
        advance(stage, GrantStage::IdentityResolved);

        let params = request.params();
        let client = self
            .client_resolver
            .resolve(params.client_id(), params)
            .await?;
        tracing::Span::current().record("client_id", client.client_id.as_str());
        advance(stage, GrantStage::ClientResolved);

        let scopes = self.scope_resolver.resolve(
            &client,
            params.scope(),
            self.config.scope.partial_match,
            params.state(),
        )?;
        advance(stage, GrantStage::ScopeValidated);

        let grant = GrantBuilder::build(&client, &identity, &scopes);
        let record = self
            .token_issuer
            .create_access_token(&grant)
            .await
            .map_err(|e| GrantError::issuance_failure(e.to_string()))?;
        advance(stage, GrantStage::TokenIssued);

        Ok(TokenResponse::from_record(
            &record,
            scopes.approved(),
            params.state().map(str::to_string),
            self.config.write_optional_parameters,
        ))
    }
}

fn advance(stage: &mut GrantStage, next: GrantStage) {
    debug!(from = %stage, to = %next, "Direct grant stage reached");
    *stage = next;
}

//! Scope parsing and validation.
//!
//! Requested scopes are validated against the client's allowed scopes either
//! verbatim (exact mode) or through a [`ScopeMatcher`] (partial mode).
//!
//! # Partial Matching
//!
//! The default [`HierarchicalScopeMatcher`] treats scopes as paths whose
//! levels are separated by one of a configurable set of characters. A
//! requested scope is covered by an allowed scope when it equals it or
//! extends it at a level boundary:
//!
//! | allowed | requested | partial match |
//! |---|---|---|
//! | `read` | `read` | yes |
//! | `read` | `read.contacts` | yes |
//! | `patient/` | `patient/Observation` | yes |
//! | `read` | `readonly` | no |
//! | `read.contacts` | `read` | no |

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::GrantResult;
use crate::config::ScopeConfig;
use crate::error::GrantError;
use crate::types::Client;

// =============================================================================
// Matching Strategies
// =============================================================================

/// Relation between a requested scope and an allowed scope.
pub trait ScopeMatcher: Send + Sync + fmt::Debug {
    /// Returns `true` if `allowed` covers `requested`.
    fn matches(&self, requested: &str, allowed: &str) -> bool;
}

/// Verbatim comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactScopeMatcher;

impl ScopeMatcher for ExactScopeMatcher {
    fn matches(&self, requested: &str, allowed: &str) -> bool {
        requested == allowed
    }
}

/// Separator-bounded prefix comparison.
#[derive(Debug, Clone)]
pub struct HierarchicalScopeMatcher {
    separators: Vec<char>,
}

impl HierarchicalScopeMatcher {
    /// Creates a matcher with the given level separators.
    #[must_use]
    pub fn new(separators: impl IntoIterator<Item = char>) -> Self {
        Self {
            separators: separators.into_iter().collect(),
        }
    }

    fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }
}

impl Default for HierarchicalScopeMatcher {
    fn default() -> Self {
        Self::new(ScopeConfig::default().separators.chars())
    }
}

impl ScopeMatcher for HierarchicalScopeMatcher {
    fn matches(&self, requested: &str, allowed: &str) -> bool {
        let Some(rest) = requested.strip_prefix(allowed) else {
            return false;
        };

        rest.is_empty()
            || allowed.chars().last().is_some_and(|c| self.is_separator(c))
            || rest.chars().next().is_some_and(|c| self.is_separator(c))
    }
}

// =============================================================================
// Scope Set
// =============================================================================

/// Scopes requested by the client and approved for the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    requested: Vec<String>,
    approved: Vec<String>,
}

impl ScopeSet {
    /// Creates a scope set where every requested scope is approved.
    ///
    /// The direct grant has no consent step, so nothing is narrowed.
    #[must_use]
    pub fn approve_all(requested: Vec<String>) -> Self {
        Self {
            approved: requested.clone(),
            requested,
        }
    }

    /// Requested scopes, in request order.
    #[must_use]
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Approved scopes, in request order.
    #[must_use]
    pub fn approved(&self) -> &[String] {
        &self.approved
    }

    /// Returns `true` if no scope was approved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.approved.is_empty()
    }
}

/// Returns `true` if `c` may appear in a scope token (RFC 6749 Section 3.3).
#[must_use]
pub fn is_scope_char(c: char) -> bool {
    matches!(c, '\x21' | '\x23'..='\x5B' | '\x5D'..='\x7E')
}

/// Splits a scope string into tokens, preserving order and dropping repeats.
///
/// # Errors
///
/// Returns the first token containing characters outside the scope-token
/// grammar.
pub fn parse_scope(scope: Option<&str>) -> Result<Vec<String>, String> {
    let mut tokens: Vec<String> = Vec::new();

    for token in scope.unwrap_or_default().split_whitespace() {
        if !token.chars().all(is_scope_char) {
            return Err(token.to_string());
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }

    Ok(tokens)
}

// =============================================================================
// Scope Resolver
// =============================================================================

/// Reconciles requested scopes with a client's registration.
#[derive(Debug, Clone)]
pub struct ScopeResolver {
    partial_matcher: Arc<dyn ScopeMatcher>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new(Arc::new(HierarchicalScopeMatcher::default()))
    }
}

impl ScopeResolver {
    /// Creates a resolver using `partial_matcher` in partial mode.
    #[must_use]
    pub fn new(partial_matcher: Arc<dyn ScopeMatcher>) -> Self {
        Self { partial_matcher }
    }

    /// Creates a resolver from configuration.
    #[must_use]
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self::new(Arc::new(HierarchicalScopeMatcher::new(
            config.separators.chars(),
        )))
    }

    /// Resolves the scope of a direct grant.
    ///
    /// An absent or blank scope resolves to the client's default scopes,
    /// which are checked against the allowed scopes like requested ones.
    ///
    /// # Errors
    ///
    /// Returns `InvalidScope`, carrying `state`, if a token is malformed or
    /// not allowed for the client.
    pub fn resolve(
        &self,
        client: &Client,
        requested_scope: Option<&str>,
        partial_match_allowed: bool,
        state: Option<&str>,
    ) -> GrantResult<ScopeSet> {
        let requested = parse_scope(requested_scope).map_err(|token| {
            GrantError::invalid_scope(
                format!("Scope '{token}' contains invalid characters"),
                state.map(str::to_string),
            )
        })?;

        let requested = if requested.is_empty() {
            debug!(
                client_id = %client.client_id,
                default_scopes = client.default_scopes.len(),
                "No scope requested, using client defaults"
            );
            client.default_scopes.clone()
        } else {
            requested
        };

        if !client.has_unrestricted_scopes() {
            let matcher: &dyn ScopeMatcher = if partial_match_allowed {
                self.partial_matcher.as_ref()
            } else {
                &ExactScopeMatcher
            };

            if let Some(rejected) = requested
                .iter()
                .find(|scope| !is_allowed(matcher, scope, &client.scopes))
            {
                return Err(GrantError::invalid_scope(
                    format!("Scope '{rejected}' is not allowed for this client"),
                    state.map(str::to_string),
                ));
            }
        }

        Ok(ScopeSet::approve_all(requested))
    }
}

fn is_allowed(matcher: &dyn ScopeMatcher, requested: &str, allowed: &[String]) -> bool {
    allowed
        .iter()
        .any(|candidate| requested == candidate.as_str() || matcher.matches(requested, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::ErrorCode;

    fn client(allowed: &[&str]) -> Client {
        Client::new("c1", allowed.iter().map(|s| s.to_string()).collect())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_scope() {
        assert_eq!(
            parse_scope(Some("read  write\tprofile")).unwrap(),
            strings(&["read", "write", "profile"])
        );
        assert_eq!(parse_scope(Some("read read write")).unwrap(), strings(&["read", "write"]));
        assert!(parse_scope(None).unwrap().is_empty());
        assert!(parse_scope(Some("   ")).unwrap().is_empty());
        assert_eq!(parse_scope(Some("read wr\"ite")).unwrap_err(), "wr\"ite");
    }

    #[test]
    fn test_exact_mode_preserves_order() {
        let resolver = ScopeResolver::default();
        let scopes = resolver
            .resolve(&client(&["read", "write"]), Some("write read"), false, None)
            .unwrap();

        assert_eq!(scopes.requested(), strings(&["write", "read"]).as_slice());
        assert_eq!(scopes.approved(), scopes.requested());
    }

    #[test]
    fn test_exact_mode_rejects_unknown_scope() {
        let resolver = ScopeResolver::default();
        let err = resolver
            .resolve(&client(&["read", "write"]), Some("read admin"), false, Some("s1"))
            .unwrap_err();

        let record = err.error_record().unwrap();
        assert_eq!(record.error, ErrorCode::InvalidScope);
        assert_eq!(record.state.as_deref(), Some("s1"));
        assert!(record.error_description.as_deref().unwrap().contains("admin"));
    }

    #[test]
    fn test_narrower_scope_needs_partial_mode() {
        let resolver = ScopeResolver::default();
        let client = client(&["read", "write"]);

        let err = resolver.resolve(&client, Some("read.contacts"), false, None);
        assert!(matches!(err, Err(GrantError::InvalidScope(_))));

        let scopes = resolver
            .resolve(&client, Some("read.contacts"), true, None)
            .unwrap();
        assert_eq!(scopes.approved(), strings(&["read.contacts"]).as_slice());
    }

    #[test]
    fn test_partial_mode_still_accepts_exact() {
        let resolver = ScopeResolver::default();
        let scopes = resolver
            .resolve(&client(&["read"]), Some("read"), true, None)
            .unwrap();
        assert_eq!(scopes.approved(), strings(&["read"]).as_slice());
    }

    #[test]
    fn test_empty_scope_uses_defaults() {
        let resolver = ScopeResolver::default();
        let client = client(&["read", "write"]).with_default_scopes(strings(&["read"]));

        let scopes = resolver.resolve(&client, None, false, None).unwrap();
        assert_eq!(scopes.approved(), strings(&["read"]).as_slice());

        let scopes = resolver.resolve(&client, Some(""), false, None).unwrap();
        assert_eq!(scopes.requested(), strings(&["read"]).as_slice());
    }

    #[test]
    fn test_defaults_outside_allowed_scopes_rejected() {
        // Registries other than the in-memory one may skip client validation
        let client = client(&["read"]).with_default_scopes(strings(&["admin"]));

        let err = ScopeResolver::default()
            .resolve(&client, None, false, Some("s1"))
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), ErrorCode::InvalidScope);
        assert_eq!(err.state(), Some("s1"));
    }

    #[test]
    fn test_empty_scope_without_defaults_is_empty() {
        let resolver = ScopeResolver::default();
        let scopes = resolver.resolve(&client(&["read"]), None, false, None).unwrap();
        assert!(scopes.is_empty());
    }

    #[test]
    fn test_unrestricted_client_accepts_anything() {
        let resolver = ScopeResolver::default();
        let scopes = resolver
            .resolve(&client(&[]), Some("anything goes"), false, None)
            .unwrap();
        assert_eq!(scopes.approved(), strings(&["anything", "goes"]).as_slice());
    }

    #[test]
    fn test_malformed_scope_rejected() {
        let resolver = ScopeResolver::default();
        let err = resolver
            .resolve(&client(&[]), Some("read\\write"), false, Some("s2"))
            .unwrap_err();
        assert!(matches!(err, GrantError::InvalidScope(_)));
        assert_eq!(err.state(), Some("s2"));
    }

    #[test]
    fn test_hierarchical_matcher() {
        let matcher = HierarchicalScopeMatcher::default();
        assert!(matcher.matches("read", "read"));
        assert!(matcher.matches("read.contacts", "read"));
        assert!(matcher.matches("read:contacts", "read"));
        assert!(matcher.matches("patient/Observation", "patient/"));
        assert!(!matcher.matches("readonly", "read"));
        assert!(!matcher.matches("read", "read.contacts"));
        assert!(!matcher.matches("write.contacts", "read"));
    }

    #[test]
    fn test_custom_separators() {
        let matcher = HierarchicalScopeMatcher::new(['-']);
        assert!(matcher.matches("read-all", "read"));
        assert!(!matcher.matches("read.all", "read"));
    }

    #[derive(Debug)]
    struct SuffixMatcher;

    impl ScopeMatcher for SuffixMatcher {
        fn matches(&self, requested: &str, allowed: &str) -> bool {
            requested.ends_with(allowed)
        }
    }

    #[test]
    fn test_custom_matcher_is_used_in_partial_mode() {
        let resolver = ScopeResolver::new(Arc::new(SuffixMatcher));
        let client = client(&["contacts"]);

        assert!(resolver.resolve(&client, Some("read.contacts"), true, None).is_ok());
        assert!(resolver.resolve(&client, Some("read.contacts"), false, None).is_err());
    }
}

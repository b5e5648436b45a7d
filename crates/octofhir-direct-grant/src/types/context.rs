//! Request-scoped context handed to the grant pipeline.
//!
//! Authentication is established out-of-band: upstream middleware attaches a
//! [`SecurityContext`] (and optionally a [`UserIdentity`]) to the request
//! before the direct grant endpoint runs.

use axum::http::HeaderMap;

use super::identity::UserIdentity;

// =============================================================================
// Security Context
// =============================================================================

/// Authenticated principal attached to the request by upstream middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    /// Name of the authenticated principal.
    pub principal: Option<String>,

    /// Roles granted to the principal.
    pub roles: Vec<String>,

    /// Authentication scheme (e.g. "BASIC", "CLIENT_CERT", "SSO").
    pub authentication_scheme: Option<String>,
}

impl SecurityContext {
    /// Creates a context for an authenticated principal.
    #[must_use]
    pub fn authenticated(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            ..Self::default()
        }
    }

    /// Sets the principal's roles.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    /// Sets the authentication scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.authentication_scheme = Some(scheme.into());
        self
    }

    /// Returns the principal name if it is present and non-empty.
    #[must_use]
    pub fn principal_name(&self) -> Option<&str> {
        self.principal
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns `true` if the principal holds the given role.
    #[must_use]
    pub fn is_user_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Whether the request arrived over a secure channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportSecurity {
    /// TLS (directly or terminated by a trusted proxy).
    Secure,
    /// Plain text, or unknown.
    #[default]
    Insecure,
}

impl TransportSecurity {
    /// Returns `true` for [`TransportSecurity::Secure`].
    #[must_use]
    pub fn is_secure(self) -> bool {
        matches!(self, Self::Secure)
    }
}

// =============================================================================
// Form Parameters
// =============================================================================

/// Well-known form parameter names.
pub mod params {
    /// Client identifier.
    pub const CLIENT_ID: &str = "client_id";
    /// Requested scope.
    pub const SCOPE: &str = "scope";
    /// Correlation state.
    pub const STATE: &str = "state";
}

/// Decoded form parameters, in request order.
///
/// Parameters may repeat; lookups return the first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    pairs: Vec<(String, String)>,
}

impl FormParams {
    /// Creates parameters from decoded name/value pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all values of a parameter.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The `client_id` parameter.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.first(params::CLIENT_ID)
    }

    /// The `scope` parameter.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.first(params::SCOPE)
    }

    /// The `state` parameter.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.first(params::STATE)
    }

    /// Returns `true` if no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Everything the pipeline knows about the inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    security_context: Option<SecurityContext>,
    transport: TransportSecurity,
    params: FormParams,
    attached_identity: Option<UserIdentity>,
    headers: HeaderMap,
}

impl RequestContext {
    /// Creates a context for the given form parameters.
    ///
    /// The transport is assumed insecure and no security context is set.
    #[must_use]
    pub fn new(params: FormParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Attaches the security context.
    #[must_use]
    pub fn with_security_context(mut self, context: SecurityContext) -> Self {
        self.security_context = Some(context);
        self
    }

    /// Sets the transport security.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportSecurity) -> Self {
        self.transport = transport;
        self
    }

    /// Attaches an identity produced by an upstream filter.
    #[must_use]
    pub fn with_identity(mut self, identity: UserIdentity) -> Self {
        self.attached_identity = Some(identity);
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The security context, if any.
    #[must_use]
    pub fn security_context(&self) -> Option<&SecurityContext> {
        self.security_context.as_ref()
    }

    /// The transport security of the request.
    #[must_use]
    pub fn transport(&self) -> TransportSecurity {
        self.transport
    }

    /// The decoded form parameters.
    #[must_use]
    pub fn params(&self) -> &FormParams {
        &self.params
    }

    /// An identity attached upstream, if any.
    #[must_use]
    pub fn attached_identity(&self) -> Option<&UserIdentity> {
        self.attached_identity.as_ref()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use octofhir_direct_grant::{SecurityContext, TransportSecurity};

use crate::config::AuthenticationSettings;

const AUTHENTICATION_SCHEME: &str = "TRUSTED_PROXY";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

// =============================================================================
// Trusted Proxy Authentication
// =============================================================================

/// Reads the identity asserted by an authenticating reverse proxy.
#[derive(Debug, Clone)]
pub struct TrustedProxyAuth {
    principal_header: HeaderName,
    roles_header: Option<HeaderName>,
    trust_forwarded_proto: bool,
}

impl TrustedProxyAuth {
    pub fn from_settings(settings: &AuthenticationSettings) -> anyhow::Result<Self> {
        let principal_header = HeaderName::from_bytes(settings.principal_header.trim().as_bytes())?;
        let roles_header = settings
            .roles_header
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .transpose()?;

        Ok(Self {
            principal_header,
            roles_header,
            trust_forwarded_proto: settings.trust_forwarded_proto,
        })
    }

    /// Builds the security context from the proxy headers, if a principal is present.
    pub fn security_context(&self, headers: &HeaderMap) -> Option<SecurityContext> {
        let principal = headers
            .get(&self.principal_header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|p| !p.is_empty())?;

        let roles = self
            .roles_header
            .as_ref()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(
            SecurityContext::authenticated(principal)
                .with_roles(roles)
                .with_scheme(AUTHENTICATION_SCHEME),
        )
    }

    /// Determines whether the request reached the proxy over TLS.
    pub fn transport_security<B>(&self, req: &Request<B>) -> TransportSecurity {
        if req.uri().scheme_str() == Some("https") {
            return TransportSecurity::Secure;
        }

        let forwarded_https = self.trust_forwarded_proto
            && req
                .headers()
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));

        if forwarded_https {
            TransportSecurity::Secure
        } else {
            TransportSecurity::Insecure
        }
    }
}

/// Attaches `TransportSecurity` and, when the proxy asserted a principal,
/// `SecurityContext` to the request extensions.
///
/// Requests without a principal pass through; the grant endpoint rejects them.
pub async fn trusted_proxy_middleware(
    State(auth): State<Arc<TrustedProxyAuth>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let transport = auth.transport_security(&req);
    req.extensions_mut().insert(transport);

    match auth.security_context(req.headers()) {
        Some(context) => {
            tracing::debug!(
                principal = context.principal.as_deref().unwrap_or_default(),
                roles = context.roles.len(),
                "Principal asserted by trusted proxy"
            );
            req.extensions_mut().insert(context);
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "No principal header");
        }
    }

    next.run(req).await
}

//! Transport and authentication checks run before any grant work.

use tracing::warn;

use crate::GrantResult;
use crate::config::TransportSecurityMode;
use crate::error::GrantError;
use crate::types::{RequestContext, SecurityContext};

/// Checks transport security, then returns the authenticated context.
///
/// The transport check always runs first, regardless of whether the request
/// is authenticated.
///
/// # Errors
///
/// - `InsecureTransport` if the request is not secure and the mode is
///   [`TransportSecurityMode::Require`]
/// - `Unauthenticated` if no security context or principal is present
pub fn validate_security_context(
    request: &RequestContext,
    mode: TransportSecurityMode,
) -> GrantResult<&SecurityContext> {
    check_transport_security(request, mode)?;

    request
        .security_context()
        .filter(|ctx| ctx.principal_name().is_some())
        .ok_or(GrantError::Unauthenticated)
}

fn check_transport_security(
    request: &RequestContext,
    mode: TransportSecurityMode,
) -> GrantResult<()> {
    if request.transport().is_secure() {
        return Ok(());
    }

    match mode {
        TransportSecurityMode::Require => Err(GrantError::InsecureTransport),
        TransportSecurityMode::Warn => {
            warn!("Insecure HTTP request, Transport Layer Security is recommended");
            Ok(())
        }
    }
}

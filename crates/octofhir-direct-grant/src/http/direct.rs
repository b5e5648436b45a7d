//! Direct grant endpoint handler.
//!
//! ```ignore
//! POST /oauth/authorize-direct
//! Content-Type: application/x-www-form-urlencoded
//!
//! client_id=portal&scope=read%20write&state=af0ifjsldkj
//! ```
//!
//! The caller must already be authenticated: upstream middleware attaches a
//! [`SecurityContext`] and the [`TransportSecurity`] of the connection as
//! request extensions.

use std::sync::Arc;

use axum::{
    Extension, Form, Json,
    extract::{State, rejection::FormRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::GrantError;
use crate::grant::{GrantProcessor, validate_security_context};
use crate::oauth::token::TokenResponse;
use crate::types::{FormParams, RequestContext, SecurityContext, TransportSecurity, UserIdentity};

/// State required for the direct grant endpoint.
#[derive(Clone)]
pub struct DirectGrantState {
    processor: Arc<GrantProcessor>,
}

impl DirectGrantState {
    /// Creates the endpoint state.
    pub fn new(processor: Arc<GrantProcessor>) -> Self {
        Self { processor }
    }

    /// The shared processor.
    pub fn processor(&self) -> &Arc<GrantProcessor> {
        &self.processor
    }
}

/// Direct grant endpoint handler.
///
/// # Responses
///
/// - `200 OK` with the token response
/// - `400 Bad Request` with an OAuth error body for client and scope errors
/// - `400 Bad Request` with no body for insecure transport
/// - `401 Unauthorized` with no body for unauthenticated requests
/// - `500 Internal Server Error` with no body if the token issuer fails
///
/// A body that is not a valid form is only reported once the transport and
/// authentication checks have passed.
pub async fn direct_grant_handler(
    State(state): State<DirectGrantState>,
    security_context: Option<Extension<SecurityContext>>,
    transport: Option<Extension<TransportSecurity>>,
    identity: Option<Extension<UserIdentity>>,
    headers: HeaderMap,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let (pairs, rejection) = match form {
        Ok(Form(pairs)) => (pairs, None),
        Err(rejection) => (Vec::new(), Some(rejection)),
    };

    let mut request = RequestContext::new(FormParams::from_pairs(pairs)).with_headers(headers);
    if let Some(Extension(context)) = security_context {
        request = request.with_security_context(context);
    }
    if let Some(Extension(transport)) = transport {
        request = request.with_transport(transport);
    }
    if let Some(Extension(identity)) = identity {
        request = request.with_identity(identity);
    }

    if let Some(rejection) = rejection {
        let mode = state.processor.config().transport_security;
        if let Err(e) = validate_security_context(&request, mode) {
            return e.into_response();
        }
        tracing::debug!(error = %rejection, "Malformed direct grant request body");
        return rejection.into_response();
    }

    match state.processor.process(&request).await {
        Ok(response) => token_success_response(response),
        Err(e) => e.into_response(),
    }
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(response),
    )
        .into_response()
}

impl IntoResponse for GrantError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self {
            Self::InvalidClient(record) | Self::InvalidScope(record) => (
                status,
                [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
                Json(record),
            )
                .into_response(),
            Self::InsecureTransport | Self::Unauthenticated | Self::IssuanceFailure { .. } => {
                status.into_response()
            }
        }
    }
}

//! Request-time authentication.
//!
//! Every gated request walks one path:
//!
//! ```text
//! Unauthenticated -- no bearer credential --------------------> Rejected
//! Unauthenticated -- bearer token --> TokenPresented --resolve--> Authenticated | Rejected
//! ```
//!
//! There is no retry inside a request; a client presents a (possibly
//! refreshed) token on a new request.
//!
//! # Invariants
//! - A request without a bearer credential never reaches the provider.
//! - Provider-side failure reasons are logged, never returned to the client.

use std::fmt;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::SecretString;
use serde_json::json;

use super::identity::LocalIdentity;
use super::resolver::IdentityResolver;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// No `Authorization: Bearer <token>` header.
    #[error("no bearer credential")]
    NoCredential,
    /// The token did not resolve to an identity.
    #[error("unauthorized")]
    Unauthorized,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "statusCode": StatusCode::UNAUTHORIZED.as_u16(),
            "message": "Unauthorized",
        }));
        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

/// Identity attached to an authenticated request.
///
/// Lives for one request and is never cached.
#[derive(Clone)]
pub struct AuthenticatedPrincipal {
    pub identity: LocalIdentity,
    /// The presented token, for downstream authorization checks.
    pub token: SecretString,
}

impl fmt::Debug for AuthenticatedPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedPrincipal")
            .field("identity", &self.identity)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedPrincipal {
    type Rejection = Rejection;

    /// Read the principal that `require_principal` attached.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(Rejection::NoCredential)
    }
}

/// Entry point that turns request headers into a principal.
#[derive(Clone)]
pub struct AuthGate {
    resolver: Arc<dyn IdentityResolver>,
}

impl AuthGate {
    #[must_use]
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Authenticate a request from its headers.
    ///
    /// # Errors
    ///
    /// - `Rejection::NoCredential` if there is no usable bearer token; the
    ///   resolver is not called
    /// - `Rejection::Unauthorized` if the resolver fails for any reason
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedPrincipal, Rejection> {
        let Some(token) = extract_bearer_token(headers) else {
            tracing::debug!("request rejected: no bearer credential");
            return Err(Rejection::NoCredential);
        };

        match self.resolver.resolve(token).await {
            Ok(identity) => {
                tracing::debug!(user_id = identity.id, "request authenticated");
                Ok(AuthenticatedPrincipal {
                    identity,
                    token: SecretString::from(token.to_string()),
                })
            }
            Err(failure) => {
                tracing::warn!("request rejected: {failure}");
                Err(Rejection::Unauthorized)
            }
        }
    }
}

/// Middleware that authenticates the request and attaches the principal.
///
/// Handlers behind it take `AuthenticatedPrincipal` as an extractor.
pub async fn require_principal(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    let principal = gate.authenticate(request.headers()).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; a blank token counts as absent.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

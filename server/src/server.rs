// Life of a request:
// 1. Public routes (/health) are answered directly
// 2. Every other route passes `require_principal`:
//     - No bearer token: 401, the provider is never contacted
//     - Token: resolved against the identity provider, then mapped to a
//       local identity (created on first contact)
//     - Resolution failure of any kind: uniform 401
// 3. Handlers receive the `AuthenticatedPrincipal` as an extractor
//
// With USE_API_PREFIX=true all routes live under /api. CORS preflight
// requests are answered before routing and never reach the gate.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{
    AuthGate, AuthenticatedPrincipal, JwtError, LocalIdentity, ProviderResolver, SessionKeys,
    UserStore, require_principal,
};
use crate::config::ServerConfig;

/// Failure to assemble the request-serving state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("could not build the identity provider client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("could not set up session signing: {0}")]
    Session(#[from] JwtError),
}

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub sessions: SessionKeys,
    pub sub_system_sessions: SessionKeys,
    /// Log every request and response at `info`.
    pub request_logging: bool,
}

impl AppState {
    /// Wire the deployment's provider resolver, gate and session keys.
    pub fn from_config(
        config: &ServerConfig,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, StartupError> {
        let resolver = ProviderResolver::new(&config.provider, users)?;
        Ok(Self {
            gate: Arc::new(AuthGate::new(Arc::new(resolver))),
            sessions: SessionKeys::from_settings(&config.session)?,
            sub_system_sessions: SessionKeys::sub_system_from_settings(&config.session)?,
            request_logging: config.use_info_logger,
        })
    }
}

/// Build the HTTP router. `prefix` is either empty or `/api`.
pub fn router(state: AppState, prefix: &str) -> Router {
    let request_logging = state.request_logging;

    let gated = Router::new()
        .route("/user/me", get(current_user))
        .route("/auth/session", get(issue_session))
        .route("/auth/sub-system-token", post(issue_sub_system_token))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.gate),
            require_principal,
        ));

    let routes = Router::new()
        .route("/health", get(health))
        .merge(gated)
        .with_state(state);

    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    let app = app.layer(cors_layer());

    if request_logging {
        app.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
    } else {
        app
    }
}

/// Browser clients may call the API from any origin; credentials travel in
/// the `Authorization` header, not in cookies.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn current_user(principal: AuthenticatedPrincipal) -> Json<LocalIdentity> {
    Json(principal.identity)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    token: String,
    expires_in: u64,
}

async fn issue_session(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Json<SessionResponse>, StatusCode> {
    issue_token(&state.sessions, &principal.identity)
}

async fn issue_sub_system_token(
    State(state): State<AppState>,
    principal: AuthenticatedPrincipal,
) -> Result<Json<SessionResponse>, StatusCode> {
    issue_token(&state.sub_system_sessions, &principal.identity)
}

fn issue_token(
    keys: &SessionKeys,
    identity: &LocalIdentity,
) -> Result<Json<SessionResponse>, StatusCode> {
    let token = keys.issue(identity).map_err(|e| {
        tracing::error!(scope = ?keys.scope(), "failed to issue token: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(SessionResponse {
        token,
        expires_in: keys.expires_in().as_secs(),
    }))
}

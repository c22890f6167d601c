//! Common helpers for end-to-end tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header::AUTHORIZATION};
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{InMemoryUserStore, ProviderKind};
use crate::config::{ConfigSnapshot, ServerConfig, keys, preflight};
use crate::server::{AppState, router};
use crate::testing::{StubProvider, valid_snapshot};

/// A fully wired server talking to a stub provider.
pub struct TestApp {
    pub stub: StubProvider,
    pub users: Arc<InMemoryUserStore>,
    pub config: ServerConfig,
    app: Router,
}

impl TestApp {
    /// Start a generic-OAuth deployment without the `/api` prefix.
    pub async fn new() -> Self {
        Self::with(ProviderKind::Generic, false).await
    }

    pub async fn with(kind: ProviderKind, use_api_prefix: bool) -> Self {
        Self::with_env(kind, |snapshot| {
            snapshot.set(keys::USE_API_PREFIX, use_api_prefix.to_string());
        })
        .await
    }

    /// Start a deployment for `kind` after letting `edit` adjust the
    /// environment. The provider resource URL always points at the stub.
    pub async fn with_env(kind: ProviderKind, edit: impl FnOnce(&mut ConfigSnapshot)) -> Self {
        let stub = StubProvider::start().await;

        let mut snapshot = valid_snapshot(kind);
        snapshot.set(kind.keys().resource_api_url, stub.resource_url());
        edit(&mut snapshot);
        let config = preflight::run(&snapshot).expect("valid test environment");

        let users = Arc::new(InMemoryUserStore::new());
        let state = AppState::from_config(&config, users.clone()).expect("app state");
        let app = router(state, config.route_prefix());

        Self {
            stub,
            users,
            config,
            app,
        }
    }

    /// Send `GET path` with an optional raw `Authorization` header value.
    pub async fn get(&self, path: &str, authorization: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(Method::GET).uri(path);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = self.send(request.body(Body::empty()).expect("request")).await;
        read_json(response).await
    }

    /// `GET path` with `Authorization: Bearer <token>`.
    pub async fn get_as(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.get(path, Some(&format!("Bearer {token}"))).await
    }

    /// `POST path` with an empty body and `Authorization: Bearer <token>`.
    pub async fn post_as(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .expect("request");
        read_json(self.send(request).await).await
    }

    /// Send a prepared request and return the raw response.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.expect("response")
    }

    pub fn stored_users(&self) -> usize {
        self.users.len().expect("user count")
    }
}

async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

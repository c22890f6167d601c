//! Bearer token to local identity resolution.
//!
//! # Pre-conditions
//! - The resolver is built once at startup for the deployment's provider.
//!
//! # Post-conditions
//! - A successful resolution returns a stored `LocalIdentity`; the first
//!   resolution of an unseen external id creates it.
//!
//! # Invariants
//! - Stored identities are never overwritten from a provider response.
//! - A lost creation race is recovered by re-reading the winner's record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};

use super::identity::{LocalIdentity, NewIdentity, UserStore, UserStoreError};
use super::profile::{ProviderKind, ProviderProfile};
use crate::config::ProviderSettings;

/// Why a token could not be resolved. Never shown to the client as-is.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// The provider refused the token, timed out, was unreachable, or sent
    /// a body that is not a profile.
    #[error("identity provider rejected the token: {0}")]
    ProviderRejected(String),
    /// The user store failed for a reason other than a uniqueness conflict.
    #[error("user store failed: {0}")]
    Store(#[from] UserStoreError),
}

/// Resolves a bearer token into the local identity of its owner.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// # Arguments
    ///
    /// * `token` - The raw bearer token (without the "Bearer " prefix)
    async fn resolve(&self, token: &str) -> Result<LocalIdentity, AuthFailure>;
}

/// `IdentityResolver` that asks the configured provider's resource endpoint.
pub struct ProviderResolver {
    kind: ProviderKind,
    resource_url: String,
    http: reqwest::Client,
    users: Arc<dyn UserStore>,
}

impl ProviderResolver {
    /// Build a resolver for the deployment's provider.
    ///
    /// # Errors
    ///
    /// Returns the client builder error if the HTTP client cannot be set up.
    pub fn new(
        settings: &ProviderSettings,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(
            settings.kind,
            settings.resource_api_url.clone(),
            settings.timeout,
            users,
        )
    }

    /// Build a resolver from its parts.
    pub fn with_timeout(
        kind: ProviderKind,
        resource_url: String,
        timeout: Duration,
        users: Arc<dyn UserStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            kind,
            resource_url,
            http,
            users,
        })
    }

    async fn fetch_profile(&self, token: &str) -> Result<ProviderProfile, AuthFailure> {
        let response = self
            .http
            .get(&self.resource_url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            // Some providers refuse requests without a user agent.
            .header(USER_AGENT, concat!("gatekeeper/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "request timed out"
                } else {
                    "request failed"
                };
                AuthFailure::ProviderRejected(format!("{reason}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthFailure::ProviderRejected(format!(
                "resource endpoint answered {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthFailure::ProviderRejected(format!("reading body failed: {e}")))?;

        self.kind
            .parse_profile(&body)
            .map_err(|e| AuthFailure::ProviderRejected(format!("malformed profile: {e}")))
    }

    /// Find the identity for `profile`, creating it on first contact.
    async fn find_or_create(
        &self,
        profile: &ProviderProfile,
    ) -> Result<LocalIdentity, AuthFailure> {
        let external_id = profile.external_id();
        if let Some(existing) = self.users.find_by_external_id(&external_id).await? {
            return Ok(existing);
        }

        match self.users.create(NewIdentity::from(profile)).await {
            Ok(created) => {
                tracing::info!(
                    external_id = %created.external_id,
                    id = created.id,
                    "created local identity on first contact"
                );
                Ok(created)
            }
            Err(UserStoreError::Conflict { .. }) => {
                tracing::debug!(%external_id, "lost identity creation race, re-reading");
                self.users
                    .find_by_external_id(&external_id)
                    .await?
                    .ok_or_else(|| {
                        AuthFailure::Store(UserStoreError::Unavailable(format!(
                            "identity {external_id} conflicted but cannot be read"
                        )))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl IdentityResolver for ProviderResolver {
    async fn resolve(&self, token: &str) -> Result<LocalIdentity, AuthFailure> {
        let profile = self.fetch_profile(token).await?;
        self.find_or_create(&profile).await
    }
}

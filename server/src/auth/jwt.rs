//! Session tokens issued by this server.
//!
//! After a user has been identified through the identity provider, the
//! server can hand out its own HS256-signed JWT so clients do not have to
//! keep the provider's token around. Sub-system tokens are the long-lived
//! variant handed to automated clients; they carry their own scope so one
//! kind is never accepted as the other.
//!
//! # Pre-conditions
//! - The signing secret must be non-empty.
//!
//! # Post-conditions
//! - `issue` produces a token that `verify` accepts until it expires.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::identity::LocalIdentity;
use crate::config::SessionSettings;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// Interactive user session, valid for `JWT_EXPIRE_TIME`.
    User,
    /// Automated client acting for a user, valid for `SUB_SYSTEM_TOKEN_EXPIRES_IN`.
    SubSystem,
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local user id.
    pub sub: String,
    /// Identity-provider id of the user.
    pub external_id: String,
    pub scope: TokenScope,
    pub iat: u64,
    pub exp: u64,
}

/// Error returned when issuing or verifying a session token fails.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// The JWT signature is invalid.
    #[error("invalid JWT signature")]
    InvalidSignature,
    /// The JWT has expired.
    #[error("JWT has expired")]
    TokenExpired,
    /// The JWT is malformed or cannot be parsed.
    #[error("malformed JWT")]
    MalformedToken,
    /// The 'sub' claim is empty.
    #[error("missing 'sub' claim in JWT")]
    MissingSubClaim,
    /// The token was issued for another scope.
    #[error("JWT scope {found:?} is not accepted here (expected {expected:?})")]
    WrongScope {
        expected: TokenScope,
        found: TokenScope,
    },
    /// The signing key is unusable.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Signing failed.
    #[error("could not sign JWT: {0}")]
    Signing(String),
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    secret: SecretString,
    expires_in: Duration,
    scope: TokenScope,
}

impl SessionKeys {
    /// Keys for user-scoped tokens.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` if the secret is empty.
    pub fn new(secret: SecretString, expires_in: Duration) -> Result<Self, JwtError> {
        if secret.expose_secret().is_empty() {
            return Err(JwtError::InvalidKey("secret must be non-empty".to_string()));
        }
        Ok(Self {
            secret,
            expires_in,
            scope: TokenScope::User,
        })
    }

    /// Issue and accept tokens of `scope` instead.
    #[must_use]
    pub fn with_scope(mut self, scope: TokenScope) -> Self {
        self.scope = scope;
        self
    }

    /// Keys for user sessions, as configured.
    pub fn from_settings(settings: &SessionSettings) -> Result<Self, JwtError> {
        Self::new(settings.secret.clone(), settings.expires_in)
    }

    /// Keys for sub-system tokens, as configured.
    pub fn sub_system_from_settings(settings: &SessionSettings) -> Result<Self, JwtError> {
        Ok(Self::new(settings.secret.clone(), settings.sub_system_expires_in)?
            .with_scope(TokenScope::SubSystem))
    }

    #[must_use]
    pub const fn scope(&self) -> TokenScope {
        self.scope
    }

    #[must_use]
    pub const fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// Issue a session token for `identity`.
    pub fn issue(&self, identity: &LocalIdentity) -> Result<String, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::Signing(e.to_string()))?
            .as_secs();
        let claims = SessionClaims {
            sub: identity.id.to_string(),
            external_id: identity.external_id.clone(),
            scope: self.scope,
            iat: now,
            exp: now.saturating_add(self.expires_in.as_secs()),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify a session token and return its claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<SessionClaims>(token, &key, &validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(JwtError::MissingSubClaim);
        }
        if claims.scope != self.scope {
            return Err(JwtError::WrongScope {
                expected: self.scope,
                found: claims.scope,
            });
        }
        Ok(claims)
    }
}

/// Maps jsonwebtoken errors to our `JwtError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> JwtError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        ErrorKind::MissingRequiredClaim(_) => JwtError::MissingSubClaim,
        _ => JwtError::MalformedToken,
    }
}

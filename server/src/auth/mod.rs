//! Authentication module.
//!
//! Resolves bearer tokens presented by clients into local user identities,
//! through the one identity provider the deployment is configured for.
//!
//! # Pre-conditions
//! - The provider is selected once at startup and fixed for the process lifetime.
//!
//! # Post-conditions
//! - A request either carries an `AuthenticatedPrincipal` or was rejected
//!   with 401.
//!
//! # Invariants
//! - Provider-side failure details never reach the client.

pub mod gate;
pub mod identity;
pub mod jwt;
pub mod profile;
pub mod resolver;

pub use gate::{AuthGate, AuthenticatedPrincipal, Rejection, require_principal};
pub use identity::{InMemoryUserStore, LocalIdentity, NewIdentity, UserStore, UserStoreError};
pub use jwt::{JwtError, SessionClaims, SessionKeys, TokenScope};
pub use profile::{GenericProfile, InstitutionalProfile, ProviderKind, ProviderProfile};
pub use resolver::{AuthFailure, IdentityResolver, ProviderResolver};

//! Identity-provider profiles.
//!
//! A profile is the provider's answer to "who owns this token". It is built
//! fresh for every resolution and never stored; the resolver maps it onto a
//! `LocalIdentity`.
//!
//! # Invariants
//! - A deployment talks to exactly one provider, so the profile variant is
//!   fixed by `ProviderKind`, never guessed from the response.

use serde::Deserialize;

use crate::config::ConfigContract;
use crate::config::keys::{self, ProviderKeys};

/// Which identity provider this deployment authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Institutional single sign-on.
    Institutional,
    /// Generic OAuth provider.
    Generic,
}

impl ProviderKind {
    /// Select the provider from the `USE_CERN_SSO` flag.
    ///
    /// Anything other than `"true"` selects the generic provider.
    #[must_use]
    pub fn from_sso_flag(flag: Option<&str>) -> Self {
        if flag == Some("true") {
            Self::Institutional
        } else {
            Self::Generic
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Institutional => "institutional SSO",
            Self::Generic => "generic OAuth",
        }
    }

    /// Environment keys of this provider.
    #[must_use]
    pub const fn keys(self) -> &'static ProviderKeys {
        match self {
            Self::Institutional => &keys::CERN,
            Self::Generic => &keys::GITHUB,
        }
    }

    /// Presence contract for this provider's keys.
    #[must_use]
    pub fn contract(self) -> ConfigContract {
        self.keys()
            .all()
            .into_iter()
            .fold(ConfigContract::new(), |contract, key| contract.require(key))
    }

    /// Parse a resource-endpoint response body into this provider's profile.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is not the expected shape.
    pub fn parse_profile(self, body: &[u8]) -> Result<ProviderProfile, serde_json::Error> {
        match self {
            Self::Institutional => {
                serde_json::from_slice(body).map(ProviderProfile::Institutional)
            }
            Self::Generic => serde_json::from_slice(body).map(ProviderProfile::Generic),
        }
    }
}

/// User info returned by the institutional SSO resource endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstitutionalProfile {
    /// Stable person id; the key for the local identity.
    pub personid: u64,
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub federation: Option<String>,
    #[serde(default)]
    pub identityclass: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

/// User info returned by the generic OAuth resource endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenericProfile {
    pub id: u64,
    #[serde(alias = "login")]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Normalized view over the provider-specific profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderProfile {
    Institutional(InstitutionalProfile),
    Generic(GenericProfile),
}

impl ProviderProfile {
    /// Provider-unique id of the token owner.
    #[must_use]
    pub fn external_id(&self) -> String {
        match self {
            Self::Institutional(p) => p.personid.to_string(),
            Self::Generic(p) => p.id.to_string(),
        }
    }

    /// Name to show for the user; falls back to the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Institutional(p) => &p.name,
            Self::Generic(p) => p
                .name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(&p.username),
        }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Institutional(p) => Some(p.email.as_str()),
            Self::Generic(p) => p.email.as_deref(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::Institutional(_) => ProviderKind::Institutional,
            Self::Generic(_) => ProviderKind::Generic,
        }
    }
}

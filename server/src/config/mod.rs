//! Server configuration module.
//!
//! Configuration is read from environment variables exactly once at startup.
//! `preflight::run` checks the raw values against the startup contract and
//! turns them into a typed `ServerConfig`, reporting problems of both steps
//! together.
//!
//! # Environment Variables
//!
//! See [`keys`] for the full list. Provider keys are prefixed `CERN_` when
//! `USE_CERN_SSO=true` and `GITHUB_` otherwise.
//!
//! # Invariants
//!
//! - `listen_port` is always in the range 1-65535
//! - Secrets are held as `SecretString` and never appear in `Debug` output

pub mod contract;
pub mod keys;
pub mod preflight;
pub mod snapshot;
pub mod validator;

use std::time::Duration;

use secrecy::SecretString;

use crate::auth::ProviderKind;

pub use contract::{ConfigContract, ContractEntry, ContractError, Rule};
pub use preflight::PreflightError;
pub use snapshot::ConfigSnapshot;
pub use validator::{
    ConfigError, ConfigReport, RuleViolation, ValidationFailure, ValidationOutcome,
    check_placeholder, validate,
};

/// Signing material for tokens issued by this server.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: SecretString,
    /// Lifetime of a user session token.
    pub expires_in: Duration,
    /// Lifetime of a sub-system token.
    pub sub_system_expires_in: Duration,
}

/// The one identity provider this deployment talks to.
///
/// The OAuth client keys of the provider are checked by the startup
/// contract only; token resolution needs just the resource endpoint.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Endpoint that exchanges a bearer token for the owner's profile.
    pub resource_api_url: String,
    /// Upper bound on one resource-endpoint round-trip.
    pub timeout: Duration,
}

/// Server configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_snapshot()`:
/// - The snapshot has passed the startup contract for `kind`
///
/// # Post-conditions
///
/// - All fields hold parsed, typed values
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Nest every route under `/api`.
    pub use_api_prefix: bool,
    /// Log every HTTP request at `info`.
    pub use_info_logger: bool,
    pub session: SessionSettings,
    pub provider: ProviderSettings,
}

impl ServerConfig {
    /// Default provider round-trip timeout.
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build the typed configuration from a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns a report with one `ConfigError::InvalidValue` per value that
    /// cannot be converted (for example an unparseable duration).
    pub fn from_snapshot(
        snapshot: &ConfigSnapshot,
        kind: ProviderKind,
    ) -> Result<Self, ConfigReport> {
        let mut reader = FieldReader {
            snapshot,
            report: ConfigReport::default(),
        };

        let config = Self {
            listen_port: reader.port(keys::PORT),
            use_api_prefix: reader.flag(keys::USE_API_PREFIX),
            use_info_logger: reader.flag(keys::USE_INFO_LOGGER),
            session: SessionSettings {
                secret: reader.secret(keys::JWT_SECRET_KEY),
                expires_in: reader.duration(keys::JWT_EXPIRE_TIME),
                sub_system_expires_in: reader.duration(keys::SUB_SYSTEM_TOKEN_EXPIRES_IN),
            },
            provider: ProviderSettings {
                kind,
                resource_api_url: reader.string(kind.keys().resource_api_url),
                timeout: reader.provider_timeout(),
            },
        };

        reader.report.into_result()?;
        Ok(config)
    }

    /// Path prefix for every route.
    #[must_use]
    pub const fn route_prefix(&self) -> &'static str {
        if self.use_api_prefix { "/api" } else { "" }
    }
}

/// Reads typed fields, collecting conversion errors instead of stopping.
struct FieldReader<'a> {
    snapshot: &'a ConfigSnapshot,
    report: ConfigReport,
}

impl FieldReader<'_> {
    fn invalid(&mut self, name: &str, message: String) {
        self.report.push(ConfigError::InvalidValue {
            name: name.to_string(),
            message,
        });
    }

    fn string(&mut self, key: &str) -> String {
        match self.snapshot.get(key) {
            Some(value) => value.to_string(),
            None => {
                self.invalid(key, "must not be empty".to_string());
                String::new()
            }
        }
    }

    fn secret(&mut self, key: &str) -> SecretString {
        SecretString::from(self.string(key))
    }

    fn port(&mut self, key: &str) -> u16 {
        let value = self.string(key);
        match value.parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ if value.is_empty() => 0,
            _ => {
                let message = format!("'{value}' is not a valid port number (must be 1-65535)");
                self.invalid(key, message);
                0
            }
        }
    }

    fn flag(&mut self, key: &str) -> bool {
        let value = self.string(key);
        match value.as_str() {
            "true" => true,
            "false" | "" => false,
            _ => {
                self.invalid(key, format!("'{value}' must be 'true' or 'false'"));
                false
            }
        }
    }

    fn duration(&mut self, key: &str) -> Duration {
        let value = self.string(key);
        if value.is_empty() {
            return Duration::ZERO;
        }
        parse_duration(&value).unwrap_or_else(|message| {
            self.invalid(key, message);
            Duration::ZERO
        })
    }

    fn provider_timeout(&mut self) -> Duration {
        let key = keys::PROVIDER_TIMEOUT_SECONDS;
        let Some(value) = self.snapshot.get(key) else {
            return ServerConfig::DEFAULT_PROVIDER_TIMEOUT;
        };
        match value.parse::<u64>() {
            Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
            _ => {
                self.invalid(key, format!("'{value}' must be a positive number of seconds"));
                ServerConfig::DEFAULT_PROVIDER_TIMEOUT
            }
        }
    }
}

/// Parse a duration given as plain seconds or in human-readable form
/// (`30m`, `12h`, `7d`, `1w`, `2 days`, `1h 30m`).
///
/// # Errors
///
/// Returns a message describing the accepted format when `value` does not
/// parse or is zero.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let parsed = if value.bytes().all(|b| b.is_ascii_digit()) {
        value.parse::<u64>().map(Duration::from_secs).ok()
    } else {
        humantime::parse_duration(value).ok()
    };

    parsed.filter(|d| !d.is_zero()).ok_or_else(|| {
        format!("'{value}' is not a duration (expected e.g. 3600, 30m, 12h, 7d or 2 days)")
    })
}

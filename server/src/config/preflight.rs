//! Startup configuration check.
//!
//! Runs once before the listener is bound. Every problem in the environment
//! is collected into a single `ConfigReport`; the process must not serve
//! traffic unless `run` succeeds.
//!
//! # Pre-conditions
//! - The snapshot holds the complete process environment.
//!
//! # Post-conditions
//! - On success the returned `ServerConfig` is fully typed and every
//!   required key was present and well-formed.

use std::collections::BTreeSet;

use super::contract::{ConfigContract, ContractError, Rule};
use super::keys;
use super::snapshot::ConfigSnapshot;
use super::ServerConfig;
use super::validator::{
    ConfigError, ConfigReport, ValidationFailure, ValidationOutcome, check_placeholder, validate,
};
use crate::auth::ProviderKind;

/// Port numbers 1 through 65535, no leading zeros.
pub const PORT_PATTERN: &str =
    "6553[0-5]|655[0-2][0-9]|65[0-4][0-9]{2}|6[0-4][0-9]{3}|[1-5][0-9]{4}|[1-9][0-9]{0,3}";

/// Why startup was refused.
#[derive(Debug, thiserror::Error)]
pub enum PreflightError {
    /// The built-in contract is broken; not an environment problem.
    #[error("startup contract is invalid: {0}")]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Rejected(#[from] ConfigReport),
}

/// Keys every deployment needs, regardless of identity provider.
pub fn base_contract() -> Result<ConfigContract, ContractError> {
    let port = Rule::regex(PORT_PATTERN)?;

    Ok(ConfigContract::new()
        .require_matching(keys::PORT, port.clone())
        .require_matching(keys::USE_API_PREFIX, Rule::boolean())
        .require_matching(keys::USE_CERN_SSO, Rule::boolean())
        .require(keys::TYPEORM_CONNECTION)
        .require(keys::TYPEORM_HOST)
        .require(keys::TYPEORM_USERNAME)
        .require(keys::TYPEORM_PASSWORD)
        .require(keys::TYPEORM_DATABASE)
        .require_matching(keys::TYPEORM_PORT, port)
        .require_matching(keys::TYPEORM_SYNCHRONIZE, Rule::boolean())
        .require_matching(keys::TYPEORM_LOGGING, Rule::boolean())
        .require(keys::TYPEORM_ENTITIES)
        .require(keys::TYPEORM_MIGRATIONS)
        .require(keys::TYPEORM_MIGRATIONS_DIR)
        .require(keys::JWT_SECRET_KEY)
        .require(keys::JWT_EXPIRE_TIME)
        .require(keys::SUB_SYSTEM_TOKEN_EXPIRES_IN)
        .require_matching(keys::USE_INFO_LOGGER, Rule::boolean()))
}

/// Validate the environment and load the typed configuration.
///
/// The provider is chosen from `USE_CERN_SSO` before validation so that the
/// base contract, the provider contract, the placeholder check and the typed
/// load all land in the same report.
pub fn run(snapshot: &ConfigSnapshot) -> Result<ServerConfig, PreflightError> {
    let kind = ProviderKind::from_sso_flag(snapshot.get(keys::USE_CERN_SSO));
    tracing::debug!("checking configuration for the {} provider", kind.name());

    let mut failure = ValidationFailure::default();
    for contract in [base_contract()?, kind.contract()] {
        if let ValidationOutcome::Failed(found) = validate(&contract, snapshot) {
            failure.absorb(found);
        }
    }

    // Keys the contract already reported are not reported again by the typed load.
    let flagged: BTreeSet<String> = failure
        .missing_keys
        .iter()
        .cloned()
        .chain(failure.rule_violations.iter().map(|v| v.key.clone()))
        .collect();

    let mut report = ConfigReport {
        errors: failure.into_errors(),
    };
    let auth_url = kind.keys().auth_url;
    if let Err(error) = check_placeholder(snapshot, auth_url, keys::CLIENT_ID_PLACEHOLDER) {
        report.push(error);
    }

    match ServerConfig::from_snapshot(snapshot, kind) {
        Ok(config) => {
            report.into_result()?;
            Ok(config)
        }
        Err(typed) => {
            for error in typed.errors {
                let already_reported = matches!(
                    &error,
                    ConfigError::InvalidValue { name, .. } if flagged.contains(name)
                );
                if !already_reported {
                    report.push(error);
                }
            }
            Err(report.into())
        }
    }
}

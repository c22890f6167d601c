//! Configuration contract validation.
//!
//! # Pre-conditions
//! - The snapshot is captured before validation and not modified during it.
//!
//! # Post-conditions
//! - A failed outcome lists every missing key and every rule violation found
//!   in one pass, in contract order.
//!
//! # Invariants
//! - Validation is a pure function of the contract and the snapshot.

use std::fmt;

use super::contract::ConfigContract;
use super::snapshot::ConfigSnapshot;

/// A present value that failed its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.reason)
    }
}

/// Every problem found by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFailure {
    pub missing_keys: Vec<String>,
    pub rule_violations: Vec<RuleViolation>,
}

impl ValidationFailure {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_keys.is_empty() && self.rule_violations.is_empty()
    }

    /// Fold another failure into this one, keeping order.
    pub fn absorb(&mut self, other: Self) {
        self.missing_keys.extend(other.missing_keys);
        self.rule_violations.extend(other.rule_violations);
    }

    /// Split into the error taxonomy, skipping empty halves.
    #[must_use]
    pub fn into_errors(self) -> Vec<ConfigError> {
        let mut errors = Vec::with_capacity(2);
        if !self.missing_keys.is_empty() {
            errors.push(ConfigError::Missing(self.missing_keys));
        }
        if !self.rule_violations.is_empty() {
            errors.push(ConfigError::RuleViolation(self.rule_violations));
        }
        errors
    }
}

/// Verdict of `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Ok,
    Failed(ValidationFailure),
}

impl ValidationOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// The failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Ok => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

/// Startup-fatal configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required keys are absent or blank.
    #[error("missing environment variable(s): {}", .0.join(", "))]
    Missing(Vec<String>),
    /// Present values that do not match their rule.
    #[error("environment value(s) do not match expected value:\n{}", join_lines(.0))]
    RuleViolation(Vec<RuleViolation>),
    /// A value still carries an example placeholder.
    #[error("{key} still contains the placeholder {placeholder}")]
    PlaceholderUnset { key: String, placeholder: String },
    /// A value passed the contract but could not be turned into its typed form.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

fn join_lines(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// All configuration errors found at startup, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigReport {
    pub errors: Vec<ConfigError>,
}

impl ConfigReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// `Ok(())` when nothing was reported.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration rejected ({} problem(s))", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n- {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigReport {}

/// Check `snapshot` against `contract`.
///
/// Values are trimmed; an absent or blank value is missing. Rules run on
/// every present key, also when other keys are missing, so the outcome
/// carries the complete diagnostic set.
#[must_use]
pub fn validate(contract: &ConfigContract, snapshot: &ConfigSnapshot) -> ValidationOutcome {
    let mut failure = ValidationFailure::default();

    for entry in contract.entries() {
        let Some(value) = snapshot.get(&entry.key) else {
            failure.missing_keys.push(entry.key.clone());
            continue;
        };

        if let Some(rule) = &entry.rule
            && let Err(reason) = rule.check(value)
        {
            failure.rule_violations.push(RuleViolation {
                key: entry.key.clone(),
                reason,
            });
        }
    }

    if failure.is_empty() {
        ValidationOutcome::Ok
    } else {
        ValidationOutcome::Failed(failure)
    }
}

/// Fail if the value of `key` still contains `placeholder`.
///
/// An absent key passes; presence is the contract's job.
pub fn check_placeholder(
    snapshot: &ConfigSnapshot,
    key: &str,
    placeholder: &str,
) -> Result<(), ConfigError> {
    match snapshot.get(key) {
        Some(value) if value.contains(placeholder) => Err(ConfigError::PlaceholderUnset {
            key: key.to_string(),
            placeholder: placeholder.to_string(),
        }),
        _ => Ok(()),
    }
}

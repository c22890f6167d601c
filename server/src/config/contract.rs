//! Declarative configuration contract.
//!
//! A contract is an ordered list of required keys, each optionally paired
//! with a rule its value must satisfy.
//!
//! # Invariants
//! - Entries keep the order in which they were declared; diagnostics are
//!   reported in that order.
//! - `Rule::Regex` patterns are compiled when the contract is built and
//!   always match the whole value.

use regex::Regex;

/// Error in the contract itself (a programming error, not an environment one).
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// A regex rule could not be compiled.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// Rules were supplied but not one per key.
    #[error("contract has {keys} keys but {rules} rules")]
    MisalignedRules { keys: usize, rules: usize },
}

/// Shape check applied to a present value.
#[derive(Debug, Clone)]
pub enum Rule {
    /// The whole value must match the pattern.
    Regex { pattern: String, compiled: Regex },
    /// The value must equal one of the listed strings.
    OneOf(Vec<String>),
    /// The value must end with the given string.
    Suffix(String),
}

impl Rule {
    /// Compile a full-match regex rule.
    pub fn regex(pattern: &str) -> Result<Self, ContractError> {
        let compiled = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            ContractError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(Self::Regex {
            pattern: pattern.to_string(),
            compiled,
        })
    }

    #[must_use]
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(allowed.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self::Suffix(suffix.into())
    }

    /// `true` / `false` flag.
    #[must_use]
    pub fn boolean() -> Self {
        Self::one_of(["true", "false"])
    }

    /// Check a value, returning a human-readable reason on mismatch.
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            Self::Regex { pattern, compiled } => {
                if compiled.is_match(value) {
                    Ok(())
                } else {
                    Err(format!("does not pass regex /{pattern}/"))
                }
            }
            Self::OneOf(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(format!(
                        "does not match the possible string(s): {}",
                        allowed.join(", ")
                    ))
                }
            }
            Self::Suffix(suffix) => {
                if value.ends_with(suffix.as_str()) {
                    Ok(())
                } else {
                    Err(format!("does not end with {suffix}"))
                }
            }
        }
    }
}

/// One required key.
#[derive(Debug, Clone)]
pub struct ContractEntry {
    pub key: String,
    /// `None` means the key only has to be present.
    pub rule: Option<Rule>,
}

/// Ordered set of required keys and their rules.
#[derive(Debug, Clone, Default)]
pub struct ConfigContract {
    entries: Vec<ContractEntry>,
}

impl ConfigContract {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a contract from a key list and an optional index-aligned rule list.
    ///
    /// # Errors
    /// Returns `ContractError::MisalignedRules` if `rules` is supplied with a
    /// different length than `keys`.
    pub fn from_parts<K: AsRef<str>>(
        keys: &[K],
        rules: Option<Vec<Option<Rule>>>,
    ) -> Result<Self, ContractError> {
        let rules = match rules {
            Some(rules) if rules.len() != keys.len() => {
                return Err(ContractError::MisalignedRules {
                    keys: keys.len(),
                    rules: rules.len(),
                });
            }
            Some(rules) => rules,
            None => vec![None; keys.len()],
        };

        let entries = keys
            .iter()
            .zip(rules)
            .map(|(key, rule)| ContractEntry {
                key: key.as_ref().to_string(),
                rule,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Add a presence-only key.
    #[must_use]
    pub fn require(mut self, key: impl Into<String>) -> Self {
        self.entries.push(ContractEntry {
            key: key.into(),
            rule: None,
        });
        self
    }

    /// Add a key whose value must satisfy `rule`.
    #[must_use]
    pub fn require_matching(mut self, key: impl Into<String>, rule: Rule) -> Self {
        self.entries.push(ContractEntry {
            key: key.into(),
            rule: Some(rule),
        });
        self
    }

    /// Append all entries of `other`, keeping order.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.entries.extend(other.entries);
        self
    }

    #[must_use]
    pub fn entries(&self) -> &[ContractEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

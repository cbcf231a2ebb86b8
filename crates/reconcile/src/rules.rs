use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cuadre_core::{Money, UNKNOWN_EXPENSE_ACCOUNT, UNKNOWN_INCOME_ACCOUNT};

use crate::error::ConfigError;
use crate::util::normalize_whitespace;

/// Description fragments that route a bank movement to `account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    pub patterns: Vec<String>,
    pub account: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Wrapped { description_mappings: Vec<AccountMapping> },
    Bare(Vec<AccountMapping>),
}

/// Which way an unmapped movement goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Expense,
    Income,
}

/// The account on the other side of a bank movement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CounterAccount {
    Mapped(String),
    Unknown(Direction),
}

impl CounterAccount {
    pub fn name(&self) -> &str {
        match self {
            CounterAccount::Mapped(account) => account,
            CounterAccount::Unknown(Direction::Expense) => UNKNOWN_EXPENSE_ACCOUNT,
            CounterAccount::Unknown(Direction::Income) => UNKNOWN_INCOME_ACCOUNT,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CounterAccount::Unknown(_))
    }
}

impl fmt::Display for CounterAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered description rules, loaded once at startup. The first rule with a
/// matching pattern wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountMappings {
    mappings: Vec<AccountMapping>,
}

impl AccountMappings {
    pub fn new(mappings: Vec<AccountMapping>) -> Self {
        Self { mappings }
    }

    /// Accepts `{"description_mappings": [...]}` or a bare list of rules.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mappings = match serde_json::from_str::<MappingFile>(json)? {
            MappingFile::Wrapped { description_mappings } => description_mappings,
            MappingFile::Bare(list) => list,
        };
        Ok(Self::new(mappings))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mappings = Self::from_json(&text)?;
        tracing::info!("loaded {} account mapping(s) from {}", mappings.len(), path.display());
        Ok(mappings)
    }

    /// Like [`AccountMappings::load`], but a missing file means no rules.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("no account mappings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn mappings(&self) -> &[AccountMapping] {
        &self.mappings
    }

    /// Counter-account for a movement. Patterns match as substrings,
    /// ignoring case and runs of whitespace. Without a match the sign of
    /// `net` picks the unknown expense or income account.
    pub fn resolve(&self, description: &str, net: Money) -> CounterAccount {
        let haystack = normalize_whitespace(description).to_uppercase();

        let mapped = self.mappings.iter().find(|m| {
            m.patterns
                .iter()
                .map(|p| normalize_whitespace(p).to_uppercase())
                .any(|p| haystack.contains(&p))
        });

        match mapped {
            Some(m) => CounterAccount::Mapped(m.account.clone()),
            None if net.is_negative() => CounterAccount::Unknown(Direction::Expense),
            None => CounterAccount::Unknown(Direction::Income),
        }
    }
}

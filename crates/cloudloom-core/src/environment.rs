//! Deployment environment labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Deployment environment a stack assembly targets.
///
/// Selected at assembly time from configuration; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// All recognized environments, in assembly order.
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    /// Short label used in hostnames, image repositories and bucket names.
    pub fn short(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Staging => "stag",
            Environment::Production => "prod",
        }
    }

    /// Title-case label used in logical resource names and image tags.
    pub fn title(&self) -> &'static str {
        match self {
            Environment::Development => "Dev",
            Environment::Staging => "Stag",
            Environment::Production => "Prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Development or Staging.
    ///
    /// Membership is tested explicitly; a chained `a == x || y` comparison
    /// is always true and must never be used for this check.
    pub fn is_non_production(&self) -> bool {
        matches!(self, Environment::Development | Environment::Staging)
    }

    /// Parse an environment label.
    ///
    /// Accepts the long names and the short labels used in resource names
    /// (`Dev`, `Stag`, `Prod`), case-insensitively. Anything else is a
    /// configuration error naming the offending label.
    pub fn parse(label: &str) -> Result<Self, ConfigError> {
        match label.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stag" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(label.to_string())),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::parse(s)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "Development",
            Environment::Staging => "Staging",
            Environment::Production => "Production",
        };
        write!(f, "{}", name)
    }
}

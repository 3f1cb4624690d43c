//! Assembly-time configuration
//!
//! One configuration object, constructed once at the top of an assembly
//! run and passed explicitly to every builder. No component reads the
//! process environment on its own.

use serde::Serialize;

use crate::environment::Environment;
use crate::error::{ConfigError, Result};

/// Environment variables consumed at assembly time.
pub const ENV_ACCOUNT: &str = "LOOM_ACCOUNT";
pub const ENV_REGION: &str = "LOOM_REGION";
pub const ENV_STACK_PREFIX: &str = "LOOM_STACK_PREFIX";
pub const ENV_DOMAIN: &str = "LOOM_DOMAIN";
pub const ENV_DESCRIPTION: &str = "LOOM_DESCRIPTION";

pub const DEFAULT_STACK_PREFIX: &str = "Atlas";
pub const DEFAULT_DOMAIN: &str = "example.org";
pub const DEFAULT_DESCRIPTION: &str = "Synthesized by cloudloom";

/// Pass-through configuration for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyConfig {
    /// Account identifier (pass-through to the emitted template).
    pub account: String,

    /// Region identifier (pass-through to the emitted template).
    pub region: String,

    /// Prefix for every logical resource name (`Atlas-API-Dev`).
    pub stack_prefix: String,

    /// Apex domain routable hostnames hang off (`example.org`).
    pub domain: String,

    /// Free-text stack description (pass-through).
    pub description: String,

    /// Environments this run assembles, in order.
    pub environments: Vec<Environment>,
}

impl AssemblyConfig {
    /// Configuration with defaults for everything but account and region.
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
            stack_prefix: DEFAULT_STACK_PREFIX.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            environments: Environment::ALL.to_vec(),
        }
    }

    /// Read configuration from the `LOOM_*` environment variables.
    ///
    /// Account and region are required; the rest fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let account =
            std::env::var(ENV_ACCOUNT).map_err(|_| ConfigError::MissingField(ENV_ACCOUNT))?;
        let region =
            std::env::var(ENV_REGION).map_err(|_| ConfigError::MissingField(ENV_REGION))?;

        let mut config = Self::new(account, region);
        if let Ok(prefix) = std::env::var(ENV_STACK_PREFIX) {
            config.stack_prefix = prefix;
        }
        if let Ok(domain) = std::env::var(ENV_DOMAIN) {
            config.domain = domain;
        }
        if let Ok(description) = std::env::var(ENV_DESCRIPTION) {
            config.description = description;
        }
        config.validate()?;
        Ok(config)
    }

    /// Restrict the run to the given environments, preserving order and
    /// dropping duplicates.
    pub fn with_environments(mut self, environments: &[Environment]) -> Self {
        let mut seen = Vec::new();
        for env in environments {
            if !seen.contains(env) {
                seen.push(*env);
            }
        }
        self.environments = seen;
        self
    }

    /// Fail fast on configuration no builder could work from.
    pub fn validate(&self) -> Result<()> {
        if self.account.is_empty() {
            return Err(ConfigError::EmptyField("account"));
        }
        if self.region.is_empty() {
            return Err(ConfigError::EmptyField("region"));
        }
        if self.stack_prefix.is_empty() {
            return Err(ConfigError::EmptyField("stack_prefix"));
        }
        if self.domain.is_empty() {
            return Err(ConfigError::EmptyField("domain"));
        }
        if self.environments.is_empty() {
            return Err(ConfigError::MissingField("environments"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_environments() {
        let config = AssemblyConfig::new("123456789012", "us-west-2");
        assert_eq!(config.environments, Environment::ALL.to_vec());
        assert_eq!(config.stack_prefix, "Atlas");
        assert_eq!(config.domain, "example.org");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn with_environments_preserves_order_and_drops_duplicates() {
        let config = AssemblyConfig::new("a", "r").with_environments(&[
            Environment::Production,
            Environment::Development,
            Environment::Production,
        ]);
        assert_eq!(
            config.environments,
            vec![Environment::Production, Environment::Development]
        );
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let mut config = AssemblyConfig::new("", "us-west-2");
        assert_eq!(config.validate(), Err(ConfigError::EmptyField("account")));

        config.account = "123456789012".to_string();
        config.environments.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingField("environments"))
        );
    }

    #[test]
    fn from_env_reads_the_loom_variables() {
        temp_env::with_vars(
            [
                (ENV_ACCOUNT, Some("123456789012")),
                (ENV_REGION, Some("eu-central-1")),
                (ENV_STACK_PREFIX, Some("Orion")),
                (ENV_DOMAIN, None),
                (ENV_DESCRIPTION, None),
            ],
            || {
                let config = AssemblyConfig::from_env().unwrap();
                assert_eq!(config.account, "123456789012");
                assert_eq!(config.region, "eu-central-1");
                assert_eq!(config.stack_prefix, "Orion");
                assert_eq!(config.domain, DEFAULT_DOMAIN);
            },
        );
    }

    #[test]
    fn from_env_requires_account_and_region() {
        temp_env::with_vars(
            [(ENV_ACCOUNT, None::<&str>), (ENV_REGION, None::<&str>)],
            || {
                let err = AssemblyConfig::from_env().unwrap_err();
                assert_eq!(err, ConfigError::MissingField(ENV_ACCOUNT));
            },
        );
    }
}

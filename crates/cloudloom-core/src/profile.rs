//! Environment profile resolution
//!
//! Maps a deployment environment to the tuple of settings that drives the
//! rest of the assembly: compute allocation, log retention, DNS suffix,
//! routing priority offset, source branch, listener class and pipeline
//! gating. Resolution is a pure, exhaustive table; adding an environment
//! without a profile is a compile error, not a runtime fallthrough.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::environment::Environment;

/// Log retention policy for a profile's log sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRetention {
    TwoWeeks,
    OneMonth,
    Infinite,
}

impl LogRetention {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogRetention::TwoWeeks => "two_weeks",
            LogRetention::OneMonth => "one_month",
            LogRetention::Infinite => "infinite",
        }
    }

    /// Retention in days; `None` means logs are kept forever.
    pub fn days(&self) -> Option<u32> {
        match self {
            LogRetention::TwoWeeks => Some(14),
            LogRetention::OneMonth => Some(30),
            LogRetention::Infinite => None,
        }
    }
}

impl fmt::Display for LogRetention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which load-balancer listener an environment's services attach to.
///
/// Development and Staging share the non-production listener; Production
/// has its own. Routing priorities are unique per listener, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerClass {
    NonProduction,
    Production,
}

impl ListenerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerClass::NonProduction => "non-prod",
            ListenerClass::Production => "prod",
        }
    }
}

/// Resolved per-environment settings.
///
/// Created once per environment at assembly time and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentProfile {
    pub environment: Environment,

    /// Compute allocation for one task, in CPU units.
    pub cpu_units: u32,

    /// Compute allocation for one task, in MiB.
    pub memory_mib: u32,

    /// Retention for container and build log sinks.
    pub log_retention: LogRetention,

    /// Suffix inserted between a service's DNS name and the apex domain
    /// (`api` + `-stag` + `example.org` → `api-stag.example.org`).
    pub dns_suffix: &'static str,

    /// The environment's contribution to routing-rule priorities on its
    /// listener; see [`EnvironmentProfile::rule_priority`].
    pub priority_offset: u32,

    /// Branch the environment's pipelines pull from.
    pub source_branch: &'static str,

    /// Listener the environment's routing rules attach to.
    pub listener: ListenerClass,

    /// Whether pipelines interpose a manual-approval gate before deploy.
    pub requires_approval: bool,

    /// Upper bound for task autoscaling; 1 disables scaling.
    pub max_task_count: u32,
}

impl EnvironmentProfile {
    /// Resolve the profile for an environment.
    ///
    /// Pure and deterministic: the same label always yields the same
    /// profile. The match is exhaustive over [`Environment`].
    pub fn resolve(environment: Environment) -> Self {
        match environment {
            Environment::Development => EnvironmentProfile {
                environment,
                cpu_units: 256,
                memory_mib: 512,
                log_retention: LogRetention::TwoWeeks,
                dns_suffix: "-dev",
                priority_offset: 1,
                source_branch: "dev",
                listener: ListenerClass::NonProduction,
                requires_approval: false,
                max_task_count: 1,
            },
            Environment::Staging => EnvironmentProfile {
                environment,
                cpu_units: 512,
                memory_mib: 1024,
                log_retention: LogRetention::OneMonth,
                dns_suffix: "-stag",
                priority_offset: 2,
                source_branch: "master",
                listener: ListenerClass::NonProduction,
                requires_approval: true,
                max_task_count: 1,
            },
            Environment::Production => EnvironmentProfile {
                environment,
                cpu_units: 2048,
                memory_mib: 4096,
                log_retention: LogRetention::Infinite,
                dns_suffix: "",
                priority_offset: 1,
                source_branch: "master",
                listener: ListenerClass::Production,
                requires_approval: true,
                max_task_count: 2,
            },
        }
    }

    /// Externally-routable hostname for a service in this environment.
    pub fn hostname(&self, dns_name: &str, domain: &str) -> String {
        format!("{}{}.{}", dns_name, self.dns_suffix, domain)
    }

    /// Routing-rule priority for a service on this profile's listener.
    ///
    /// Non-production interleaves Development and Staging rules per
    /// service (`offset + 2 * index` → 1..=6 for three services);
    /// production is a straight run (`offset + index` → 1..=3). Priorities
    /// are unique per listener as long as each (service, environment)
    /// pair is built once.
    pub fn rule_priority(&self, priority_index: u32) -> u32 {
        match self.listener {
            ListenerClass::NonProduction => self.priority_offset + 2 * priority_index,
            ListenerClass::Production => self.priority_offset + priority_index,
        }
    }
}

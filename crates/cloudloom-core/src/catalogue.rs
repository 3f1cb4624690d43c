//! Fixed catalogue of deployable services
//!
//! One entry per deployable unit; the builders instantiate each entry once
//! per target environment. Naming here is load-bearing: the container name
//! is matched by exact string equality against the image-definition file
//! the build pipeline produces.

use crate::environment::Environment;
use crate::profile::EnvironmentProfile;

/// Health-check settings, uniform across all services.
///
/// Kept as named constants so a change lands everywhere at once instead of
/// drifting per service.
pub const HEALTH_CHECK_PATH: &str = "/healthcheck";
pub const HEALTH_CHECK_PROTOCOL: &str = "HTTPS";
pub const HEALTH_CHECK_HEALTHY_THRESHOLD: u32 = 5;
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 30;
pub const HEALTH_CHECK_SUCCESS_CODES: &str = "200";
pub const HEALTH_CHECK_PORT: &str = "traffic-port";

/// Port every service container listens on.
pub const CONTAINER_PORT: u16 = 443;

/// One deployable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Name used in logical resource ids (`Atlas-API-Dev`).
    pub name: &'static str,

    /// Leftmost DNS label (`api` → `api-stag.example.org`).
    pub dns_name: &'static str,

    /// Position in the per-listener priority layout; see
    /// [`EnvironmentProfile::rule_priority`].
    pub priority_index: u32,
}

/// The full service catalogue, in priority order.
pub const CATALOGUE: [ServiceSpec; 3] = [
    ServiceSpec {
        name: "API",
        dns_name: "api",
        priority_index: 0,
    },
    ServiceSpec {
        name: "IDP",
        dns_name: "idp",
        priority_index: 1,
    },
    ServiceSpec {
        name: "Web",
        dns_name: "web",
        priority_index: 2,
    },
];

impl ServiceSpec {
    /// Look up a catalogue entry by name.
    pub fn by_name(name: &str) -> Option<&'static ServiceSpec> {
        CATALOGUE.iter().find(|s| s.name == name)
    }

    /// `{prefix}-{name}-{Env}`, the stem shared by a pair's resources.
    pub fn qualified(&self, prefix: &str, environment: Environment) -> String {
        format!("{}-{}-{}", prefix, self.name, environment.title())
    }

    /// Image repository name (`atlas-api`).
    pub fn repository_name(&self, prefix: &str) -> String {
        format!(
            "{}-{}",
            prefix.to_ascii_lowercase(),
            self.name.to_ascii_lowercase()
        )
    }

    /// Container name for a (service, environment) pair.
    ///
    /// External contract: the deploy pipeline's image-definition file
    /// keys on this exact string. Do not rename one without the other.
    pub fn container_name(&self, prefix: &str, environment: Environment) -> String {
        format!("{}-Container", self.qualified(prefix, environment))
    }

    /// Externally-routable hostname for this service under a profile.
    pub fn hostname(&self, profile: &EnvironmentProfile, domain: &str) -> String {
        profile.hostname(self.dns_name, domain)
    }
}

/// Name of the image-definition file the build pipeline publishes and the
/// deploy action reads. Keys inside it are [`ServiceSpec::container_name`]
/// values.
pub fn image_definition_file(environment: Environment) -> String {
    format!("imageDef-{}.json", environment.title())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_names_are_unique() {
        for (i, a) in CATALOGUE.iter().enumerate() {
            for b in &CATALOGUE[i + 1..] {
                assert_ne!(a.name, b.name);
                assert_ne!(a.dns_name, b.dns_name);
                assert_ne!(a.priority_index, b.priority_index);
            }
        }
    }

    #[test]
    fn naming_follows_the_prefix() {
        let api = ServiceSpec::by_name("API").unwrap();
        assert_eq!(api.qualified("Atlas", Environment::Development), "Atlas-API-Dev");
        assert_eq!(api.repository_name("Atlas"), "atlas-api");
        assert_eq!(
            api.container_name("Atlas", Environment::Production),
            "Atlas-API-Prod-Container"
        );
    }

    #[test]
    fn image_definition_file_tracks_environment_title() {
        assert_eq!(
            image_definition_file(Environment::Staging),
            "imageDef-Stag.json"
        );
    }
}

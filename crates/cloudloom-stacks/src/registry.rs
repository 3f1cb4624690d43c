//! Image repositories
//!
//! One repository per catalogue service. Lifecycle rules keep the last
//! ten production-tagged images and expire anything older than thirty
//! days, so the registry never grows without bound.

use std::collections::BTreeMap;

use serde_json::json;

use cloudloom_core::{AssemblyConfig, CATALOGUE, Environment};
use cloudloom_graph::{ResourceGraph, ResourceNode};

use crate::assembly::STAGE_REGISTRY;
use crate::error::Result;

const REPOSITORY_TYPE: &str = "registry:repository";

const PRODUCTION_IMAGES_KEPT: u32 = 10;
const MAX_IMAGE_AGE_DAYS: u32 = 30;

/// Logical repository ids keyed by service name.
#[derive(Debug, Clone, Default)]
pub struct Repositories {
    ids: BTreeMap<&'static str, String>,
}

impl Repositories {
    /// Repository id for a catalogue service.
    ///
    /// Panics on a name outside the catalogue; builders only pass
    /// catalogue entries.
    pub fn get(&self, service: &str) -> &str {
        &self.ids[service]
    }
}

pub fn build(graph: &mut ResourceGraph, config: &AssemblyConfig) -> Result<Repositories> {
    let mut repositories = Repositories::default();

    for service in &CATALOGUE {
        let id = format!("{}-{}-Repository", config.stack_prefix, service.name);
        graph.add(
            STAGE_REGISTRY,
            ResourceNode::new(&id, REPOSITORY_TYPE)
                .attr("name", service.repository_name(&config.stack_prefix))
                .attr(
                    "lifecycle_rules",
                    json!([
                        {
                            "tag_prefixes": [Environment::Production.title()],
                            "max_image_count": PRODUCTION_IMAGES_KEPT,
                        },
                        {
                            "max_image_age_days": MAX_IMAGE_AGE_DAYS,
                        },
                    ]),
                ),
        )?;
        repositories.ids.insert(service.name, id);
    }

    tracing::info!(count = repositories.ids.len(), "declared image repositories");
    Ok(repositories)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_repository_per_catalogue_service() {
        let config = AssemblyConfig::new("123456789012", "us-west-2");
        let mut graph = ResourceGraph::new();
        let repos = build(&mut graph, &config).unwrap();

        assert_eq!(graph.by_type(REPOSITORY_TYPE).len(), CATALOGUE.len());
        let api = graph.get(repos.get("API")).unwrap();
        assert_eq!(api.get("name").unwrap(), "atlas-api");
    }

    #[test]
    fn lifecycle_keeps_production_images() {
        let config = AssemblyConfig::new("123456789012", "us-west-2");
        let mut graph = ResourceGraph::new();
        let repos = build(&mut graph, &config).unwrap();

        let rules = graph
            .get(repos.get("Web"))
            .unwrap()
            .get("lifecycle_rules")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["tag_prefixes"][0], "Prod");
        assert_eq!(rules[0]["max_image_count"], 10);
        assert_eq!(rules[1]["max_image_age_days"], 30);
    }
}

//! Container clusters
//!
//! One cluster per target environment, named `{prefix}-{Env}`.

use serde_json::json;

use cloudloom_core::{AssemblyConfig, Environment};
use cloudloom_graph::{ResourceGraph, ResourceNode};

use crate::assembly::STAGE_CLUSTERS;
use crate::error::Result;

const CLUSTER_TYPE: &str = "container:cluster";

/// Logical cluster ids keyed by environment.
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    ids: Vec<(Environment, String)>,
}

impl Clusters {
    pub fn get(&self, environment: Environment) -> &str {
        self.ids
            .iter()
            .find(|(env, _)| *env == environment)
            .map(|(_, id)| id.as_str())
            .expect("cluster built for every configured environment")
    }
}

pub fn build(graph: &mut ResourceGraph, config: &AssemblyConfig) -> Result<Clusters> {
    let mut clusters = Clusters::default();

    for &environment in &config.environments {
        let name = format!("{}-{}", config.stack_prefix, environment.title());
        let id = format!("{name}-Cluster");
        graph.add(
            STAGE_CLUSTERS,
            ResourceNode::new(&id, CLUSTER_TYPE)
                .attr("name", name)
                .attr("capacity_providers", json!(["FARGATE", "FARGATE_SPOT"])),
        )?;
        clusters.ids.push((environment, id));
    }

    tracing::info!(count = clusters.ids.len(), "declared container clusters");
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_cluster_per_configured_environment() {
        let config = AssemblyConfig::new("123456789012", "us-west-2")
            .with_environments(&[Environment::Development, Environment::Production]);
        let mut graph = ResourceGraph::new();
        let clusters = build(&mut graph, &config).unwrap();

        assert_eq!(graph.by_type(CLUSTER_TYPE).len(), 2);
        assert_eq!(clusters.get(Environment::Production), "Atlas-Prod-Cluster");
        assert_eq!(
            graph.get("Atlas-Dev-Cluster").unwrap().get("name").unwrap(),
            "Atlas-Dev"
        );
    }
}

//! Top-level assembly
//!
//! Drives every builder for one configuration, wires the explicit stage
//! DAG, and returns the validated graph with its creation plan. The run
//! is synchronous and all-or-nothing: it either produces a complete graph
//! or fails with a configuration error before anything is emitted.

use cloudloom_core::AssemblyConfig;
use cloudloom_graph::{ResourceGraph, StageOrderer, StagePlan, Template};

use crate::error::Result;
use crate::{cache, clusters, iam, loadbalancer, pipelines, registry, services};

/// Stage names, also the group keys inside the graph.
pub const STAGE_IDENTITY: &str = "identity";
pub const STAGE_REGISTRY: &str = "registry";
pub const STAGE_CACHE: &str = "cache";
pub const STAGE_CLUSTERS: &str = "clusters";
pub const STAGE_LOAD_BALANCERS: &str = "load-balancers";
pub const STAGE_SERVICES: &str = "services";
pub const STAGE_ROUTING: &str = "routing";
pub const STAGE_PIPELINES: &str = "pipelines";

/// A finished assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub graph: ResourceGraph,
    pub plan: StagePlan,
}

impl Assembly {
    /// Freeze into the boundary artifact for the provisioning engine.
    pub fn into_template(self, config: &AssemblyConfig) -> Result<Template> {
        Ok(Template::render(self.graph, &self.plan, config)?)
    }
}

/// Creation order between stages, independent of the order the builders
/// happen to run in.
fn stage_dag() -> StageOrderer {
    let mut orderer = StageOrderer::new();
    for stage in [
        STAGE_IDENTITY,
        STAGE_REGISTRY,
        STAGE_CACHE,
        STAGE_CLUSTERS,
        STAGE_LOAD_BALANCERS,
        STAGE_SERVICES,
        STAGE_ROUTING,
        STAGE_PIPELINES,
    ] {
        orderer.add_stage(stage);
    }

    // Role issuance precedes everything that runs under a role.
    orderer.add_dependency(STAGE_IDENTITY, STAGE_REGISTRY);
    orderer.add_dependency(STAGE_IDENTITY, STAGE_CACHE);
    orderer.add_dependency(STAGE_IDENTITY, STAGE_SERVICES);
    // Registry before cluster, cluster before service, service before
    // routing-rule attachment.
    orderer.add_dependency(STAGE_REGISTRY, STAGE_CLUSTERS);
    orderer.add_dependency(STAGE_CLUSTERS, STAGE_SERVICES);
    orderer.add_dependency(STAGE_LOAD_BALANCERS, STAGE_SERVICES);
    orderer.add_dependency(STAGE_LOAD_BALANCERS, STAGE_ROUTING);
    orderer.add_dependency(STAGE_SERVICES, STAGE_ROUTING);
    // Pipelines deploy into services that already exist.
    orderer.add_dependency(STAGE_SERVICES, STAGE_PIPELINES);

    orderer
}

/// Assemble the full resource graph for a configuration.
pub fn assemble(config: &AssemblyConfig) -> Result<Assembly> {
    config.validate()?;
    tracing::info!(
        prefix = %config.stack_prefix,
        environments = config.environments.len(),
        "assembling resource graph"
    );

    let mut graph = ResourceGraph::new();

    let roles = iam::build(&mut graph, config)?;
    let repositories = registry::build(&mut graph, config)?;
    cache::build(&mut graph, config)?;
    let clusters = clusters::build(&mut graph, config)?;
    let mut balancers = loadbalancer::build(&mut graph, config)?;
    services::build(
        &mut graph,
        config,
        &roles,
        &repositories,
        &clusters,
        &mut balancers,
    )?;
    pipelines::build(&mut graph, config, &roles, &repositories)?;

    let plan = stage_dag().plan()?;
    graph.validate_references()?;

    tracing::info!(resources = graph.len(), "assembly complete");
    Ok(Assembly { graph, plan })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_orders_the_stages() {
        let plan = stage_dag().plan().unwrap();
        assert!(plan.position(STAGE_IDENTITY) < plan.position(STAGE_REGISTRY));
        assert!(plan.position(STAGE_REGISTRY) < plan.position(STAGE_CLUSTERS));
        assert!(plan.position(STAGE_CLUSTERS) < plan.position(STAGE_SERVICES));
        assert!(plan.position(STAGE_SERVICES) < plan.position(STAGE_ROUTING));
        assert!(plan.position(STAGE_SERVICES) < plan.position(STAGE_PIPELINES));
    }

    #[test]
    fn assemble_rejects_invalid_configuration() {
        let config = AssemblyConfig::new("", "us-west-2");
        assert!(assemble(&config).is_err());
    }
}

//! Cache cluster
//!
//! A single-node Redis cluster in the private subnets, with its own
//! security group and subnet group. Shared by the non-production
//! services; production traffic does not reach it.

use serde_json::json;

use cloudloom_core::AssemblyConfig;
use cloudloom_graph::{ResourceGraph, ResourceNode};

use crate::assembly::STAGE_CACHE;
use crate::error::Result;

const CACHE_ENGINE: &str = "redis";
const CACHE_NODE_TYPE: &str = "cache.t2.small";
const CACHE_PORT: u16 = 6379;

pub fn build(graph: &mut ResourceGraph, config: &AssemblyConfig) -> Result<()> {
    let prefix = &config.stack_prefix;

    let security_group = format!("{prefix}-Cache-SecurityGroup");
    graph.add(
        STAGE_CACHE,
        ResourceNode::new(&security_group, "network:security-group")
            .attr("name", format!("{prefix}-Cache-Dev"))
            .attr("description", format!("{prefix} cache security group"))
            .attr(
                "ingress",
                json!([{ "ports": [CACHE_PORT], "source": "internal" }]),
            ),
    )?;

    let subnet_group = format!("{prefix}-Cache-SubnetGroup");
    graph.add(
        STAGE_CACHE,
        ResourceNode::new(&subnet_group, "cache:subnet-group")
            .attr("name", "cache-subnet")
            .attr("description", "subnet group for the cache cluster")
            .attr("placement", "private"),
    )?;

    let cluster = format!("{prefix}-Cache-Cluster");
    graph.add(
        STAGE_CACHE,
        ResourceNode::new(&cluster, "cache:cluster")
            .attr("name", format!("{}-dev-redis", prefix.to_ascii_lowercase()))
            .attr("engine", CACHE_ENGINE)
            .attr("node_type", CACHE_NODE_TYPE)
            .attr("num_nodes", 1)
            .reference("subnet_group", &subnet_group)
            .reference_list("security_groups", [security_group.as_str()])
            .depends_on(&subnet_group),
    )?;

    tracing::info!("declared cache cluster");
    Ok(())
}

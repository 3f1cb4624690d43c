//! Identity roles
//!
//! Four roles cover the whole deployment: one for running tasks, one for
//! build projects, one for the pipelines themselves, and one assumable by
//! account principals. Issued before any group that needs them.

use serde_json::json;

use cloudloom_core::AssemblyConfig;
use cloudloom_graph::{ResourceGraph, ResourceNode};

use crate::assembly::STAGE_IDENTITY;
use crate::error::Result;

const ROLE_TYPE: &str = "identity:role";

/// Actions the build and pipeline roles need across the toolchain.
const PIPELINE_ACTIONS: [&str; 7] = [
    "source:*",
    "build:*",
    "pipeline:*",
    "logs:*",
    "storage:*",
    "kms:*",
    "registry:*",
];

/// Logical ids of the issued roles, consumed by later groups.
#[derive(Debug, Clone)]
pub struct IdentityRoles {
    pub task_role: String,
    pub project_role: String,
    pub pipeline_role: String,
    pub assumed_role: String,
}

pub fn build(graph: &mut ResourceGraph, config: &AssemblyConfig) -> Result<IdentityRoles> {
    let prefix = &config.stack_prefix;

    let task_role = format!("{prefix}-Tasks-Role");
    graph.add(
        STAGE_IDENTITY,
        ResourceNode::new(&task_role, ROLE_TYPE)
            .attr("name", task_role.as_str())
            .attr("assumed_by", "container-tasks")
            .attr(
                "policy",
                json!([{
                    "effect": "allow",
                    "actions": ["registry:*", "secrets:*"],
                    "resources": ["*"],
                }]),
            )
            .attr(
                "managed_policies",
                json!(["task-execution", "container-full-access", "secrets-read-write"]),
            ),
    )?;

    let project_role = format!("{prefix}-Build-Project-Role");
    graph.add(
        STAGE_IDENTITY,
        ResourceNode::new(&project_role, ROLE_TYPE)
            .attr("name", project_role.as_str())
            .attr("assumed_by", "build-service")
            .attr(
                "policy",
                json!([{
                    "effect": "allow",
                    "actions": PIPELINE_ACTIONS,
                    "resources": ["*"],
                }]),
            ),
    )?;

    let assumed_role = format!("{prefix}-Pipeline-Assumed-Principal-Role");
    graph.add(
        STAGE_IDENTITY,
        ResourceNode::new(&assumed_role, ROLE_TYPE)
            .attr("name", assumed_role.as_str())
            .attr("assumed_by", json!({ "account": config.account }))
            .attr(
                "policy",
                json!([{
                    "effect": "allow",
                    "actions": PIPELINE_ACTIONS,
                    "resources": ["*"],
                }]),
            ),
    )?;

    let pipeline_role = format!("{prefix}-Pipeline-Role");
    graph.add(
        STAGE_IDENTITY,
        ResourceNode::new(&pipeline_role, ROLE_TYPE)
            .attr("name", pipeline_role.as_str())
            .attr("assumed_by", "pipeline-service")
            .attr(
                "policy",
                json!([{
                    "effect": "allow",
                    "actions": PIPELINE_ACTIONS,
                    "resources": ["*"],
                }]),
            )
            .reference_list("assume_roles", [assumed_role.as_str(), project_role.as_str()]),
    )?;

    tracing::info!("declared identity roles");
    Ok(IdentityRoles {
        task_role,
        project_role,
        pipeline_role,
        assumed_role,
    })
}

//! Services
//!
//! One builder, invoked once per (service, environment) pair from the
//! catalogue: log sink, task definition, service, target group, and the
//! routing rule that attaches it to the environment's listener.

use serde_json::{Value, json};

use cloudloom_core::{
    AssemblyConfig, CATALOGUE, Environment, EnvironmentProfile, ServiceSpec, catalogue,
};
use cloudloom_graph::{ResourceGraph, ResourceNode, reference};

use crate::assembly::STAGE_SERVICES;
use crate::clusters::Clusters;
use crate::error::Result;
use crate::iam::IdentityRoles;
use crate::loadbalancer::LoadBalancers;
use crate::registry::Repositories;

/// Rollout window the external orchestrator converges within.
const MIN_HEALTHY_PERCENT: u32 = 50;
const MAX_HEALTHY_PERCENT: u32 = 200;
const HEALTH_CHECK_GRACE_SECS: u64 = 60;

/// CPU utilization target for production autoscaling.
const AUTOSCALE_CPU_TARGET_PERCENT: u32 = 80;

/// Environment variable the API reads its connection string from, and the
/// opaque identifier of the externally managed secret backing it in
/// Development. The assembly never reads the secret value.
const API_CONNECTION_ENV: &str = "ConnectionStrings__App";
const DEV_API_CONNECTION_SECRET: &str = "external:secret/app-dev-connection-string";

/// Logical id of a pair's service node; pipelines deploy against this.
pub fn service_logical_id(prefix: &str, service: &ServiceSpec, environment: Environment) -> String {
    format!("{}-Service", service.qualified(prefix, environment))
}

pub fn build(
    graph: &mut ResourceGraph,
    config: &AssemblyConfig,
    roles: &IdentityRoles,
    repositories: &Repositories,
    clusters: &Clusters,
    balancers: &mut LoadBalancers,
) -> Result<()> {
    for &environment in &config.environments {
        let profile = EnvironmentProfile::resolve(environment);
        for service in &CATALOGUE {
            build_service(
                graph,
                config,
                roles,
                repositories,
                clusters,
                balancers,
                service,
                &profile,
            )?;
        }
        tracing::info!(environment = %environment, "declared services");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_service(
    graph: &mut ResourceGraph,
    config: &AssemblyConfig,
    roles: &IdentityRoles,
    repositories: &Repositories,
    clusters: &Clusters,
    balancers: &mut LoadBalancers,
    service: &ServiceSpec,
    profile: &EnvironmentProfile,
) -> Result<()> {
    let environment = profile.environment;
    let stem = service.qualified(&config.stack_prefix, environment);
    let repository_id = repositories.get(service.name);

    let log_group = format!("{stem}-LogGroup");
    graph.add(
        STAGE_SERVICES,
        ResourceNode::new(&log_group, "logs:group")
            .attr(
                "name",
                format!(
                    "ecs/container/{}-{}",
                    service.repository_name(&config.stack_prefix),
                    environment.short()
                ),
            )
            .attr("retention", profile.log_retention.as_str())
            .attr("removal_policy", "destroy"),
    )?;

    let task_definition = format!("{stem}-TaskDefinition");
    let mut container = json!({
        "name": service.container_name(&config.stack_prefix, environment),
        "image": {
            "repository": reference(repository_id),
            "tag": environment.title(),
        },
        "port": catalogue::CONTAINER_PORT,
        "protocol": "tcp",
        "essential": true,
        "log_group": reference(&log_group),
    });
    if let Some(env_vars) = task_environment(service, profile, &config.domain) {
        container["environment"] = env_vars;
    }
    if service.name == "API" && environment == Environment::Development {
        // Resolved by the orchestrator at task start; only the reference
        // lives here.
        container["secrets"] = json!({
            API_CONNECTION_ENV: { "secret": DEV_API_CONNECTION_SECRET },
        });
    }
    graph.add(
        STAGE_SERVICES,
        ResourceNode::new(&task_definition, "container:task-definition")
            .attr("family", stem.as_str())
            .attr("cpu_units", profile.cpu_units)
            .attr("memory_mib", profile.memory_mib)
            .reference("task_role", &roles.task_role)
            .reference("execution_role", &roles.task_role)
            .attr("container", container)
            .record_reference(repository_id)
            .record_reference(&log_group),
    )?;

    let service_id = service_logical_id(&config.stack_prefix, service, environment);
    let mut service_node = ResourceNode::new(&service_id, "container:service")
        .attr("name", stem.as_str())
        .attr("desired_count", 1)
        .attr("min_healthy_percent", MIN_HEALTHY_PERCENT)
        .attr("max_healthy_percent", MAX_HEALTHY_PERCENT)
        .attr("health_check_grace_secs", HEALTH_CHECK_GRACE_SECS)
        .attr("placement", "private")
        .attr("circuit_breaker", json!({ "rollback": false }))
        .attr(
            "capacity_provider_strategies",
            json!([{ "provider": "FARGATE", "weight": 1 }]),
        )
        .reference("cluster", clusters.get(environment))
        .reference("task_definition", &task_definition);
    if profile.max_task_count > 1 {
        service_node = service_node.attr(
            "autoscaling",
            json!({
                "max_capacity": profile.max_task_count,
                "cpu_target_percent": AUTOSCALE_CPU_TARGET_PERCENT,
            }),
        );
    }
    graph.add(STAGE_SERVICES, service_node)?;

    let target_group = format!("{stem}-TargetGroup");
    graph.add(
        STAGE_SERVICES,
        ResourceNode::new(&target_group, "network:target-group")
            .attr("name", stem.as_str())
            .attr("port", catalogue::CONTAINER_PORT)
            .attr("protocol", "HTTPS")
            .attr(
                "health_check",
                json!({
                    "path": catalogue::HEALTH_CHECK_PATH,
                    "protocol": catalogue::HEALTH_CHECK_PROTOCOL,
                    "healthy_threshold": catalogue::HEALTH_CHECK_HEALTHY_THRESHOLD,
                    "interval_secs": catalogue::HEALTH_CHECK_INTERVAL_SECS,
                    "success_codes": catalogue::HEALTH_CHECK_SUCCESS_CODES,
                    "port": catalogue::HEALTH_CHECK_PORT,
                }),
            )
            .reference_list("targets", [service_id.as_str()]),
    )?;

    balancers.rules_for(profile.listener).add_forward(
        graph,
        &format!("{stem}-Action"),
        profile.rule_priority(service.priority_index),
        &service.hostname(profile, &config.domain),
        &target_group,
    )?;

    Ok(())
}

/// Plain-text task environment for a service; sensitive values go through
/// the secrets block instead.
fn task_environment(
    service: &ServiceSpec,
    profile: &EnvironmentProfile,
    domain: &str,
) -> Option<Value> {
    match service.name {
        // The identity provider redirects back to the web frontend of the
        // same environment.
        "IDP" => {
            let web = ServiceSpec::by_name("Web").expect("Web is in the catalogue");
            Some(json!({
                "CLIENT_URL": format!("https://{}", web.hostname(profile, domain)),
            }))
        }
        "Web" => Some(json!({
            "APP_ENVIRONMENT": profile.environment.short(),
        })),
        _ => None,
    }
}

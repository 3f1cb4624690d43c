//! CI/CD pipelines
//!
//! One pipeline per (service, environment) pair: Source → Build → Deploy.
//! Staging and Production interpose a manual-approval action before the
//! deploy action; Development deploys straight through. The deploy action
//! reads the image-definition file the build publishes, keyed by the
//! container-name contract.

use serde_json::{Value, json};

use cloudloom_core::{
    AssemblyConfig, CATALOGUE, Environment, EnvironmentProfile, ServiceSpec, image_definition_file,
};
use cloudloom_graph::{ResourceGraph, ResourceNode, reference};

use crate::assembly::STAGE_PIPELINES;
use crate::error::Result;
use crate::iam::IdentityRoles;
use crate::registry::Repositories;
use crate::services::service_logical_id;

const BUILD_TIMEOUT_MINUTES: u32 = 15;
const DEPLOY_TIMEOUT_MINUTES: u32 = 60;
const ARTIFACT_EXPIRY_DAYS: u32 = 7;

pub fn build(
    graph: &mut ResourceGraph,
    config: &AssemblyConfig,
    roles: &IdentityRoles,
    repositories: &Repositories,
) -> Result<()> {
    for &environment in &config.environments {
        let profile = EnvironmentProfile::resolve(environment);
        for service in &CATALOGUE {
            build_pipeline(graph, config, roles, repositories, service, &profile)?;
        }
        tracing::info!(environment = %environment, "declared pipelines");
    }
    Ok(())
}

fn build_pipeline(
    graph: &mut ResourceGraph,
    config: &AssemblyConfig,
    roles: &IdentityRoles,
    repositories: &Repositories,
    service: &ServiceSpec,
    profile: &EnvironmentProfile,
) -> Result<()> {
    let environment = profile.environment;
    let stem = service.qualified(&config.stack_prefix, environment);
    let repository_name = service.repository_name(&config.stack_prefix);

    let bucket = format!("{stem}-ArtifactBucket");
    graph.add(
        STAGE_PIPELINES,
        ResourceNode::new(&bucket, "storage:bucket")
            .attr(
                "name",
                format!("{}-{}-artifacts", repository_name, environment.short()),
            )
            .attr("encryption", "kms_managed")
            .attr("block_public_access", true)
            .attr("removal_policy", "destroy")
            .attr(
                "lifecycle_rules",
                json!([{ "expire_days": ARTIFACT_EXPIRY_DAYS }]),
            )
            .attr(
                "grants",
                json!([{
                    "principal": reference(&roles.pipeline_role),
                    "actions": ["storage:*"],
                }]),
            )
            .record_reference(&roles.pipeline_role),
    )?;

    let build_log_group = format!("{stem}-BuildLogGroup");
    graph.add(
        STAGE_PIPELINES,
        ResourceNode::new(&build_log_group, "logs:group")
            .attr(
                "name",
                format!("codebuild/{}-{}", repository_name, environment.short()),
            )
            .attr("retention", profile.log_retention.as_str())
            .attr("removal_policy", "destroy"),
    )?;

    let project = format!("{stem}-BuildProject");
    graph.add(
        STAGE_PIPELINES,
        ResourceNode::new(&project, "build:project")
            .attr("name", stem.as_str())
            .attr(
                "description",
                format!(
                    "Build project for {} {} {}",
                    config.stack_prefix,
                    service.name,
                    environment.title()
                ),
            )
            .attr("compute", "small")
            .attr("privileged", true)
            .attr("timeout_minutes", BUILD_TIMEOUT_MINUTES)
            .attr("buildspec", buildspec(config, &repository_name, environment))
            .attr(
                "source",
                json!({ "repository": format!("{}-{}", config.stack_prefix, service.name) }),
            )
            .reference("role", &roles.project_role)
            .reference("artifact_bucket", &bucket)
            .reference("log_group", &build_log_group)
            .reference("image_repository", repositories.get(service.name)),
    )?;

    let service_id = service_logical_id(&config.stack_prefix, service, environment);
    let deploy_actions = deploy_stage_actions(profile, &service_id, environment);

    let pipeline = format!("{stem}-Pipeline");
    graph.add(
        STAGE_PIPELINES,
        ResourceNode::new(&pipeline, "pipeline:pipeline")
            .attr("name", stem.as_str())
            .attr(
                "stages",
                json!([
                    {
                        "name": "Source",
                        "actions": [{
                            "name": "Source",
                            "kind": "source",
                            "repository": format!("{}-{}", config.stack_prefix, service.name),
                            "branch": profile.source_branch,
                        }],
                    },
                    {
                        "name": "Build",
                        "actions": [{
                            "name": "Build",
                            "kind": "build",
                            "project": reference(&project),
                        }],
                    },
                    {
                        "name": "Deploy",
                        "actions": deploy_actions,
                    },
                ]),
            )
            .reference("role", &roles.pipeline_role)
            .reference("artifact_bucket", &bucket)
            .record_reference(&project)
            .record_reference(&service_id),
    )?;

    Ok(())
}

/// Deploy-stage actions for a profile: the manual-approval gate precedes
/// the deploy action everywhere but Development.
fn deploy_stage_actions(
    profile: &EnvironmentProfile,
    service_id: &str,
    environment: Environment,
) -> Value {
    let deploy = json!({
        "name": "Deploy",
        "kind": "deploy",
        "service": reference(service_id),
        "image_definition_file": image_definition_file(environment),
        "timeout_minutes": DEPLOY_TIMEOUT_MINUTES,
    });
    if profile.requires_approval {
        json!([{ "name": "Approve", "kind": "manual-approval" }, deploy])
    } else {
        json!([deploy])
    }
}

/// Build phases: log in to the registry, build and tag the image twice
/// (environment tag plus short commit hash), push both.
fn buildspec(config: &AssemblyConfig, repository_name: &str, environment: Environment) -> Value {
    let registry_uri = format!(
        "{}.registry.{}.internal/{}",
        config.account, config.region, repository_name
    );
    let tag = environment.title();
    json!({
        "version": "0.2",
        "phases": {
            "pre_build": {
                "commands": [
                    "echo Logging in to the image registry...",
                    format!("REPOSITORY_URI={registry_uri}"),
                    "COMMIT_HASH=$(echo $SOURCE_VERSION | cut -c 1-7)",
                    format!("IMAGE_TAG=${{COMMIT_HASH:={tag}}}"),
                ],
            },
            "build": {
                "commands": [
                    "echo Build started on `date`",
                    format!("docker build -t $REPOSITORY_URI:{tag} ."),
                    format!("docker tag $REPOSITORY_URI:{tag} $REPOSITORY_URI:$IMAGE_TAG"),
                ],
            },
            "post_build": {
                "commands": [
                    "echo Build completed on `date`",
                    format!("docker push $REPOSITORY_URI:{tag}"),
                    "docker push $REPOSITORY_URI:$IMAGE_TAG",
                ],
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_deploys_without_approval() {
        let profile = EnvironmentProfile::resolve(Environment::Development);
        let actions = deploy_stage_actions(&profile, "svc", Environment::Development);
        let actions = actions.as_array().unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["kind"], "deploy");
        assert_eq!(actions[0]["image_definition_file"], "imageDef-Dev.json");
    }

    #[test]
    fn staging_and_production_gate_the_deploy() {
        for environment in [Environment::Staging, Environment::Production] {
            let profile = EnvironmentProfile::resolve(environment);
            let actions = deploy_stage_actions(&profile, "svc", environment);
            let actions = actions.as_array().unwrap();
            assert_eq!(actions.len(), 2);
            assert_eq!(actions[0]["kind"], "manual-approval");
            assert_eq!(actions[1]["kind"], "deploy");
        }
    }

    #[test]
    fn buildspec_tags_with_environment_and_commit_hash() {
        let config = AssemblyConfig::new("123456789012", "us-west-2");
        let spec = buildspec(&config, "atlas-api", Environment::Production);
        let pre_build = spec["phases"]["pre_build"]["commands"].as_array().unwrap();
        assert_eq!(
            pre_build[1],
            "REPOSITORY_URI=123456789012.registry.us-west-2.internal/atlas-api"
        );
        let build = spec["phases"]["build"]["commands"].as_array().unwrap();
        assert_eq!(build[1], "docker build -t $REPOSITORY_URI:Prod .");
    }
}

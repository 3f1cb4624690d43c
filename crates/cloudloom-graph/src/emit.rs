//! Template emission
//!
//! Serializes a finished graph into the declarative format handed to the
//! external provisioning engine: a header, the ordered stage list, and a
//! nested mapping of logical resource name → type → attributes.
//! Emission is all-or-nothing: validation failures abort before any
//! output is produced.

use std::collections::BTreeMap;

use serde::Serialize;

use cloudloom_core::AssemblyConfig;

use crate::error::Result;
use crate::graph::ResourceGraph;
use crate::node::ResourceNode;
use crate::order::StagePlan;

/// Format version stamped into every emitted template.
pub const FORMAT_VERSION: &str = "cloudloom/1";

/// The boundary artifact submitted to the provisioning engine.
///
/// Field order here is serialization order; resources are keyed by
/// logical id in a `BTreeMap`, so the same graph always emits the same
/// bytes.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    pub format_version: &'static str,
    pub description: String,
    pub account: String,
    pub region: String,
    /// Creation order for resource stages.
    pub stages: Vec<String>,
    pub resources: BTreeMap<String, ResourceNode>,
}

impl Template {
    /// Validate and freeze a graph into its emitted form.
    pub fn render(graph: ResourceGraph, plan: &StagePlan, config: &AssemblyConfig) -> Result<Self> {
        graph.validate_references()?;
        tracing::info!(
            resources = graph.len(),
            stages = plan.stages.len(),
            "rendering template"
        );
        Ok(Self {
            format_version: FORMAT_VERSION,
            description: config.description.clone(),
            account: config.account.clone(),
            region: config.region.clone(),
            stages: plan.stages.clone(),
            resources: graph.into_nodes(),
        })
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ResourceNode;
    use crate::order::StageOrderer;

    fn fixture() -> (ResourceGraph, StagePlan, AssemblyConfig) {
        let mut graph = ResourceGraph::new();
        graph
            .add(
                "registry",
                ResourceNode::new("atlas-api-repo", "registry:repository").attr("name", "atlas-api"),
            )
            .unwrap();
        graph
            .add(
                "services",
                ResourceNode::new("Atlas-API-Dev-Service", "container:service")
                    .reference("repository", "atlas-api-repo"),
            )
            .unwrap();

        let mut orderer = StageOrderer::new();
        orderer.add_stage("registry");
        orderer.add_stage("services");
        orderer.add_dependency("registry", "services");
        let plan = orderer.plan().unwrap();

        let config = AssemblyConfig::new("123456789012", "us-west-2");
        (graph, plan, config)
    }

    #[test]
    fn render_validates_references() {
        let (mut graph, plan, config) = fixture();
        graph
            .add(
                "services",
                ResourceNode::new("broken", "container:service").reference("cluster", "ghost"),
            )
            .unwrap();
        assert!(Template::render(graph, &plan, &config).is_err());
    }

    #[test]
    fn emission_is_byte_identical_across_builds() {
        let (graph_a, plan_a, config) = fixture();
        let (graph_b, plan_b, _) = fixture();
        let a = Template::render(graph_a, &plan_a, &config).unwrap();
        let b = Template::render(graph_b, &plan_b, &config).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(a.to_yaml().unwrap(), b.to_yaml().unwrap());
    }

    #[test]
    fn template_carries_header_and_stage_order() {
        let (graph, plan, config) = fixture();
        let template = Template::render(graph, &plan, &config).unwrap();
        assert_eq!(template.format_version, FORMAT_VERSION);
        assert_eq!(template.account, "123456789012");
        assert_eq!(template.stages, ["registry", "services"]);

        let json = template.to_json().unwrap();
        assert!(json.contains("\"Atlas-API-Dev-Service\""));
        assert!(json.contains("\"$ref\": \"atlas-api-repo\""));
        assert!(json.ends_with('\n'));
    }
}

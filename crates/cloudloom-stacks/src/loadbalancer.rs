//! Load balancers, listeners and routing rules
//!
//! Two internet-facing load balancers: one shared by Development and
//! Staging, one for Production. Each carries an HTTPS listener with a
//! fixed default action and a fixed health-check responder; service
//! routing rules attach through [`ListenerRules`], which enforces the
//! per-listener priority-uniqueness invariant at insertion time.

use std::collections::BTreeMap;

use serde_json::json;

use cloudloom_core::{AssemblyConfig, ConfigError, Environment, ListenerClass, catalogue};
use cloudloom_graph::{ResourceGraph, ResourceNode, reference};

use crate::assembly::{STAGE_LOAD_BALANCERS, STAGE_ROUTING};
use crate::error::Result;

/// Priority of the fixed health-check responder on each listener.
/// Service rules stay below it.
pub const FIXED_RESPONSE_PRIORITY: u32 = 10;

/// Opaque identifier of the externally managed TLS certificate. The
/// assembly never reads the certificate, only its reference.
pub const TLS_CERTIFICATE_REF: &str = "managed-certificate/primary";

const DEFAULT_ACTION_BODY: &str = "Default listener action";

/// Ingress allowlist for the non-production balancer.
const NON_PROD_ALLOWLIST: [(&str, &str); 2] = [
    ("203.0.113.10/32", "ops bastion"),
    ("203.0.113.24/32", "office vpn"),
];

/// Rule collector for one listener.
///
/// Every rule on a listener goes through [`ListenerRules::add_forward`]
/// or [`ListenerRules::add_fixed_response`]; a duplicate priority is a
/// configuration error at insertion time, not a provisioning-time
/// surprise.
#[derive(Debug, Clone)]
pub struct ListenerRules {
    listener_id: String,
    priorities: BTreeMap<u32, String>,
}

impl ListenerRules {
    fn new(listener_id: String) -> Self {
        Self {
            listener_id,
            priorities: BTreeMap::new(),
        }
    }

    pub fn listener_id(&self) -> &str {
        &self.listener_id
    }

    /// Priorities taken so far, in ascending order.
    pub fn priorities(&self) -> Vec<u32> {
        self.priorities.keys().copied().collect()
    }

    fn claim(&mut self, priority: u32, rule_id: &str) -> Result<()> {
        if self.priorities.contains_key(&priority) {
            return Err(ConfigError::DuplicatePriority {
                listener: self.listener_id.clone(),
                priority,
            }
            .into());
        }
        self.priorities.insert(priority, rule_id.to_string());
        Ok(())
    }

    /// Attach a host-header rule forwarding to a target group.
    pub fn add_forward(
        &mut self,
        graph: &mut ResourceGraph,
        rule_id: &str,
        priority: u32,
        hostname: &str,
        target_group: &str,
    ) -> Result<()> {
        self.claim(priority, rule_id)?;
        graph.add(
            STAGE_ROUTING,
            ResourceNode::new(rule_id, "network:listener-rule")
                .reference("listener", &self.listener_id)
                .attr("priority", priority)
                .attr("condition", json!({ "host_headers": [hostname] }))
                .attr(
                    "action",
                    json!({ "forward": [reference(target_group)] }),
                )
                .record_reference(target_group),
        )?;
        Ok(())
    }

    /// Attach a path-pattern rule answering with a fixed response.
    pub fn add_fixed_response(
        &mut self,
        graph: &mut ResourceGraph,
        rule_id: &str,
        priority: u32,
        path: &str,
        body: &str,
    ) -> Result<()> {
        self.claim(priority, rule_id)?;
        graph.add(
            STAGE_ROUTING,
            ResourceNode::new(rule_id, "network:listener-rule")
                .reference("listener", &self.listener_id)
                .attr("priority", priority)
                .attr("condition", json!({ "path_patterns": [path] }))
                .attr(
                    "action",
                    json!({
                        "fixed_response": {
                            "status": 200,
                            "content_type": "text/plain",
                            "body": body,
                        }
                    }),
                ),
        )?;
        Ok(())
    }
}

/// The two listeners' rule collectors.
#[derive(Debug, Clone)]
pub struct LoadBalancers {
    pub non_prod: ListenerRules,
    pub prod: ListenerRules,
}

impl LoadBalancers {
    pub fn rules_for(&mut self, class: ListenerClass) -> &mut ListenerRules {
        match class {
            ListenerClass::NonProduction => &mut self.non_prod,
            ListenerClass::Production => &mut self.prod,
        }
    }
}

pub fn build(graph: &mut ResourceGraph, config: &AssemblyConfig) -> Result<LoadBalancers> {
    let non_prod = build_balancer(graph, config, ListenerClass::NonProduction)?;
    let prod = build_balancer(graph, config, ListenerClass::Production)?;
    tracing::info!("declared load balancers and listeners");
    Ok(LoadBalancers { non_prod, prod })
}

fn build_balancer(
    graph: &mut ResourceGraph,
    config: &AssemblyConfig,
    class: ListenerClass,
) -> Result<ListenerRules> {
    let prefix = &config.stack_prefix;
    let (label, environment_tag) = match class {
        ListenerClass::NonProduction => ("NonProd", Environment::Development.title()),
        ListenerClass::Production => ("Prod", Environment::Production.title()),
    };

    let security_group = format!("{prefix}-ALB-{label}-SecurityGroup");
    let ingress = match class {
        // Non-production stays reachable only from the allowlist.
        ListenerClass::NonProduction => json!(
            NON_PROD_ALLOWLIST
                .iter()
                .map(|(cidr, description)| {
                    json!({ "ports": "all", "source": cidr, "description": description })
                })
                .collect::<Vec<_>>()
        ),
        ListenerClass::Production => json!([
            { "ports": [80], "source": "any" },
            { "ports": [443], "source": "any" },
        ]),
    };
    graph.add(
        STAGE_LOAD_BALANCERS,
        ResourceNode::new(&security_group, "network:security-group")
            .attr("name", security_group.as_str())
            .attr("description", format!("{prefix} {label} load balancer"))
            .attr("ingress", ingress)
            .attr("allow_all_outbound", true),
    )?;

    let balancer = format!("{prefix}-{label}-ALB");
    graph.add(
        STAGE_LOAD_BALANCERS,
        ResourceNode::new(&balancer, "network:load-balancer")
            .attr("name", format!("{prefix}-{label}"))
            .attr("internet_facing", true)
            .attr("ip_address_type", "dual_stack")
            .attr("placement", "public")
            .attr(
                "redirect",
                json!({ "from_port": 80, "to_port": 443, "protocol": "HTTPS" }),
            )
            .attr(
                "tags",
                json!({ "application": prefix, "environment": environment_tag }),
            )
            .reference_list("security_groups", [security_group.as_str()]),
    )?;

    let listener = format!("{prefix}-{label}-Listener");
    graph.add(
        STAGE_LOAD_BALANCERS,
        ResourceNode::new(&listener, "network:listener")
            .attr("port", 443)
            .attr("protocol", "HTTPS")
            .attr("certificates", json!([TLS_CERTIFICATE_REF]))
            .attr(
                "default_action",
                json!({
                    "fixed_response": {
                        "status": 200,
                        "body": DEFAULT_ACTION_BODY,
                    }
                }),
            )
            .reference("load_balancer", &balancer),
    )?;

    let mut rules = ListenerRules::new(listener);
    rules.add_fixed_response(
        graph,
        &format!("{prefix}-{label}-HealthCheck-Action"),
        FIXED_RESPONSE_PRIORITY,
        catalogue::HEALTH_CHECK_PATH,
        "OK",
    )?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssemblyError;

    fn balancers() -> (ResourceGraph, LoadBalancers) {
        let config = AssemblyConfig::new("123456789012", "us-west-2");
        let mut graph = ResourceGraph::new();
        let lbs = build(&mut graph, &config).unwrap();
        (graph, lbs)
    }

    #[test]
    fn both_listeners_carry_the_health_check_responder() {
        let (graph, lbs) = balancers();
        assert_eq!(lbs.non_prod.priorities(), vec![FIXED_RESPONSE_PRIORITY]);
        assert_eq!(lbs.prod.priorities(), vec![FIXED_RESPONSE_PRIORITY]);
        assert_eq!(graph.by_type("network:listener").len(), 2);
        assert_eq!(graph.by_type("network:listener-rule").len(), 2);
    }

    #[test]
    fn duplicate_priority_is_a_configuration_error() {
        let (mut graph, mut lbs) = balancers();
        lbs.non_prod
            .add_forward(&mut graph, "rule-a", 1, "api-dev.example.org", "tg-a")
            .unwrap();
        let err = lbs
            .non_prod
            .add_forward(&mut graph, "rule-b", 1, "web-dev.example.org", "tg-b")
            .unwrap_err();
        match err {
            AssemblyError::Config(ConfigError::DuplicatePriority { listener, priority }) => {
                assert_eq!(listener, "Atlas-NonProd-Listener");
                assert_eq!(priority, 1);
            }
            other => panic!("expected duplicate-priority error, got {other}"),
        }
    }

    #[test]
    fn listeners_are_independent_priority_spaces() {
        let (mut graph, mut lbs) = balancers();
        lbs.non_prod
            .add_forward(&mut graph, "rule-np", 1, "api-dev.example.org", "tg-a")
            .unwrap();
        lbs.prod
            .add_forward(&mut graph, "rule-p", 1, "api.example.org", "tg-b")
            .unwrap();
        assert_eq!(lbs.non_prod.priorities(), vec![1, FIXED_RESPONSE_PRIORITY]);
        assert_eq!(lbs.prod.priorities(), vec![1, FIXED_RESPONSE_PRIORITY]);
    }
}

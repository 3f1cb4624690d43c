//! The resource graph
//!
//! Owned exclusively by one assembly run; the external provisioning engine
//! owns every actual resource lifecycle after emission. Nodes live in a
//! `BTreeMap` so iteration, and therefore emission, is deterministic.

use std::collections::BTreeMap;

use crate::error::{GraphError, Result};
use crate::node::ResourceNode;

/// Aggregate of every logical resource declared by an assembly run,
/// grouped into named stages.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: BTreeMap<String, ResourceNode>,
    /// Stage name → logical ids, in insertion order.
    groups: Vec<(String, Vec<String>)>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under a stage.
    ///
    /// Logical ids are unique across the whole graph, not per stage.
    pub fn add(&mut self, stage: &str, node: ResourceNode) -> Result<()> {
        if self.nodes.contains_key(&node.logical_id) {
            return Err(GraphError::DuplicateResource(node.logical_id.clone()));
        }
        tracing::debug!(stage, id = %node.logical_id, "declared resource");
        let id = node.logical_id.clone();
        match self.groups.iter_mut().find(|(name, _)| name == stage) {
            Some((_, ids)) => ids.push(id.clone()),
            None => self.groups.push((stage.to_string(), vec![id.clone()])),
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn get(&self, logical_id: &str) -> Option<&ResourceNode> {
        self.nodes.get(logical_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Logical ids in a stage, in declaration order.
    pub fn stage_members(&self, stage: &str) -> &[String] {
        self.groups
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Stage names in declaration order.
    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// Nodes of a given resource type, in logical-id order.
    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceNode> {
        self.nodes
            .values()
            .filter(|n| n.resource_type == resource_type)
            .collect()
    }

    /// Every reference must point at a node present in this graph.
    pub fn validate_references(&self) -> Result<()> {
        for node in self.nodes.values() {
            for target in &node.references {
                if !self.nodes.contains_key(target) {
                    return Err(GraphError::UnknownReference {
                        src: node.logical_id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn into_nodes(self) -> BTreeMap<String, ResourceNode> {
        self.nodes
    }
}

//! Logical resource nodes

use serde::Serialize;
use serde_json::{Map, Value};

/// Marker key for a named pointer to another resource in the graph.
pub const REF_KEY: &str = "$ref";

/// Attribute value pointing at another resource by logical id.
///
/// The emitter leaves these in place; the external provisioning engine
/// resolves them against the `resources` mapping.
pub fn reference(target: impl Into<String>) -> Value {
    let mut pointer = Map::new();
    pointer.insert(REF_KEY.to_string(), Value::String(target.into()));
    Value::Object(pointer)
}

/// One logical resource: a name, a type, and a deterministic attribute map.
///
/// Attributes are plain JSON; keys serialize in sorted order so two builds
/// from the same inputs are byte-identical. References made through
/// [`ResourceNode::reference`] are also tracked by target id for
/// validation before emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceNode {
    #[serde(skip)]
    pub logical_id: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    pub properties: Map<String, Value>,

    #[serde(skip)]
    pub references: Vec<String>,
}

impl ResourceNode {
    pub fn new(logical_id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            properties: Map::new(),
            references: Vec::new(),
        }
    }

    /// Set an attribute (builder style).
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set an attribute to a named pointer at another resource.
    pub fn reference(mut self, key: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        self.properties.insert(key.into(), reference(&target));
        self.references.push(target);
        self
    }

    /// Set an attribute to a list of named pointers.
    pub fn reference_list<I, S>(mut self, key: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        let values: Vec<Value> = targets.iter().map(reference).collect();
        self.properties.insert(key.into(), Value::Array(values));
        self.references.extend(targets);
        self
    }

    /// Record a creation-order dependency on another resource without
    /// giving it an attribute of its own.
    pub fn depends_on(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        let deps = self
            .properties
            .entry("depends_on".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = deps {
            list.push(Value::String(target.clone()));
        }
        self.references.push(target);
        self
    }

    /// Track a reference embedded in a nested attribute value (built with
    /// [`reference`] inside a larger JSON object) so validation still sees
    /// it.
    pub fn record_reference(mut self, target: impl Into<String>) -> Self {
        self.references.push(target.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_serialize_with_sorted_keys() {
        let node = ResourceNode::new("a", "t")
            .attr("zebra", 1)
            .attr("alpha", 2);
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.find("alpha").unwrap() < json.find("zebra").unwrap());
    }

    #[test]
    fn references_are_tracked_and_serialized_as_pointers() {
        let node = ResourceNode::new("service", "container:service")
            .reference("cluster", "Atlas-Dev-Cluster")
            .reference_list("target_groups", ["tg-1", "tg-2"]);
        assert_eq!(
            node.references,
            vec!["Atlas-Dev-Cluster", "tg-1", "tg-2"]
        );
        assert_eq!(
            node.get("cluster").unwrap(),
            &reference("Atlas-Dev-Cluster")
        );
    }

    #[test]
    fn depends_on_accumulates() {
        let node = ResourceNode::new("cache", "cache:cluster")
            .depends_on("subnet-group")
            .depends_on("security-group");
        let deps = node.get("depends_on").unwrap().as_array().unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(node.references.len(), 2);
    }
}

//! Explicit ordering of resource stages
//!
//! Creation order is a first-class artifact: stages declare edges and the
//! orderer produces a plan, so reordering the assembly code never silently
//! changes provisioning order. Kahn's algorithm with insertion-order
//! tie-breaking keeps the plan stable across runs.

use std::collections::HashMap;

use crate::error::{GraphError, Result};

/// Ordered creation plan for the graph's stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub stages: Vec<String>,
}

impl StagePlan {
    /// Position of a stage in the plan.
    pub fn position(&self, stage: &str) -> Option<usize> {
        self.stages.iter().position(|s| s == stage)
    }
}

/// Directed acyclic graph of named stages.
#[derive(Debug, Clone, Default)]
pub struct StageOrderer {
    stages: Vec<String>,
    /// (before, after) pairs.
    edges: Vec<(String, String)>,
}

impl StageOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stage. Registration order breaks ties in the plan.
    pub fn add_stage(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.stages.contains(&name) {
            self.stages.push(name);
        }
    }

    /// Declare that `before` must be created before `after`.
    pub fn add_dependency(&mut self, before: &str, after: &str) {
        self.edges.push((before.to_string(), after.to_string()));
    }

    /// Topologically sort the stages.
    ///
    /// Fails with [`GraphError::UnknownStage`] if an edge names an
    /// unregistered stage, and [`GraphError::DependencyCycle`] naming one
    /// offending edge if the graph has a cycle.
    pub fn plan(&self) -> Result<StagePlan> {
        let index: HashMap<&str, usize> = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let n = self.stages.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree: Vec<usize> = vec![0; n];

        for (before, after) in &self.edges {
            let &from = index
                .get(before.as_str())
                .ok_or_else(|| GraphError::UnknownStage(before.clone()))?;
            let &to = index
                .get(after.as_str())
                .ok_or_else(|| GraphError::UnknownStage(after.clone()))?;
            adjacency[from].push(to);
            in_degree[to] += 1;
        }

        let mut remaining: Vec<bool> = vec![true; n];
        let mut ordered = Vec::with_capacity(n);

        while ordered.len() < n {
            // Lowest registration index among ready stages keeps the plan
            // deterministic when stages are independent.
            let next = (0..n).find(|&i| remaining[i] && in_degree[i] == 0);
            let Some(next) = next else {
                let (from, to) = self.find_cycle_edge(&remaining, &adjacency);
                return Err(GraphError::DependencyCycle { from, to });
            };
            remaining[next] = false;
            ordered.push(self.stages[next].clone());
            for &to in &adjacency[next] {
                in_degree[to] -= 1;
            }
        }

        Ok(StagePlan { stages: ordered })
    }

    /// Pick one edge among the stuck stages to report.
    fn find_cycle_edge(&self, remaining: &[bool], adjacency: &[Vec<usize>]) -> (String, String) {
        for (from, targets) in adjacency.iter().enumerate() {
            if !remaining[from] {
                continue;
            }
            for &to in targets {
                if remaining[to] {
                    return (self.stages[from].clone(), self.stages[to].clone());
                }
            }
        }
        // Unreachable when called with a stuck sort; kept total anyway.
        (String::new(), String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orderer(stages: &[&str], edges: &[(&str, &str)]) -> StageOrderer {
        let mut o = StageOrderer::new();
        for s in stages {
            o.add_stage(*s);
        }
        for (b, a) in edges {
            o.add_dependency(b, a);
        }
        o
    }

    #[test]
    fn plan_respects_edges() {
        let o = orderer(
            &["services", "registry", "identity", "clusters"],
            &[
                ("identity", "registry"),
                ("registry", "clusters"),
                ("clusters", "services"),
            ],
        );
        let plan = o.plan().unwrap();
        assert!(plan.position("identity") < plan.position("registry"));
        assert!(plan.position("registry") < plan.position("clusters"));
        assert!(plan.position("clusters") < plan.position("services"));
    }

    #[test]
    fn independent_stages_keep_registration_order() {
        let o = orderer(&["cache", "registry", "identity"], &[]);
        let plan = o.plan().unwrap();
        assert_eq!(plan.stages, ["cache", "registry", "identity"]);
    }

    #[test]
    fn plan_is_stable_across_runs() {
        let o = orderer(
            &["a", "b", "c", "d"],
            &[("a", "c"), ("b", "c"), ("c", "d")],
        );
        assert_eq!(o.plan().unwrap(), o.plan().unwrap());
    }

    #[test]
    fn cycle_reports_an_offending_pair() {
        let o = orderer(
            &["registry", "clusters"],
            &[("registry", "clusters"), ("clusters", "registry")],
        );
        let err = o.plan().unwrap_err();
        match err {
            GraphError::DependencyCycle { from, to } => {
                assert!(
                    (from == "registry" && to == "clusters")
                        || (from == "clusters" && to == "registry")
                );
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn unknown_stage_in_edge_is_rejected() {
        let o = orderer(&["registry"], &[("registry", "ghost")]);
        let err = o.plan().unwrap_err();
        assert!(matches!(err, GraphError::UnknownStage(s) if s == "ghost"));
    }
}

//! Resource graph assembly for cloudloom
//!
//! A [`ResourceGraph`] is the in-memory form of everything one assembly
//! run declares: named [`ResourceNode`]s grouped into stages, with
//! references between nodes resolved as named pointers. The
//! [`StageOrderer`] turns the stages' explicit dependency edges into a
//! creation plan, and [`Template`] serializes the result for the external
//! provisioning engine.
//!
//! ```text
//! profiles ──▶ builders ──▶ ResourceGraph ──▶ StageOrderer ──▶ Template
//!                                │                 │              │
//!                            nodes + refs      StagePlan      JSON / YAML
//! ```

pub mod emit;
pub mod error;
pub mod graph;
pub mod node;
pub mod order;

// Re-exports
pub use emit::Template;
pub use error::{GraphError, Result};
pub use graph::ResourceGraph;
pub use node::{ResourceNode, reference};
pub use order::{StageOrderer, StagePlan};

//! Call-Graph Analyzer
//!
//! Builds caller/callee adjacency from canonical call edges, runs bounded
//! breadth-first traversals, and computes blast-radius impact trees.

pub mod graph;
pub mod traverse;
pub mod impact;

pub use graph::{CallGraph, CallGraphStats, NodeClass};
pub use traverse::{
    bounded_traverse, temporal_trace, CallShapeDenylist, Direction, Traversal, TraversalBounds,
    TraversalEdge, TraversalNode,
};
pub use impact::{blast_radius, AffectedSurface, ImpactTree, RiskBands, RiskLevel};

//! Service Topology Builder
//!
//! Merges per-repository service inventories across deployment layers, infers
//! cross-repo dependency edges from observed calls and type contracts, and
//! ranks repository criticality.

pub mod builder;

pub use builder::{
    build_ecosystem_graph, focus, DependencyEdge, EcosystemGraph, FocusView, ImpactWeights,
    OwnershipRules, RepositoryImpact, TopologyOptions,
};

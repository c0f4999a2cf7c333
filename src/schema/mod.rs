//! Canonical schema - language-agnostic shapes every front end emits
//!
//! Front-end extractors for any source language produce these records; the
//! analysis engine only ever branches on this schema, never on language
//! specifics.

pub mod types;
pub mod calls;
pub mod service;
pub mod snapshot;

pub use types::{
    FieldDefinition, RelationshipKind, TypeDefinition, TypeKind, TypeRef, TypeRelationship,
    Variant, relationships_from,
};
pub use calls::CallEdge;
pub use service::{OutboundCall, ServiceInfo, ServiceLayer};
pub use snapshot::{
    ExtractionSnapshot, ModuleRecord, SnapshotRef, TopologyFacts, TypeFacts, TOPOLOGY_DOMAIN,
    TYPE_DOMAIN,
};

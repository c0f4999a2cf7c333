//! Extraction snapshots - immutable captured facts for one (repo, ref)
//!
//! A snapshot holds whatever fact domains its front ends produced, keyed by
//! domain name. The two well-known domains get typed accessors; anything else
//! stays opaque JSON and is still diffable. Snapshots are write-once: the
//! newest `captured_at` for a (repo, ref) pair supersedes earlier captures.

use crate::schema::calls::CallEdge;
use crate::schema::service::{OutboundCall, ServiceInfo};
use crate::schema::types::{TypeDefinition, TypeRelationship};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Domain name for type/schema facts
pub const TYPE_DOMAIN: &str = "type_definitions";
/// Domain name for service inventory facts
pub const TOPOLOGY_DOMAIN: &str = "service_topology";

/// A module/namespace found in a source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub name: String,
    #[serde(default)]
    pub origin_file: String,
}

/// Facts stored under the `type_definitions` domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeFacts {
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    #[serde(default)]
    pub relationships: Vec<TypeRelationship>,
    #[serde(default)]
    pub modules: Vec<ModuleRecord>,
    #[serde(default)]
    pub calls: Vec<CallEdge>,
}

impl TypeFacts {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.relationships.is_empty()
            && self.modules.is_empty()
            && self.calls.is_empty()
    }

    /// Merge another file's facts into this set
    pub fn merge(&mut self, other: TypeFacts) {
        self.types.extend(other.types);
        self.relationships.extend(other.relationships);
        self.modules.extend(other.modules);
        self.calls.extend(other.calls);
    }
}

/// Facts stored under the `service_topology` domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyFacts {
    #[serde(default)]
    pub services: Vec<ServiceInfo>,
    #[serde(default)]
    pub outbound_calls: Vec<OutboundCall>,
}

/// Immutable captured facts for one (repo, ref).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSnapshot {
    pub repo: String,
    pub git_ref: String,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub facts_by_domain: BTreeMap<String, serde_json::Value>,
}

impl ExtractionSnapshot {
    pub fn new(repo: impl Into<String>, git_ref: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            repo: repo.into(),
            git_ref: git_ref.into(),
            captured_at,
            facts_by_domain: BTreeMap::new(),
        }
    }

    pub fn set_type_facts(&mut self, facts: &TypeFacts) -> Result<()> {
        self.facts_by_domain
            .insert(TYPE_DOMAIN.to_string(), serde_json::to_value(facts)?);
        Ok(())
    }

    pub fn set_topology_facts(&mut self, facts: &TopologyFacts) -> Result<()> {
        self.facts_by_domain
            .insert(TOPOLOGY_DOMAIN.to_string(), serde_json::to_value(facts)?);
        Ok(())
    }

    /// Typed view of the `type_definitions` domain.
    ///
    /// A missing or malformed domain degrades to empty facts - an unparsed
    /// file legitimately yields zero facts, so absence is never a fault.
    pub fn type_facts(&self) -> TypeFacts {
        self.domain_as(TYPE_DOMAIN)
    }

    /// Typed view of the `service_topology` domain.
    pub fn topology_facts(&self) -> TopologyFacts {
        self.domain_as(TOPOLOGY_DOMAIN)
    }

    fn domain_as<T: Default + serde::de::DeserializeOwned>(&self, domain: &str) -> T {
        match self.facts_by_domain.get(domain) {
            None => T::default(),
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(facts) => facts,
                Err(e) => {
                    tracing::warn!(
                        "malformed '{}' facts in {}@{}: {}",
                        domain,
                        self.repo,
                        self.git_ref,
                        e
                    );
                    T::default()
                }
            },
        }
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.facts_by_domain.keys().map(|k| k.as_str())
    }
}

/// A (ref, captured_at) entry from the store listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub git_ref: String,
    pub captured_at: DateTime<Utc>,
}

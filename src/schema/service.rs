//! Service facts - inventories and outbound calls per repository

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Deployment layer of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceLayer {
    /// Externally routable, keyed by route pattern
    Edge,
    /// Cluster-deployed workload whose owning repo must be resolved
    Backend,
    /// In-process service, always owned by its own repo
    Internal,
}

impl ServiceLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLayer::Edge => "edge",
            ServiceLayer::Backend => "backend",
            ServiceLayer::Internal => "internal",
        }
    }

    pub fn all() -> &'static [ServiceLayer] {
        &[ServiceLayer::Edge, ServiceLayer::Backend, ServiceLayer::Internal]
    }
}

impl FromStr for ServiceLayer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "edge" | "gateway" => Ok(ServiceLayer::Edge),
            "backend" | "cluster" => Ok(ServiceLayer::Backend),
            "internal" => Ok(ServiceLayer::Internal),
            _ => Err(Error::InvalidSnapshot(format!("Unknown service layer: {}", s))),
        }
    }
}

impl std::fmt::Display for ServiceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One service in a repository's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub layer: ServiceLayer,
    /// Owning repository, when the front end could determine it
    #[serde(default)]
    pub owner_repo: Option<String>,
    #[serde(default)]
    pub route_patterns: Vec<String>,
    #[serde(default)]
    pub container_image: Option<String>,
}

impl ServiceInfo {
    pub fn new(name: impl Into<String>, layer: ServiceLayer) -> Self {
        Self {
            name: name.into(),
            layer,
            owner_repo: None,
            route_patterns: Vec::new(),
            container_image: None,
        }
    }

    pub fn with_owner(mut self, repo: impl Into<String>) -> Self {
        self.owner_repo = Some(repo.into());
        self
    }

    pub fn with_route(mut self, pattern: impl Into<String>) -> Self {
        self.route_patterns.push(pattern.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.container_image = Some(image.into());
        self
    }
}

/// An observed outbound call whose target may name another repo's service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCall {
    /// Target label: a route pattern, a service name, or a host
    pub target: String,
    #[serde(default)]
    pub origin_file: String,
    #[serde(default)]
    pub origin_line: u32,
}

impl OutboundCall {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            origin_file: String::new(),
            origin_line: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_roundtrip() {
        for layer in ServiceLayer::all() {
            let parsed: ServiceLayer = layer.as_str().parse().unwrap();
            assert_eq!(*layer, parsed);
        }
    }
}

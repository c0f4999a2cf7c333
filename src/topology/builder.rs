//! Ecosystem graph construction and repository criticality ranking

use crate::matcher::TypeFlowEdge;
use crate::schema::{ServiceLayer, TopologyFacts};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Impact-score weights. The 5/10/1 split has no documented derivation; kept
/// configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactWeights {
    #[serde(default = "default_provided")]
    pub provided_services: u32,
    #[serde(default = "default_dependents")]
    pub dependent_repos: u32,
    #[serde(default = "default_shared")]
    pub shared_type_contracts: u32,
}

fn default_provided() -> u32 {
    5
}
fn default_dependents() -> u32 {
    10
}
fn default_shared() -> u32 {
    1
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            provided_services: default_provided(),
            dependent_repos: default_dependents(),
            shared_type_contracts: default_shared(),
        }
    }
}

/// Ownership resolution tables for backend deployments, applied in priority
/// order: explicit mapping, image-rewrite table, suffix stripping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipRules {
    /// deployment name -> owning repo
    #[serde(default)]
    pub explicit: BTreeMap<String, String>,
    /// container image (without tag) -> owning repo
    #[serde(default)]
    pub image_rewrites: BTreeMap<String, String>,
    /// Suffixes stripped from a deployment name to recover the repo name
    #[serde(default = "default_suffixes")]
    pub strip_suffixes: Vec<String>,
}

fn default_suffixes() -> Vec<String> {
    ["-api", "-relay", "-worker", "-service", "-server", "-web", "-app"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for OwnershipRules {
    fn default() -> Self {
        Self {
            explicit: BTreeMap::new(),
            image_rewrites: BTreeMap::new(),
            strip_suffixes: default_suffixes(),
        }
    }
}

impl OwnershipRules {
    /// Resolve the owning repo of a backend deployment.
    pub fn resolve_backend(
        &self,
        name: &str,
        container_image: Option<&str>,
        declared_owner: Option<&str>,
    ) -> String {
        if let Some(repo) = self.explicit.get(name) {
            return repo.clone();
        }
        if let Some(owner) = declared_owner {
            return owner.to_string();
        }
        if let Some(image) = container_image {
            let image_name = image.split(':').next().unwrap_or(image);
            if let Some(repo) = self.image_rewrites.get(image_name) {
                return repo.clone();
            }
        }
        for suffix in &self.strip_suffixes {
            if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
                if !stripped.is_empty() {
                    return stripped.to_string();
                }
            }
        }
        name.to_string()
    }
}

/// Options steering ecosystem graph construction.
#[derive(Debug, Clone, Default)]
pub struct TopologyOptions {
    pub ownership: OwnershipRules,
    pub weights: ImpactWeights,
    /// Minimum similarity for a type-flow edge to count as an implicit
    /// dependency
    pub flow_floor: u32,
}

/// A directed dependency between two repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    /// True when inferred from a type contract rather than an observed call
    pub implicit: bool,
}

/// Per-repository criticality record. Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryImpact {
    pub repo: String,
    pub provided_services: Vec<String>,
    pub depends_on: BTreeSet<String>,
    pub depended_on_by: BTreeSet<String>,
    pub shared_type_names: BTreeSet<String>,
    pub impact_score: u32,
}

/// The full layered ecosystem view.
#[derive(Debug, Clone, Serialize)]
pub struct EcosystemGraph {
    /// Ranked by impact score, descending
    pub repos: Vec<RepositoryImpact>,
    /// (service name, owning repo) per layer
    pub services_by_layer: BTreeMap<ServiceLayer, Vec<(String, String)>>,
    pub edges: Vec<DependencyEdge>,
}

impl EcosystemGraph {
    pub fn repo(&self, name: &str) -> Option<&RepositoryImpact> {
        self.repos.iter().find(|r| r.repo == name)
    }
}

/// Focus-mode view: one repository plus its direct first-order dependents.
#[derive(Debug, Clone, Serialize)]
pub struct FocusView {
    pub target: RepositoryImpact,
    pub dependents: Vec<RepositoryImpact>,
}

/// Build the layered ecosystem graph from per-repo inventories, observed
/// outbound calls, and type-flow edges.
///
/// A repository with no topology facts simply contributes nothing; it still
/// appears in the ranking if other repos reference it through type contracts.
pub fn build_ecosystem_graph(
    inventories: &BTreeMap<String, TopologyFacts>,
    type_flow: &[TypeFlowEdge],
    options: &TopologyOptions,
) -> EcosystemGraph {
    // service key (route pattern or name) -> owning repo
    let mut providers: BTreeMap<String, String> = BTreeMap::new();
    let mut provided_by_repo: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut services_by_layer: BTreeMap<ServiceLayer, Vec<(String, String)>> = BTreeMap::new();

    for (repo, facts) in inventories {
        provided_by_repo.entry(repo.clone()).or_default();

        for service in &facts.services {
            let owner = match service.layer {
                ServiceLayer::Edge => service.owner_repo.clone().unwrap_or_else(|| repo.clone()),
                ServiceLayer::Backend => options.ownership.resolve_backend(
                    &service.name,
                    service.container_image.as_deref(),
                    service.owner_repo.as_deref(),
                ),
                ServiceLayer::Internal => repo.clone(),
            };

            providers.insert(service.name.clone(), owner.clone());
            if service.layer == ServiceLayer::Edge {
                for pattern in &service.route_patterns {
                    providers.insert(pattern.clone(), owner.clone());
                }
            }

            services_by_layer
                .entry(service.layer)
                .or_default()
                .push((service.name.clone(), owner.clone()));
            provided_by_repo
                .entry(owner)
                .or_default()
                .push(service.name.clone());
        }
    }

    // Observed-call dependencies: caller repo -> providing repo
    let mut edges: Vec<DependencyEdge> = Vec::new();
    for (repo, facts) in inventories {
        for call in &facts.outbound_calls {
            let Some(owner) = lookup_provider(&providers, &call.target) else {
                continue;
            };
            if owner == *repo {
                continue;
            }
            let edge = DependencyEdge {
                from: repo.clone(),
                to: owner.clone(),
                implicit: false,
            };
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }

    // Implicit dependencies from type contracts above the similarity floor
    let mut shared_types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for flow in type_flow {
        if flow.similarity < options.flow_floor {
            continue;
        }
        shared_types
            .entry(flow.from_repo.clone())
            .or_default()
            .insert(flow.type_name.clone());
        shared_types
            .entry(flow.to_repo.clone())
            .or_default()
            .insert(flow.type_name.clone());

        if flow.from_repo == flow.to_repo {
            continue;
        }
        let edge = DependencyEdge {
            from: flow.from_repo.clone(),
            to: flow.to_repo.clone(),
            implicit: true,
        };
        // An observed call already proves the dependency
        if !edges
            .iter()
            .any(|e| e.from == edge.from && e.to == edge.to)
        {
            edges.push(edge);
        }
    }

    // Every repo seen anywhere participates in the ranking
    let mut all_repos: BTreeSet<String> = inventories.keys().cloned().collect();
    all_repos.extend(provided_by_repo.keys().cloned());
    all_repos.extend(shared_types.keys().cloned());
    for edge in &edges {
        all_repos.insert(edge.from.clone());
        all_repos.insert(edge.to.clone());
    }

    let mut repos: Vec<RepositoryImpact> = all_repos
        .into_iter()
        .map(|repo| {
            let provided = provided_by_repo.get(&repo).cloned().unwrap_or_default();
            let depends_on: BTreeSet<String> = edges
                .iter()
                .filter(|e| e.from == repo)
                .map(|e| e.to.clone())
                .collect();
            let depended_on_by: BTreeSet<String> = edges
                .iter()
                .filter(|e| e.to == repo)
                .map(|e| e.from.clone())
                .collect();
            let shared = shared_types.get(&repo).cloned().unwrap_or_default();

            let impact_score = options.weights.provided_services * provided.len() as u32
                + options.weights.dependent_repos * depended_on_by.len() as u32
                + options.weights.shared_type_contracts * shared.len() as u32;

            RepositoryImpact {
                repo,
                provided_services: provided,
                depends_on,
                depended_on_by,
                shared_type_names: shared,
                impact_score,
            }
        })
        .collect();

    repos.sort_by(|a, b| {
        b.impact_score
            .cmp(&a.impact_score)
            .then_with(|| a.repo.cmp(&b.repo))
    });

    EcosystemGraph {
        repos,
        services_by_layer,
        edges,
    }
}

fn lookup_provider(providers: &BTreeMap<String, String>, target: &str) -> Option<String> {
    if let Some(owner) = providers.get(target) {
        return Some(owner.clone());
    }
    // Route patterns may carry wildcards ("/api/users/*"): match on prefix
    providers
        .iter()
        .find(|(key, _)| {
            key.strip_suffix('*')
                .map(|prefix| target.starts_with(prefix))
                .unwrap_or(false)
        })
        .map(|(_, owner)| owner.clone())
}

/// Focus mode: one repository plus its direct first-order dependents - a
/// bounded blast radius rather than the whole graph.
pub fn focus(graph: &EcosystemGraph, name: &str) -> Result<FocusView> {
    let Some(target) = graph.repo(name) else {
        let known: Vec<&str> = graph.repos.iter().map(|r| r.repo.as_str()).collect();
        return Err(Error::UnknownRepo {
            name: name.to_string(),
            candidates: nearest_candidates(name, &known),
        });
    };

    let dependents: Vec<RepositoryImpact> = target
        .depended_on_by
        .iter()
        .filter_map(|dep| graph.repo(dep).cloned())
        .collect();

    Ok(FocusView {
        target: target.clone(),
        dependents,
    })
}

/// Nearest known names for an unmatched focus filter: ranked by
/// longest-common-prefix against the normalized query, top 3.
fn nearest_candidates(query: &str, known: &[&str]) -> Vec<String> {
    let query = query.to_lowercase();
    let mut scored: Vec<(usize, &str)> = known
        .iter()
        .map(|name| {
            let lower = name.to_lowercase();
            let prefix = query
                .chars()
                .zip(lower.chars())
                .take_while(|(a, b)| a == b)
                .count();
            let contains_bonus = if lower.contains(&query) || query.contains(&lower) {
                query.len()
            } else {
                0
            };
            (prefix + contains_bonus, *name)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(3)
        .map(|(_, name)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{OutboundCall, ServiceInfo};

    fn facts(services: Vec<ServiceInfo>, calls: Vec<&str>) -> TopologyFacts {
        TopologyFacts {
            services,
            outbound_calls: calls.into_iter().map(OutboundCall::new).collect(),
        }
    }

    fn two_repo_inventories() -> BTreeMap<String, TopologyFacts> {
        let mut inventories = BTreeMap::new();
        inventories.insert(
            "shop-web".to_string(),
            facts(
                vec![ServiceInfo::new("storefront", ServiceLayer::Edge).with_route("/shop/*")],
                vec!["billing-api"],
            ),
        );
        inventories.insert(
            "billing".to_string(),
            facts(
                vec![ServiceInfo::new("billing-api", ServiceLayer::Backend)],
                vec![],
            ),
        );
        inventories
    }

    #[test]
    fn test_backend_ownership_priority() {
        let mut rules = OwnershipRules::default();
        assert_eq!(rules.resolve_backend("billing-api", None, None), "billing");
        assert_eq!(
            rules.resolve_backend("orders-worker", Some("registry.io/orders:v2"), None),
            "orders"
        );

        rules
            .image_rewrites
            .insert("registry.io/orders".to_string(), "orders-mono".to_string());
        assert_eq!(
            rules.resolve_backend("orders-worker", Some("registry.io/orders:v2"), None),
            "orders-mono"
        );

        rules
            .explicit
            .insert("orders-worker".to_string(), "commerce".to_string());
        assert_eq!(
            rules.resolve_backend("orders-worker", Some("registry.io/orders:v2"), None),
            "commerce"
        );
    }

    #[test]
    fn test_observed_call_creates_dependency() {
        let graph = build_ecosystem_graph(
            &two_repo_inventories(),
            &[],
            &TopologyOptions::default(),
        );

        assert!(graph.edges.contains(&DependencyEdge {
            from: "shop-web".to_string(),
            to: "billing".to_string(),
            implicit: false,
        }));

        let billing = graph.repo("billing").unwrap();
        assert!(billing.depended_on_by.contains("shop-web"));
    }

    #[test]
    fn test_self_edges_discarded() {
        let mut inventories = BTreeMap::new();
        inventories.insert(
            "solo".to_string(),
            facts(
                vec![ServiceInfo::new("solo-api", ServiceLayer::Backend)],
                vec!["solo-api"],
            ),
        );

        let graph =
            build_ecosystem_graph(&inventories, &[], &TopologyOptions::default());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_type_flow_folds_in_as_implicit_dependency() {
        let flow = TypeFlowEdge {
            from_repo: "shop-web".to_string(),
            to_repo: "catalog".to_string(),
            type_name: "product".to_string(),
            shared_fields: vec!["sku".to_string()],
            similarity: 80,
        };

        let options = TopologyOptions {
            flow_floor: 60,
            ..TopologyOptions::default()
        };
        let graph = build_ecosystem_graph(&two_repo_inventories(), &[flow.clone()], &options);

        assert!(graph.edges.iter().any(|e| e.implicit
            && e.from == "shop-web"
            && e.to == "catalog"));

        // Below the floor the edge is dropped
        let options = TopologyOptions {
            flow_floor: 90,
            ..TopologyOptions::default()
        };
        let graph = build_ecosystem_graph(&two_repo_inventories(), &[flow], &options);
        assert!(!graph.edges.iter().any(|e| e.implicit));
    }

    #[test]
    fn test_dependent_repo_strictly_increases_score() {
        let graph = build_ecosystem_graph(
            &two_repo_inventories(),
            &[],
            &TopologyOptions::default(),
        );
        let before = graph.repo("billing").unwrap().impact_score;

        let mut inventories = two_repo_inventories();
        inventories.insert(
            "mobile".to_string(),
            facts(vec![], vec!["billing-api"]),
        );
        let graph = build_ecosystem_graph(&inventories, &[], &TopologyOptions::default());
        let after = graph.repo("billing").unwrap().impact_score;

        assert!(after > before);
        assert_eq!(after - before, ImpactWeights::default().dependent_repos);
    }

    #[test]
    fn test_route_pattern_wildcard_lookup() {
        let mut inventories = two_repo_inventories();
        inventories.insert(
            "search".to_string(),
            facts(vec![], vec!["/shop/search"]),
        );

        let graph = build_ecosystem_graph(&inventories, &[], &TopologyOptions::default());
        assert!(graph
            .edges
            .contains(&DependencyEdge {
                from: "search".to_string(),
                to: "shop-web".to_string(),
                implicit: false,
            }));
    }

    #[test]
    fn test_ranking_descends() {
        let graph = build_ecosystem_graph(
            &two_repo_inventories(),
            &[],
            &TopologyOptions::default(),
        );
        for pair in graph.repos.windows(2) {
            assert!(pair[0].impact_score >= pair[1].impact_score);
        }
    }

    #[test]
    fn test_focus_returns_first_order_dependents_only() {
        let mut inventories = two_repo_inventories();
        // chain: mobile -> shop-web -> billing
        inventories.insert("mobile".to_string(), facts(vec![], vec!["/shop/home"]));

        let graph = build_ecosystem_graph(&inventories, &[], &TopologyOptions::default());
        let view = focus(&graph, "billing").unwrap();

        assert_eq!(view.target.repo, "billing");
        let dependents: Vec<&str> = view.dependents.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(dependents, vec!["shop-web"]);
    }

    #[test]
    fn test_focus_unknown_reports_candidates() {
        let graph = build_ecosystem_graph(
            &two_repo_inventories(),
            &[],
            &TopologyOptions::default(),
        );

        let err = focus(&graph, "billign").unwrap_err();
        match err {
            Error::UnknownRepo { name, candidates } => {
                assert_eq!(name, "billign");
                assert_eq!(candidates[0], "billing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}

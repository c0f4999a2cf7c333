//! Blast-radius analysis - impact trees from external dependencies to UI
//! surfaces
//!
//! Callees matching I/O-boundary patterns are flagged as external
//! dependencies. For each, a strictly-upward BFS through callers finds the
//! user-facing surfaces that would break if the dependency failed.

use crate::callgraph::graph::CallGraph;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

/// Upward BFS depth ceiling
const MAX_UPWARD_DEPTH: usize = 6;
/// Stop after this many discovered UI surfaces per dependency
const MAX_SURFACES: usize = 10;

/// Risk bands by affected-surface count. The 0 / 1-2 / >=3 cut points have no
/// documented derivation; kept configurable.
#[derive(Debug, Clone, serde::Deserialize, Serialize)]
pub struct RiskBands {
    /// Minimum affected surfaces for medium risk
    #[serde(default = "default_medium_min")]
    pub medium_min: usize,
    /// Minimum affected surfaces for high risk
    #[serde(default = "default_high_min")]
    pub high_min: usize,
}

fn default_medium_min() -> usize {
    1
}
fn default_high_min() -> usize {
    3
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            medium_min: default_medium_min(),
            high_min: default_high_min(),
        }
    }
}

/// Risk classification of one external dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_surface_count(surfaces: usize, bands: &RiskBands) -> Self {
        if surfaces >= bands.high_min {
            RiskLevel::High
        } else if surfaces >= bands.medium_min {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-facing surface reachable upward from a dependency.
#[derive(Debug, Clone, Serialize)]
pub struct AffectedSurface {
    pub function: String,
    pub origin_file: String,
    /// Full caller chain from the dependency's direct caller to the surface
    pub chain: Vec<String>,
}

/// Blast radius of one external dependency.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactTree {
    /// The flagged callee label
    pub dependency: String,
    pub direct_callers: Vec<String>,
    pub surfaces: Vec<AffectedSurface>,
    /// Distinct functions anywhere upstream of the dependency
    pub upstream_callers: usize,
    pub risk: RiskLevel,
}

/// Fixed I/O-boundary patterns: network fetch/request, generic
/// client/service/api facades, database/cache/relay access.
struct BoundaryMatcher {
    patterns: Vec<Regex>,
}

impl Default for BoundaryMatcher {
    fn default() -> Self {
        let raw = [
            r"(?i)(^|\.)(fetch|request)",
            r"(?i)^axios(\.|$)",
            r"(?i)(client|service|api)\.",
            r"(?i)(^|\.)(query|execute)",
            r"(?i)(^|\.)(db|database|cache|redis|relay)\.",
        ];
        Self {
            patterns: raw.iter().filter_map(|p| Regex::new(p).ok()).collect(),
        }
    }
}

impl BoundaryMatcher {
    fn is_external(&self, callee: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(callee))
    }
}

/// Whether a file path follows a UI-surface convention: a
/// pages/screens/views/routes path segment, or a Page/Screen/View filename
/// suffix.
fn is_ui_surface(path: &str) -> bool {
    let segments: Vec<&str> = path.split(['/', '\\']).collect();
    if segments
        .iter()
        .any(|s| matches!(*s, "pages" | "screens" | "views" | "routes"))
    {
        return true;
    }

    let file_stem = segments
        .last()
        .and_then(|f| f.split('.').next())
        .unwrap_or("");
    file_stem.ends_with("Page") || file_stem.ends_with("Screen") || file_stem.ends_with("View")
}

/// Compute impact trees for every external dependency in the graph.
///
/// For each flagged callee, BFS strictly upward through callers (depth <= 6,
/// at most 10 surfaces), tagging visited functions whose origin file looks
/// like a UI surface. Results are sorted by distinct-upstream-caller count
/// descending.
pub fn blast_radius(graph: &CallGraph, bands: &RiskBands) -> Vec<ImpactTree> {
    let matcher = BoundaryMatcher::default();

    let mut dependencies: Vec<&str> = graph
        .callee_labels()
        .filter(|c| matcher.is_external(c))
        .collect();
    dependencies.sort_unstable();

    let mut trees: Vec<ImpactTree> = dependencies
        .into_iter()
        .map(|dep| impact_tree_for(graph, dep, bands))
        .collect();

    trees.sort_by(|a, b| {
        b.upstream_callers
            .cmp(&a.upstream_callers)
            .then_with(|| a.dependency.cmp(&b.dependency))
    });
    trees
}

fn impact_tree_for(graph: &CallGraph, dependency: &str, bands: &RiskBands) -> ImpactTree {
    let mut visited: HashSet<String> = HashSet::new();
    let mut surfaces: Vec<AffectedSurface> = Vec::new();

    // Queue entries carry the caller chain from the dependency upward
    let mut queue: std::collections::VecDeque<(String, usize, Vec<String>)> =
        std::collections::VecDeque::new();

    for caller in graph.callers_of(dependency) {
        if visited.insert(caller.clone()) {
            queue.push_back((caller.clone(), 1, vec![caller.clone()]));
        }
    }

    'walk: while let Some((function, depth, chain)) = queue.pop_front() {
        if let Some(file) = graph.origin_of(&function) {
            if is_ui_surface(file) {
                surfaces.push(AffectedSurface {
                    function: function.clone(),
                    origin_file: file.to_string(),
                    chain: chain.clone(),
                });
                if surfaces.len() >= MAX_SURFACES {
                    break 'walk;
                }
            }
        }

        if depth >= MAX_UPWARD_DEPTH {
            continue;
        }
        for caller in graph.callers_of(&function) {
            if visited.insert(caller.clone()) {
                let mut next_chain = chain.clone();
                next_chain.push(caller.clone());
                queue.push_back((caller.clone(), depth + 1, next_chain));
            }
        }
    }

    let direct_callers: Vec<String> = graph.callers_of(dependency).to_vec();
    let risk = RiskLevel::from_surface_count(surfaces.len(), bands);

    ImpactTree {
        dependency: dependency.to_string(),
        direct_callers,
        upstream_callers: visited.len(),
        surfaces,
        risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CallEdge;

    #[test]
    fn test_risk_bands_boundaries() {
        let bands = RiskBands::default();
        assert_eq!(RiskLevel::from_surface_count(0, &bands), RiskLevel::Low);
        assert_eq!(RiskLevel::from_surface_count(1, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_surface_count(2, &bands), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_surface_count(3, &bands), RiskLevel::High);
        assert_eq!(RiskLevel::from_surface_count(7, &bands), RiskLevel::High);
    }

    #[test]
    fn test_ui_surface_conventions() {
        assert!(is_ui_surface("src/pages/Home.tsx"));
        assert!(is_ui_surface("app/screens/login.dart"));
        assert!(is_ui_surface("src/ProfileView.swift"));
        assert!(is_ui_surface("src/CheckoutPage.tsx"));
        assert!(!is_ui_surface("src/core/engine.rs"));
        assert!(!is_ui_surface("src/pager.ts"));
    }

    #[test]
    fn test_surface_two_hops_up_is_medium() {
        // UserPage.render -> loadUser -> api.fetchUser
        let edges = vec![
            CallEdge::new("render", "loadUser", "src/pages/UserPage.tsx", 12),
            CallEdge::new("loadUser", "api.fetchUser", "src/api.ts", 30),
        ];
        let graph = CallGraph::build(&edges);

        let trees = blast_radius(&graph, &RiskBands::default());
        assert_eq!(trees.len(), 1);

        let tree = &trees[0];
        assert_eq!(tree.dependency, "api.fetchUser");
        assert_eq!(tree.surfaces.len(), 1);
        assert_eq!(tree.surfaces[0].function, "render");
        assert_eq!(tree.surfaces[0].chain, vec!["loadUser", "render"]);
        assert_eq!(tree.risk, RiskLevel::Medium);
    }

    #[test]
    fn test_no_surface_is_low_risk() {
        let edges = vec![CallEdge::new("worker", "db.execute", "src/worker.rs", 5)];
        let graph = CallGraph::build(&edges);

        let trees = blast_radius(&graph, &RiskBands::default());
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].risk, RiskLevel::Low);
        assert!(trees[0].surfaces.is_empty());
    }

    #[test]
    fn test_sorted_by_upstream_caller_count() {
        let edges = vec![
            CallEdge::new("a", "cache.get_or", "src/a.rs", 1),
            CallEdge::new("b", "billing.client.charge", "src/b.rs", 1),
            CallEdge::new("c", "billing.client.charge", "src/c.rs", 1),
        ];
        let graph = CallGraph::build(&edges);

        let trees = blast_radius(&graph, &RiskBands::default());
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].dependency, "billing.client.charge");
        assert_eq!(trees[0].upstream_callers, 2);
    }

    #[test]
    fn test_upward_walk_is_cycle_safe() {
        let edges = vec![
            CallEdge::new("f", "g", "src/a.rs", 1),
            CallEdge::new("g", "f", "src/a.rs", 2),
            CallEdge::new("f", "db.query", "src/a.rs", 3),
        ];
        let graph = CallGraph::build(&edges);

        let trees = blast_radius(&graph, &RiskBands::default());
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].upstream_callers, 2);
    }
}

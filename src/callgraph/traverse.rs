//! Bounded breadth-first traversal over the call graph
//!
//! Traversals are bounded by both depth and node count so cyclic or
//! high-fan-out graphs can never cause unbounded work. Cycle safety comes
//! from the visited set, not a DAG assumption. Callers needing an early stop
//! lower the bounds; there is no mid-traversal cancellation.

use crate::callgraph::graph::{CallGraph, NodeClass};
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::str::FromStr;

/// Hard ceiling on traversal depth
pub const MAX_TRAVERSE_DEPTH: usize = 5;

/// Traversal direction relative to the seed functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Callers,
    Callees,
    Both,
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "callers" | "up" => Ok(Direction::Callers),
            "callees" | "down" => Ok(Direction::Callees),
            "both" => Ok(Direction::Both),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown traversal direction: {}",
                s
            ))),
        }
    }
}

/// Depth and node-count bounds; whichever is hit first stops the traversal.
#[derive(Debug, Clone, Copy)]
pub struct TraversalBounds {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for TraversalBounds {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_nodes: 50,
        }
    }
}

impl TraversalBounds {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth: max_depth.min(MAX_TRAVERSE_DEPTH),
            max_nodes,
        }
    }
}

/// An admitted node with its distance from the nearest seed.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalNode {
    pub name: String,
    pub depth: usize,
    #[serde(skip)]
    pub class: NodeClass,
}

/// A call site between two admitted nodes.
#[derive(Debug, Clone, Serialize)]
pub struct TraversalEdge {
    pub from: String,
    pub to: String,
    pub origin_file: String,
    pub origin_line: u32,
}

/// Result of a bounded traversal.
#[derive(Debug, Clone, Serialize)]
pub struct Traversal {
    pub nodes: Vec<TraversalNode>,
    pub edges: Vec<TraversalEdge>,
    /// Whether the node-count bound cut the frontier short
    pub truncated: bool,
}

impl Traversal {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Breadth-first traversal from `seeds`, frontier by frontier.
///
/// A visited node is never re-expanded. An edge is only emitted when both of
/// its endpoints were admitted, so a partially-expanded frontier never leaves
/// dangling edges.
pub fn bounded_traverse(
    graph: &CallGraph,
    seeds: &[String],
    direction: Direction,
    bounds: TraversalBounds,
) -> Traversal {
    let max_depth = bounds.max_depth.min(MAX_TRAVERSE_DEPTH);
    let mut admitted: HashSet<String> = HashSet::new();
    let mut nodes: Vec<TraversalNode> = Vec::new();
    let mut truncated = false;

    let mut frontier: Vec<String> = Vec::new();
    for seed in seeds {
        if graph.contains(seed) && admitted.insert(seed.clone()) {
            if nodes.len() >= bounds.max_nodes {
                truncated = true;
                break;
            }
            nodes.push(TraversalNode {
                name: seed.clone(),
                depth: 0,
                class: graph.classify(seed),
            });
            frontier.push(seed.clone());
        }
    }

    let mut depth = 0;
    'expand: while !frontier.is_empty() && depth < max_depth {
        depth += 1;
        let mut next_frontier = Vec::new();

        for name in &frontier {
            let neighbors: Vec<&str> = match direction {
                Direction::Callers => graph.callers_of(name).iter().map(|s| s.as_str()).collect(),
                Direction::Callees => graph.callees_of(name).iter().map(|s| s.as_str()).collect(),
                Direction::Both => graph
                    .callers_of(name)
                    .iter()
                    .chain(graph.callees_of(name).iter())
                    .map(|s| s.as_str())
                    .collect(),
            };

            for neighbor in neighbors {
                if admitted.contains(neighbor) {
                    continue;
                }
                if nodes.len() >= bounds.max_nodes {
                    truncated = true;
                    break 'expand;
                }
                admitted.insert(neighbor.to_string());
                nodes.push(TraversalNode {
                    name: neighbor.to_string(),
                    depth,
                    class: graph.classify(neighbor),
                });
                next_frontier.push(neighbor.to_string());
            }
        }

        frontier = next_frontier;
    }

    let edges = graph
        .edges()
        .iter()
        .filter(|e| admitted.contains(&e.caller) && admitted.contains(&e.callee))
        .map(|e| TraversalEdge {
            from: e.caller.clone(),
            to: e.callee.clone(),
            origin_file: e.origin_file.clone(),
            origin_line: e.origin_line,
        })
        .collect();

    Traversal {
        nodes,
        edges,
        truncated,
    }
}

/// Fixed denylist of generic/library call shapes that would drown a trace in
/// plumbing: logging, collection/string methods, JSON encode/decode, promise
/// chaining, boxed-primitive constructors.
pub struct CallShapeDenylist {
    patterns: Vec<Regex>,
}

impl Default for CallShapeDenylist {
    fn default() -> Self {
        let raw = [
            // Logging
            r"(?i)^(console|log|logger|logging|tracing)\.",
            r"^(print|println|printf)$",
            // Collection / string methods on a receiver
            r"\.(push|pop|shift|unshift|map|filter|forEach|reduce|find|flat|concat|join|split|slice|splice|sort|keys|values|entries|includes|indexOf|append|extend|add|get|set|has|trim|replace|toLowerCase|toUpperCase|toString|substring|startsWith|endsWith|len|length)$",
            // JSON encode/decode
            r"^JSON\.(parse|stringify)$",
            r"(?i)^json\.(dumps|loads|dump|load|marshal|unmarshal)$",
            // Promise chaining
            r"\.(then|catch|finally)$",
            // Boxed-primitive constructors
            r"^(String|Number|Boolean|Array|Object|Symbol|BigInt)$",
        ];
        Self {
            patterns: raw
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

impl CallShapeDenylist {
    pub fn is_generic(&self, callee: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(callee))
    }
}

/// Temporal rendering input: the traversal's admitted edges sorted by origin
/// file then line (approximating execution order), with denylisted callees
/// dropped so the trace shows business logic rather than plumbing.
pub fn temporal_trace(traversal: &Traversal, denylist: &CallShapeDenylist) -> Vec<TraversalEdge> {
    let mut edges: Vec<TraversalEdge> = traversal
        .edges
        .iter()
        .filter(|e| !denylist.is_generic(&e.to))
        .cloned()
        .collect();

    edges.sort_by(|a, b| {
        a.origin_file
            .cmp(&b.origin_file)
            .then(a.origin_line.cmp(&b.origin_line))
    });
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CallEdge;

    fn edge(caller: &str, callee: &str, line: u32) -> CallEdge {
        CallEdge::new(caller, callee, "src/app.ts", line)
    }

    #[test]
    fn test_cycle_terminates_and_visits_all() {
        // f -> g -> h -> f, seed f, maxDepth 5, maxNodes 10
        let graph = CallGraph::build(&[edge("f", "g", 1), edge("g", "h", 2), edge("h", "f", 3)]);

        let t = bounded_traverse(
            &graph,
            &["f".to_string()],
            Direction::Callees,
            TraversalBounds::new(5, 10),
        );

        let mut names: Vec<&str> = t.nodes.iter().map(|n| n.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["f", "g", "h"]);
        assert!(!t.truncated);
        // All three edges connect admitted nodes
        assert_eq!(t.edges.len(), 3);
    }

    #[test]
    fn test_depth_bound_respected() {
        let graph = CallGraph::build(&[
            edge("a", "b", 1),
            edge("b", "c", 2),
            edge("c", "d", 3),
        ]);

        let t = bounded_traverse(
            &graph,
            &["a".to_string()],
            Direction::Callees,
            TraversalBounds::new(2, 100),
        );

        assert!(t.nodes.iter().all(|n| n.depth <= 2));
        assert!(!t.nodes.iter().any(|n| n.name == "d"));
    }

    #[test]
    fn test_node_bound_and_no_dangling_edges() {
        let edges: Vec<CallEdge> = (0..20)
            .map(|i| edge("root", &format!("leaf{}", i), i + 1))
            .collect();
        let graph = CallGraph::build(&edges);

        let t = bounded_traverse(
            &graph,
            &["root".to_string()],
            Direction::Callees,
            TraversalBounds::new(3, 5),
        );

        assert_eq!(t.nodes.len(), 5);
        assert!(t.truncated);
        // Every emitted edge joins two admitted nodes
        let admitted: std::collections::HashSet<&str> =
            t.nodes.iter().map(|n| n.name.as_str()).collect();
        assert!(t
            .edges
            .iter()
            .all(|e| admitted.contains(e.from.as_str()) && admitted.contains(e.to.as_str())));
        assert_eq!(t.edges.len(), 4);
    }

    #[test]
    fn test_depth_clamped_to_ceiling() {
        let bounds = TraversalBounds::new(50, 10);
        assert_eq!(bounds.max_depth, MAX_TRAVERSE_DEPTH);
    }

    #[test]
    fn test_unknown_seed_yields_empty() {
        let graph = CallGraph::build(&[edge("a", "b", 1)]);
        let t = bounded_traverse(
            &graph,
            &["ghost".to_string()],
            Direction::Both,
            TraversalBounds::default(),
        );
        assert!(t.is_empty());
    }

    #[test]
    fn test_denylist_shapes() {
        let denylist = CallShapeDenylist::default();
        assert!(denylist.is_generic("console.log"));
        assert!(denylist.is_generic("items.push"));
        assert!(denylist.is_generic("JSON.parse"));
        assert!(denylist.is_generic("promise.then"));
        assert!(denylist.is_generic("String"));
        assert!(!denylist.is_generic("loadUserProfile"));
        assert!(!denylist.is_generic("billing.charge"));
    }

    #[test]
    fn test_temporal_trace_sorted_and_filtered() {
        let edges = vec![
            CallEdge::new("main", "loadUser", "src/b.ts", 9),
            CallEdge::new("main", "console.log", "src/b.ts", 10),
            CallEdge::new("loadUser", "parseUser", "src/a.ts", 4),
        ];
        let graph = CallGraph::build(&edges);
        let t = bounded_traverse(
            &graph,
            &["main".to_string()],
            Direction::Callees,
            TraversalBounds::new(5, 50),
        );

        let trace = temporal_trace(&t, &CallShapeDenylist::default());
        assert_eq!(trace.len(), 2);
        // Sorted by origin file, then line
        assert_eq!(trace[0].origin_file, "src/a.ts");
        assert_eq!(trace[1].to, "loadUser");
    }
}

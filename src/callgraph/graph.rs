//! In-memory call graph - adjacency over syntactic call edges

use crate::schema::CallEdge;
use std::collections::{HashMap, HashSet};

/// Combined-degree threshold above which a node renders as a hotspot
const HOTSPOT_DEGREE: usize = 10;

/// Rendering class of a call-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// No callers and at least one callee
    EntryPoint,
    /// Combined distinct degree above the hotspot threshold
    Hotspot,
    Plain,
}

/// Caller/callee adjacency plus per-callee call counts.
///
/// Built once from a snapshot's call edges; read-only afterwards. Adjacency
/// lists are deduplicated; `call_count` preserves call-site multiplicity.
#[derive(Debug, Default)]
pub struct CallGraph {
    /// caller -> distinct callees
    callees: HashMap<String, Vec<String>>,
    /// callee -> distinct callers
    callers: HashMap<String, Vec<String>>,
    /// callee -> number of observed call sites
    call_counts: HashMap<String, usize>,
    /// function -> origin file (from its call sites as a caller)
    origin_files: HashMap<String, String>,
    /// All observed call sites, in extraction order
    edges: Vec<CallEdge>,
}

impl CallGraph {
    pub fn build(edges: &[CallEdge]) -> Self {
        let mut graph = Self::default();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for edge in edges {
            *graph.call_counts.entry(edge.callee.clone()).or_insert(0) += 1;

            // The call site lives in the caller's file
            graph
                .origin_files
                .entry(edge.caller.clone())
                .or_insert_with(|| edge.origin_file.clone());

            if seen.insert((edge.caller.clone(), edge.callee.clone())) {
                graph
                    .callees
                    .entry(edge.caller.clone())
                    .or_default()
                    .push(edge.callee.clone());
                graph
                    .callers
                    .entry(edge.callee.clone())
                    .or_default()
                    .push(edge.caller.clone());
            }

            graph.edges.push(edge.clone());
        }

        graph
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callees.contains_key(name) || self.callers.contains_key(name)
    }

    pub fn callees_of(&self, name: &str) -> &[String] {
        self.callees.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn callers_of(&self, name: &str) -> &[String] {
        self.callers.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn call_count(&self, callee: &str) -> usize {
        self.call_counts.get(callee).copied().unwrap_or(0)
    }

    /// File a function was observed in, from its call sites as a caller
    pub fn origin_of(&self, name: &str) -> Option<&str> {
        self.origin_files.get(name).map(|s| s.as_str())
    }

    /// All observed call sites
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// All distinct function names appearing on either side of an edge
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        let mut names: Vec<&str> = self
            .callees
            .keys()
            .chain(self.callers.keys())
            .map(|s| s.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter()
    }

    /// All distinct callee labels
    pub fn callee_labels(&self) -> impl Iterator<Item = &str> {
        self.callers.keys().map(|s| s.as_str())
    }

    pub fn classify(&self, name: &str) -> NodeClass {
        let in_degree = self.callers_of(name).len();
        let out_degree = self.callees_of(name).len();

        if in_degree + out_degree > HOTSPOT_DEGREE {
            NodeClass::Hotspot
        } else if in_degree == 0 && out_degree >= 1 {
            NodeClass::EntryPoint
        } else {
            NodeClass::Plain
        }
    }

    pub fn stats(&self) -> CallGraphStats {
        let functions: Vec<&str> = self.functions().collect();
        let entry_points = functions
            .iter()
            .filter(|f| self.classify(f) == NodeClass::EntryPoint)
            .count();
        let hotspots = functions
            .iter()
            .filter(|f| self.classify(f) == NodeClass::Hotspot)
            .count();

        CallGraphStats {
            functions: functions.len(),
            call_sites: self.edges.len(),
            entry_points,
            hotspots,
        }
    }
}

/// Statistics about a call graph
#[derive(Debug, Clone)]
pub struct CallGraphStats {
    pub functions: usize,
    pub call_sites: usize,
    pub entry_points: usize,
    pub hotspots: usize,
}

impl std::fmt::Display for CallGraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Call Graph Statistics:")?;
        writeln!(f, "  Functions: {}", self.functions)?;
        writeln!(f, "  Call sites: {}", self.call_sites)?;
        writeln!(
            f,
            "  Entry points: {} (hotspots: {})",
            self.entry_points, self.hotspots
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(caller: &str, callee: &str, line: u32) -> CallEdge {
        CallEdge::new(caller, callee, "src/app.ts", line)
    }

    #[test]
    fn test_adjacency_both_directions() {
        let graph = CallGraph::build(&[edge("main", "load", 3), edge("load", "parse", 8)]);

        assert_eq!(graph.callees_of("main"), &["load".to_string()]);
        assert_eq!(graph.callers_of("parse"), &["load".to_string()]);
        assert_eq!(graph.call_count("load"), 1);
    }

    #[test]
    fn test_call_counts_keep_multiplicity() {
        let graph = CallGraph::build(&[
            edge("a", "shared", 1),
            edge("b", "shared", 2),
            edge("a", "shared", 3),
        ]);

        // Adjacency deduplicated, counts not
        assert_eq!(graph.callers_of("shared").len(), 2);
        assert_eq!(graph.call_count("shared"), 3);
    }

    #[test]
    fn test_node_classes() {
        let mut edges = vec![edge("entry", "hub", 1)];
        for i in 0..11 {
            edges.push(edge("hub", &format!("leaf{}", i), i + 2));
        }
        let graph = CallGraph::build(&edges);

        assert_eq!(graph.classify("entry"), NodeClass::EntryPoint);
        assert_eq!(graph.classify("hub"), NodeClass::Hotspot);
        assert_eq!(graph.classify("leaf0"), NodeClass::Plain);
    }

    #[test]
    fn test_origin_from_caller_side() {
        let edges = vec![
            CallEdge::new("render", "draw", "src/pages/Home.tsx", 12),
            CallEdge::new("draw", "fill", "src/canvas.ts", 4),
        ];
        let graph = CallGraph::build(&edges);

        assert_eq!(graph.origin_of("render"), Some("src/pages/Home.tsx"));
        assert_eq!(graph.origin_of("draw"), Some("src/canvas.ts"));
        assert_eq!(graph.origin_of("fill"), None);
    }
}

//! Mermaid diagram markup
//!
//! Graph views render as `flowchart` markup with subgraph/node/edge
//! declarations; temporal views render as `sequenceDiagram` markup with
//! participant/call/return lines.

use crate::callgraph::{NodeClass, Traversal, TraversalEdge};
use crate::render::sanitize::{label, node_id};
use crate::topology::EcosystemGraph;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Render a bounded traversal as a flowchart.
///
/// Entry points render as stadium nodes, hotspots as hexagons, plain nodes
/// as rectangles. Parallel call sites between the same pair collapse into
/// one edge.
pub fn call_graph(traversal: &Traversal) -> String {
    let mut out = String::from("flowchart TD\n");

    for node in &traversal.nodes {
        let id = node_id(&node.name);
        let text = label(&node.name);
        let line = match node.class {
            NodeClass::EntryPoint => format!("    {}([\"{}\"])\n", id, text),
            NodeClass::Hotspot => format!("    {}{{{{\"{}\"}}}}\n", id, text),
            NodeClass::Plain => format!("    {}[\"{}\"]\n", id, text),
        };
        out.push_str(&line);
    }

    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    for edge in &traversal.edges {
        let pair = (node_id(&edge.from), node_id(&edge.to));
        if seen.insert(pair.clone()) {
            let _ = writeln!(out, "    {} --> {}", pair.0, pair.1);
        }
    }

    out
}

/// Render a temporal trace as a sequence diagram: one participant per
/// function in first-appearance order, a call line per trace edge, and a
/// dashed return line closing each call.
pub fn sequence(trace: &[TraversalEdge]) -> String {
    let mut out = String::from("sequenceDiagram\n");

    let mut declared: BTreeSet<String> = BTreeSet::new();
    for edge in trace {
        for name in [&edge.from, &edge.to] {
            let id = node_id(name);
            if declared.insert(id.clone()) {
                let _ = writeln!(out, "    participant {} as {}", id, label(name));
            }
        }
    }

    for edge in trace {
        let from = node_id(&edge.from);
        let to = node_id(&edge.to);
        let _ = writeln!(
            out,
            "    {}->>{}: {}:{}",
            from,
            to,
            label(&edge.origin_file),
            edge.origin_line
        );
        let _ = writeln!(out, "    {}-->>{}: return", to, from);
    }

    out
}

/// Render the ecosystem as a flowchart: one subgraph per deployment layer
/// with its services, repo-to-repo dependency edges below (implicit
/// type-contract edges dashed).
pub fn ecosystem(graph: &EcosystemGraph) -> String {
    let mut out = String::from("flowchart LR\n");

    for (layer, services) in &graph.services_by_layer {
        let _ = writeln!(out, "    subgraph {}", node_id(layer.as_str()));
        for (service, owner) in services {
            let _ = writeln!(
                out,
                "        {}[\"{} ({})\"]",
                node_id(&format!("{}_{}", owner, service)),
                label(service),
                label(owner)
            );
        }
        out.push_str("    end\n");
    }

    for repo in &graph.repos {
        let _ = writeln!(out, "    {}((\"{}\"))", node_id(&repo.repo), label(&repo.repo));
    }

    for edge in &graph.edges {
        let arrow = if edge.implicit { "-.->" } else { "-->" };
        let _ = writeln!(
            out,
            "    {} {} {}",
            node_id(&edge.from),
            arrow,
            node_id(&edge.to)
        );
    }

    out
}

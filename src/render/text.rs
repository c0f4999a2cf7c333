//! Plain-text reports: ranked tables and risk-glyph trees

use crate::callgraph::{ImpactTree, RiskLevel};
use crate::differ::DomainDiff;
use crate::matcher::CrossRepoMatch;
use crate::topology::RepositoryImpact;
use crate::ui::Icons;
use std::fmt::Write;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Type")]
    name: String,
    #[tabled(rename = "Repos")]
    repos: String,
    #[tabled(rename = "Instances")]
    instances: usize,
    #[tabled(rename = "Score")]
    score: u32,
}

/// Ranked cross-repo match table.
pub fn match_table(matches: &[CrossRepoMatch]) -> String {
    if matches.is_empty() {
        return String::from("No cross-repo type matches.");
    }

    let rows: Vec<MatchRow> = matches
        .iter()
        .map(|m| MatchRow {
            name: m.normalized_name.clone(),
            repos: m.repos().into_iter().collect::<Vec<_>>().join(", "),
            instances: m.instances.len(),
            score: m.similarity,
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct ImpactRow {
    #[tabled(rename = "Repo")]
    repo: String,
    #[tabled(rename = "Services")]
    services: usize,
    #[tabled(rename = "Dependents")]
    dependents: usize,
    #[tabled(rename = "Shared types")]
    shared: usize,
    #[tabled(rename = "Impact")]
    score: u32,
}

/// Ranked repository criticality table.
pub fn repo_table(repos: &[RepositoryImpact]) -> String {
    if repos.is_empty() {
        return String::from("No repositories in the ecosystem.");
    }

    let rows: Vec<ImpactRow> = repos
        .iter()
        .map(|r| ImpactRow {
            repo: r.repo.clone(),
            services: r.provided_services.len(),
            dependents: r.depended_on_by.len(),
            shared: r.shared_type_names.len(),
            score: r.impact_score,
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

fn risk_glyph(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => Icons::RISK_LOW,
        RiskLevel::Medium => Icons::RISK_MEDIUM,
        RiskLevel::High => Icons::RISK_HIGH,
    }
}

/// Indented risk-glyph impact trees, one per external dependency.
pub fn impact_report(trees: &[ImpactTree]) -> String {
    if trees.is_empty() {
        return String::from("No external dependencies found in the call graph.");
    }

    let mut out = String::new();
    for tree in trees {
        let _ = writeln!(
            out,
            "{} {} (risk: {}, {} upstream callers)",
            risk_glyph(tree.risk),
            tree.dependency,
            tree.risk,
            tree.upstream_callers
        );

        if tree.surfaces.is_empty() {
            out.push_str("   no user-facing surfaces affected\n");
            continue;
        }
        for surface in &tree.surfaces {
            let chain = surface.chain.join(" → ");
            let _ = writeln!(
                out,
                "   └─ {} ({})\n      via {}",
                surface.function, surface.origin_file, chain
            );
        }
    }
    out
}

/// Per-domain diff report with +/- item lines and count-delta details.
pub fn diff_report(diffs: &[DomainDiff]) -> String {
    if diffs.is_empty() {
        return String::from("No changes between the two snapshots.");
    }

    let mut out = String::new();
    for diff in diffs {
        let _ = writeln!(out, "[{}]", diff.domain);
        for key in &diff.added {
            let _ = writeln!(out, "  + {}", key);
        }
        for key in &diff.removed {
            let _ = writeln!(out, "  - {}", key);
        }
        for note in &diff.detail {
            let _ = writeln!(out, "  ~ {}", note);
        }
    }
    out
}

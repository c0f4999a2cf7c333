//! Snapshot Differ - added/removed sets between two captures
//!
//! Pure and read-only; never mutates either snapshot. Key extraction is
//! domain-specific: `kind/name` for named resources, identifiers for
//! catalog-style facts, raw-count deltas for counted resources. If one side
//! is wholly absent the whole domain is reported as new/removed, with no
//! partial computation.

use crate::schema::{ExtractionSnapshot, TOPOLOGY_DOMAIN, TYPE_DOMAIN};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Diff of one fact domain between two snapshots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DomainDiff {
    pub domain: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Count deltas and whole-domain notes
    pub detail: Vec<String>,
}

impl DomainDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.detail.is_empty()
    }
}

/// Extract stable item keys from one domain's facts.
fn keyed_items(domain: &str, facts: &Value) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();

    match domain {
        TYPE_DOMAIN => {
            for ty in array_of(facts, "types") {
                if let (Some(kind), Some(name)) = (str_field(ty, "kind"), str_field(ty, "name")) {
                    keys.insert(format!("{}/{}", kind, name));
                }
            }
            for module in array_of(facts, "modules") {
                if let Some(name) = str_field(module, "name") {
                    keys.insert(format!("module/{}", name));
                }
            }
        }
        TOPOLOGY_DOMAIN => {
            for service in array_of(facts, "services") {
                if let (Some(layer), Some(name)) =
                    (str_field(service, "layer"), str_field(service, "name"))
                {
                    keys.insert(format!("{}/{}", layer, name));
                }
            }
        }
        _ => {
            // Unknown catalog-style domains: arrays of named records
            if let Some(items) = facts.as_array() {
                for item in items {
                    if let Some(name) = str_field(item, "name") {
                        keys.insert(name.to_string());
                    }
                }
            }
        }
    }

    keys
}

/// Extract (label, count) pairs for counted resources in one domain.
fn counted_items(domain: &str, facts: &Value) -> Vec<(&'static str, usize)> {
    match domain {
        TYPE_DOMAIN => vec![
            ("calls", array_of(facts, "calls").len()),
            ("relationships", array_of(facts, "relationships").len()),
        ],
        TOPOLOGY_DOMAIN => vec![("outbound_calls", array_of(facts, "outbound_calls").len())],
        _ => match facts.as_array() {
            // Unnamed arrays degrade to a raw count
            Some(items) if !items.iter().any(|i| str_field(i, "name").is_some()) => {
                vec![("items", items.len())]
            }
            _ => vec![],
        },
    }
}

fn array_of<'a>(facts: &'a Value, field: &str) -> &'a [Value] {
    facts
        .get(field)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value.get(field).and_then(|v| v.as_str())
}

/// Diff one domain.
///
/// `added` and `removed` swap when the arguments swap; diffing a domain
/// against itself yields an empty result.
pub fn diff_domain(domain: &str, from: Option<&Value>, to: Option<&Value>) -> DomainDiff {
    let mut diff = DomainDiff {
        domain: domain.to_string(),
        ..DomainDiff::default()
    };

    match (from, to) {
        (None, None) => return diff,
        (None, Some(to)) => {
            diff.added = keyed_items(domain, to).into_iter().collect();
            diff.detail.push(format!("domain '{}' appeared", domain));
            return diff;
        }
        (Some(from), None) => {
            diff.removed = keyed_items(domain, from).into_iter().collect();
            diff.detail.push(format!("domain '{}' disappeared", domain));
            return diff;
        }
        (Some(from), Some(to)) => {
            let from_keys = keyed_items(domain, from);
            let to_keys = keyed_items(domain, to);

            diff.added = to_keys.difference(&from_keys).cloned().collect();
            diff.removed = from_keys.difference(&to_keys).cloned().collect();

            let from_counts: BTreeMap<&str, usize> =
                counted_items(domain, from).into_iter().collect();
            for (label, to_count) in counted_items(domain, to) {
                let from_count = from_counts.get(label).copied().unwrap_or(0);
                if from_count != to_count {
                    let delta = to_count as i64 - from_count as i64;
                    diff.detail.push(format!(
                        "{}: {} -> {} ({:+})",
                        label, from_count, to_count, delta
                    ));
                }
            }
        }
    }

    diff
}

/// Diff every fact domain present in either snapshot.
pub fn diff_snapshots(from: &ExtractionSnapshot, to: &ExtractionSnapshot) -> Vec<DomainDiff> {
    let domains: BTreeSet<&str> = from.domains().chain(to.domains()).collect();

    domains
        .into_iter()
        .map(|domain| {
            diff_domain(
                domain,
                from.facts_by_domain.get(domain),
                to.facts_by_domain.get(domain),
            )
        })
        .filter(|d| !d.is_empty())
        .collect()
}

/// Ecosystem-wide diff: per-domain aggregation over many repositories, with
/// item keys qualified by repo (`repo/item_key`) to avoid cross-repo name
/// collisions. A repository present on only one side degrades to "no data"
/// on the other, never aborting the aggregation.
pub fn diff_ecosystem(
    from_by_repo: &BTreeMap<String, ExtractionSnapshot>,
    to_by_repo: &BTreeMap<String, ExtractionSnapshot>,
) -> Vec<DomainDiff> {
    let repos: BTreeSet<&String> = from_by_repo.keys().chain(to_by_repo.keys()).collect();

    let mut by_domain: BTreeMap<String, DomainDiff> = BTreeMap::new();
    for repo in repos {
        let from = from_by_repo.get(repo.as_str());
        let to = to_by_repo.get(repo.as_str());

        let domains: BTreeSet<&str> = from
            .map(|s| s.domains().collect::<BTreeSet<_>>())
            .unwrap_or_default()
            .into_iter()
            .chain(to.map(|s| s.domains().collect::<BTreeSet<_>>()).unwrap_or_default())
            .collect();

        for domain in domains {
            let repo_diff = diff_domain(
                domain,
                from.and_then(|s| s.facts_by_domain.get(domain)),
                to.and_then(|s| s.facts_by_domain.get(domain)),
            );
            if repo_diff.is_empty() {
                continue;
            }

            let entry = by_domain.entry(domain.to_string()).or_insert_with(|| DomainDiff {
                domain: domain.to_string(),
                ..DomainDiff::default()
            });
            entry
                .added
                .extend(repo_diff.added.into_iter().map(|k| format!("{}/{}", repo, k)));
            entry
                .removed
                .extend(repo_diff.removed.into_iter().map(|k| format!("{}/{}", repo, k)));
            entry
                .detail
                .extend(repo_diff.detail.into_iter().map(|d| format!("{}: {}", repo, d)));
        }
    }

    by_domain.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CallEdge, TypeDefinition, TypeFacts, TypeKind};
    use chrono::Utc;

    fn type_facts_value(names: &[&str], calls: usize) -> Value {
        let facts = TypeFacts {
            types: names
                .iter()
                .map(|n| TypeDefinition::new(*n, TypeKind::Struct, "models.py", 1))
                .collect(),
            calls: (0..calls)
                .map(|i| CallEdge::new("f", "g", "app.py", i as u32))
                .collect(),
            ..TypeFacts::default()
        };
        serde_json::to_value(&facts).unwrap()
    }

    #[test]
    fn test_added_removed_scenario() {
        // v1 {A, B} vs v2 {B, C} -> added [C], removed [A]
        let from = type_facts_value(&["A", "B"], 0);
        let to = type_facts_value(&["B", "C"], 0);

        let diff = diff_domain(TYPE_DOMAIN, Some(&from), Some(&to));
        assert_eq!(diff.added, vec!["struct/C"]);
        assert_eq!(diff.removed, vec!["struct/A"]);
    }

    #[test]
    fn test_diff_is_antisymmetric() {
        let a = type_facts_value(&["A", "B"], 0);
        let b = type_facts_value(&["B", "C"], 0);

        let forward = diff_domain(TYPE_DOMAIN, Some(&a), Some(&b));
        let backward = diff_domain(TYPE_DOMAIN, Some(&b), Some(&a));
        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
    }

    #[test]
    fn test_diff_against_self_is_empty() {
        let facts = type_facts_value(&["A"], 3);
        let diff = diff_domain(TYPE_DOMAIN, Some(&facts), Some(&facts));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_wholly_absent_side() {
        let facts = type_facts_value(&["A"], 2);

        let appeared = diff_domain(TYPE_DOMAIN, None, Some(&facts));
        assert_eq!(appeared.added, vec!["struct/A"]);
        assert!(appeared.removed.is_empty());

        let gone = diff_domain(TYPE_DOMAIN, Some(&facts), None);
        assert_eq!(gone.removed, vec!["struct/A"]);
        assert!(gone.added.is_empty());
    }

    #[test]
    fn test_counted_resources_report_delta() {
        let from = type_facts_value(&["A"], 2);
        let to = type_facts_value(&["A"], 5);

        let diff = diff_domain(TYPE_DOMAIN, Some(&from), Some(&to));
        assert!(diff.added.is_empty());
        assert_eq!(diff.detail, vec!["calls: 2 -> 5 (+3)"]);
    }

    #[test]
    fn test_ecosystem_keys_qualified_by_repo() {
        let mut from = BTreeMap::new();
        let mut to = BTreeMap::new();

        let mut snap_a1 = ExtractionSnapshot::new("repo-a", "v1", Utc::now());
        snap_a1
            .facts_by_domain
            .insert(TYPE_DOMAIN.to_string(), type_facts_value(&["User"], 0));
        let mut snap_a2 = ExtractionSnapshot::new("repo-a", "v2", Utc::now());
        snap_a2
            .facts_by_domain
            .insert(TYPE_DOMAIN.to_string(), type_facts_value(&[], 0));

        // repo-b exists only on the "to" side: degrades to no data on "from"
        let mut snap_b = ExtractionSnapshot::new("repo-b", "v2", Utc::now());
        snap_b
            .facts_by_domain
            .insert(TYPE_DOMAIN.to_string(), type_facts_value(&["User"], 0));

        from.insert("repo-a".to_string(), snap_a1);
        to.insert("repo-a".to_string(), snap_a2);
        to.insert("repo-b".to_string(), snap_b);

        let diffs = diff_ecosystem(&from, &to);
        assert_eq!(diffs.len(), 1);
        let diff = &diffs[0];
        assert!(diff.removed.contains(&"repo-a/struct/User".to_string()));
        assert!(diff.added.contains(&"repo-b/struct/User".to_string()));
    }
}

//! Type Matcher - cross-repository similarity scoring
//!
//! Groups type definitions from many repositories by normalized name, scores
//! pairwise shape similarity, and emits type-flow edges for groups that look
//! like shared data contracts.

use crate::schema::{TypeDefinition, TypeKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Similarity scoring weights. Defaults sum to 100.
///
/// The 50/20/30 split has no documented derivation; it is kept configurable
/// rather than second-guessed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Awarded for an exact normalized-name match
    #[serde(default = "default_exact_name")]
    pub exact_name: u32,
    /// Awarded when the two kinds share an equivalence class
    #[serde(default = "default_kind_affinity")]
    pub kind_affinity: u32,
    /// Scaled by the shared-field overlap ratio
    #[serde(default = "default_field_overlap")]
    pub field_overlap: u32,
}

fn default_exact_name() -> u32 {
    50
}
fn default_kind_affinity() -> u32 {
    20
}
fn default_field_overlap() -> u32 {
    30
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            exact_name: default_exact_name(),
            kind_affinity: default_kind_affinity(),
            field_overlap: default_field_overlap(),
        }
    }
}

/// One instance of a matched type in a specific repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeInstance {
    pub repo: String,
    #[serde(rename = "type")]
    pub type_def: TypeDefinition,
}

/// A group of similarly-shaped types found in two or more repositories.
///
/// Derived on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossRepoMatch {
    pub normalized_name: String,
    pub instances: Vec<TypeInstance>,
    /// Average pairwise similarity over cross-repo pairs, 0..=100
    pub similarity: u32,
}

impl CrossRepoMatch {
    pub fn repos(&self) -> BTreeSet<&str> {
        self.instances.iter().map(|i| i.repo.as_str()).collect()
    }
}

/// An inferred data-contract edge between two repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeFlowEdge {
    pub from_repo: String,
    pub to_repo: String,
    pub type_name: String,
    pub shared_fields: Vec<String>,
    /// Confidence inherited from the owning match group
    pub similarity: u32,
}

/// Normalize a type name for cross-language comparison: lowercase, with
/// `_` and `-` stripped (so `UserProfile` and `user_profile` collide).
pub fn normalize_type_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Whether two kinds share an equivalence class:
/// struct ≈ class ≈ interface; trait ≈ interface ≈ protocol; otherwise only
/// identical kinds match.
fn kinds_compatible(a: TypeKind, b: TypeKind) -> bool {
    if a == b {
        return true;
    }
    let record = [TypeKind::Struct, TypeKind::Class, TypeKind::Interface];
    let contract = [TypeKind::Trait, TypeKind::Interface, TypeKind::Protocol];
    (record.contains(&a) && record.contains(&b)) || (contract.contains(&a) && contract.contains(&b))
}

/// Pairwise shape similarity, symmetric, always within [0, 100] for default
/// weights.
///
/// The field-overlap term is only computed when both sides declare at least
/// one field; a zero-field side contributes 0, not an undefined ratio.
pub fn similarity(a: &TypeDefinition, b: &TypeDefinition, weights: &SimilarityWeights) -> u32 {
    let mut score = 0;

    if normalize_type_name(&a.name) == normalize_type_name(&b.name) {
        score += weights.exact_name;
    }
    if kinds_compatible(a.kind, b.kind) {
        score += weights.kind_affinity;
    }

    if !a.fields.is_empty() && !b.fields.is_empty() {
        let a_fields: BTreeSet<String> = a.field_names().map(normalize_type_name).collect();
        let b_fields: BTreeSet<String> = b.field_names().map(normalize_type_name).collect();
        let shared = a_fields.intersection(&b_fields).count();
        // Denominator is the raw declared-field count, not the deduplicated
        // name set: fields that collide after normalization must not shrink it
        let overlap = shared as f64 / a.fields.len().max(b.fields.len()) as f64;
        score += (weights.field_overlap as f64 * overlap).round() as u32;
    }

    score
}

/// Group all type definitions by normalized name across repositories and
/// score each multi-repo group. Groups confined to a single repository are
/// discarded; results are sorted by similarity descending.
pub fn match_across_repos(
    types_by_repo: &BTreeMap<String, Vec<TypeDefinition>>,
    weights: &SimilarityWeights,
) -> Vec<CrossRepoMatch> {
    let mut groups: BTreeMap<String, Vec<TypeInstance>> = BTreeMap::new();

    for (repo, types) in types_by_repo {
        for ty in types {
            groups
                .entry(normalize_type_name(&ty.name))
                .or_default()
                .push(TypeInstance {
                    repo: repo.clone(),
                    type_def: ty.clone(),
                });
        }
    }

    let mut matches: Vec<CrossRepoMatch> = groups
        .into_iter()
        .filter(|(_, instances)| {
            let repos: BTreeSet<&str> = instances.iter().map(|i| i.repo.as_str()).collect();
            repos.len() >= 2
        })
        .map(|(normalized_name, instances)| {
            let score = group_score(&instances, weights);
            CrossRepoMatch {
                normalized_name,
                instances,
                similarity: score,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .cmp(&a.similarity)
            .then_with(|| a.normalized_name.cmp(&b.normalized_name))
    });
    matches
}

/// Average pairwise similarity over cross-repo pairs only. Same-repo pairs
/// (duplicate definitions within one repo) carry no cross-contract evidence
/// and are excluded from the average.
fn group_score(instances: &[TypeInstance], weights: &SimilarityWeights) -> u32 {
    let mut total = 0u64;
    let mut pairs = 0u64;

    for (i, a) in instances.iter().enumerate() {
        for b in &instances[i + 1..] {
            if a.repo == b.repo {
                continue;
            }
            total += similarity(&a.type_def, &b.type_def, weights) as u64;
            pairs += 1;
        }
    }

    if pairs == 0 {
        0
    } else {
        (total as f64 / pairs as f64).round() as u32
    }
}

/// Emit directed type-flow edges for match groups at or above
/// `min_similarity`: one edge per ordered cross-repo instance pair, carrying
/// the shared normalized field names and the group's confidence. These double
/// as implicit-dependency signals for topology inference.
pub fn build_type_flow_edges(matches: &[CrossRepoMatch], min_similarity: u32) -> Vec<TypeFlowEdge> {
    let mut edges = Vec::new();

    for group in matches {
        if group.similarity < min_similarity {
            continue;
        }
        for a in &group.instances {
            for b in &group.instances {
                if a.repo == b.repo {
                    continue;
                }
                let a_fields: BTreeSet<String> =
                    a.type_def.field_names().map(normalize_type_name).collect();
                let b_fields: BTreeSet<String> =
                    b.type_def.field_names().map(normalize_type_name).collect();
                let shared_fields: Vec<String> =
                    a_fields.intersection(&b_fields).cloned().collect();

                edges.push(TypeFlowEdge {
                    from_repo: a.repo.clone(),
                    to_repo: b.repo.clone(),
                    type_name: group.normalized_name.clone(),
                    shared_fields,
                    similarity: group.similarity,
                });
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeKind;

    fn profile_a() -> TypeDefinition {
        TypeDefinition::new("UserProfile", TypeKind::Struct, "src/user.rs", 4)
            .with_field("id", "u64")
            .with_field("email", "String")
    }

    fn profile_b() -> TypeDefinition {
        TypeDefinition::new("user_profile", TypeKind::Struct, "models.py", 9)
            .with_field("id", "int")
            .with_field("email", "str")
            .with_field("createdAt", "datetime")
    }

    #[test]
    fn test_similarity_scenario() {
        // 50 (name) + 20 (kind) + round(30 * 2/3) = 90
        let score = similarity(&profile_a(), &profile_b(), &SimilarityWeights::default());
        assert_eq!(score, 90);
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let w = SimilarityWeights::default();
        let a = profile_a();
        let b = profile_b();
        assert_eq!(similarity(&a, &b, &w), similarity(&b, &a, &w));
    }

    #[test]
    fn test_similarity_bounds_with_zero_fields() {
        let w = SimilarityWeights::default();
        let a = TypeDefinition::new("Marker", TypeKind::Trait, "lib.rs", 1);
        let b = TypeDefinition::new("Marker", TypeKind::Protocol, "marker.py", 1);
        let score = similarity(&a, &b, &w);
        // Name and kind terms only; field term must be 0, not undefined
        assert_eq!(score, 70);
        assert!(score <= 100);
    }

    #[test]
    fn test_overlap_denominator_uses_raw_field_counts() {
        let w = SimilarityWeights::default();
        // Both fields normalize to "createdat", but the type still declares two
        let a = TypeDefinition::new("Event", TypeKind::Struct, "event.rs", 1)
            .with_field("created_at", "DateTime")
            .with_field("createdAt", "String");
        let b = TypeDefinition::new("Event", TypeKind::Class, "event.ts", 1)
            .with_field("createdat", "string");

        // 50 + 20 + round(30 * 1/2), not 1/1 over the deduplicated name set
        assert_eq!(similarity(&a, &b, &w), 85);
    }

    #[test]
    fn test_kind_equivalence_classes() {
        let w = SimilarityWeights::default();
        let iface = TypeDefinition::new("Shape", TypeKind::Interface, "a.ts", 1);
        let tr = TypeDefinition::new("Shape", TypeKind::Trait, "b.rs", 1);
        let en = TypeDefinition::new("Shape", TypeKind::Enum, "c.rs", 1);
        assert_eq!(similarity(&iface, &tr, &w), 70);
        assert_eq!(similarity(&tr, &en, &w), 50);
        assert_eq!(similarity(&en, &en.clone(), &w), 70);
    }

    #[test]
    fn test_single_repo_groups_discarded() {
        let mut by_repo = BTreeMap::new();
        by_repo.insert("only-repo".to_string(), vec![profile_a(), profile_a()]);

        let matches = match_across_repos(&by_repo, &SimilarityWeights::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_match_across_repos_ranked() {
        let mut by_repo = BTreeMap::new();
        by_repo.insert("shop-api".to_string(), vec![profile_a()]);
        by_repo.insert(
            "shop-web".to_string(),
            vec![
                profile_b(),
                TypeDefinition::new("Cart", TypeKind::Class, "cart.ts", 2).with_field("items", "Item"),
            ],
        );
        by_repo.insert(
            "billing".to_string(),
            vec![TypeDefinition::new("cart", TypeKind::Struct, "cart.go", 7).with_field("total", "int")],
        );

        let matches = match_across_repos(&by_repo, &SimilarityWeights::default());
        assert_eq!(matches.len(), 2);
        // userprofile at 90 outranks cart (50 + 20 + 0 overlap)
        assert_eq!(matches[0].normalized_name, "userprofile");
        assert_eq!(matches[0].similarity, 90);
        assert_eq!(matches[1].normalized_name, "cart");
        assert!(matches[0].similarity >= matches[1].similarity);
    }

    #[test]
    fn test_type_flow_edges_thresholded() {
        let mut by_repo = BTreeMap::new();
        by_repo.insert("shop-api".to_string(), vec![profile_a()]);
        by_repo.insert("shop-web".to_string(), vec![profile_b()]);

        let matches = match_across_repos(&by_repo, &SimilarityWeights::default());
        let edges = build_type_flow_edges(&matches, 60);
        // One ordered edge per cross-repo pair direction
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.similarity == 90));
        assert!(edges[0].shared_fields.contains(&"email".to_string()));

        assert!(build_type_flow_edges(&matches, 95).is_empty());
    }
}

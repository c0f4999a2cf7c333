//! Type facts - canonical type/schema definitions
//!
//! Every language's type-like constructs map onto [`TypeKind`]; field shapes
//! map onto [`FieldDefinition`]. Relationships between types are always
//! derived from the definitions, never stored as independent truth.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Universal kinds for type-like declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Struct,
    Class,
    Interface,
    Enum,
    Trait,
    TypeAlias,
    Union,
    Protocol,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Struct => "struct",
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Trait => "trait",
            TypeKind::TypeAlias => "type_alias",
            TypeKind::Union => "union",
            TypeKind::Protocol => "protocol",
        }
    }

    pub fn all() -> &'static [TypeKind] {
        &[
            TypeKind::Struct,
            TypeKind::Class,
            TypeKind::Interface,
            TypeKind::Enum,
            TypeKind::Trait,
            TypeKind::TypeAlias,
            TypeKind::Union,
            TypeKind::Protocol,
        ]
    }
}

impl FromStr for TypeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "struct" | "record" => Ok(TypeKind::Struct),
            "class" => Ok(TypeKind::Class),
            "interface" => Ok(TypeKind::Interface),
            "enum" => Ok(TypeKind::Enum),
            "trait" => Ok(TypeKind::Trait),
            "type_alias" | "alias" | "typedef" => Ok(TypeKind::TypeAlias),
            "union" => Ok(TypeKind::Union),
            "protocol" => Ok(TypeKind::Protocol),
            _ => Err(Error::InvalidSnapshot(format!("Unknown type kind: {}", s))),
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reference to a type from a field declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeRef {
    /// Resolved type name with generics/collection wrappers stripped
    pub name: String,
    /// Raw source text of the type annotation
    pub raw: String,
    /// Whether the reference is optional/nullable
    #[serde(default)]
    pub optional: bool,
    /// Whether the reference is wrapped in a collection (list, set, map)
    #[serde(default)]
    pub is_collection: bool,
    /// Generic arguments, if any
    #[serde(default)]
    pub generics: Vec<String>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw: name.clone(),
            name,
            ..Self::default()
        }
    }
}

/// A field of a type definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub type_ref: TypeRef,
    #[serde(default)]
    pub optional: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            type_ref,
            optional: false,
        }
    }
}

/// An enum/union variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// A type/schema definition extracted from one file.
///
/// Key within one snapshot: (name, origin_file, origin_line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub origin_file: String,
    pub origin_line: u32,
    /// Source language tag (e.g. "typescript", "kotlin")
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub visibility: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub doc: Option<String>,
}

impl TypeDefinition {
    pub fn new(
        name: impl Into<String>,
        kind: TypeKind,
        origin_file: impl Into<String>,
        origin_line: u32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            origin_file: origin_file.into(),
            origin_line,
            language: String::new(),
            visibility: String::new(),
            fields: Vec::new(),
            variants: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            tags: Vec::new(),
            doc: None,
        }
    }

    pub fn with_field(mut self, name: &str, type_name: &str) -> Self {
        self.fields
            .push(FieldDefinition::new(name, TypeRef::named(type_name)));
        self
    }

    /// Snapshot-local identity: (name, origin_file, origin_line)
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.name, self.origin_file, self.origin_line)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// Kinds of derived relationships between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Extends,
    Implements,
    Contains,
    Collection,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Extends => "extends",
            RelationshipKind::Implements => "implements",
            RelationshipKind::Contains => "contains",
            RelationshipKind::Collection => "collection",
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A derived relationship between two type names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRelationship {
    pub kind: RelationshipKind,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub via_field: Option<String>,
}

/// Derive relationships from a set of type definitions.
///
/// Emits `extends`/`implements` edges from declarations, and
/// `contains`/`collection` edges for fields whose type names refer to another
/// definition in the same set. This is a materialized view: recomputed on
/// demand, never persisted.
pub fn relationships_from(types: &[TypeDefinition]) -> Vec<TypeRelationship> {
    let known: std::collections::HashSet<&str> = types.iter().map(|t| t.name.as_str()).collect();
    let mut rels = Vec::new();

    for ty in types {
        for parent in &ty.extends {
            rels.push(TypeRelationship {
                kind: RelationshipKind::Extends,
                from: ty.name.clone(),
                to: parent.clone(),
                via_field: None,
            });
        }
        for iface in &ty.implements {
            rels.push(TypeRelationship {
                kind: RelationshipKind::Implements,
                from: ty.name.clone(),
                to: iface.clone(),
                via_field: None,
            });
        }
        for field in &ty.fields {
            if !known.contains(field.type_ref.name.as_str()) {
                continue;
            }
            if field.type_ref.name == ty.name {
                continue;
            }
            let kind = if field.type_ref.is_collection {
                RelationshipKind::Collection
            } else {
                RelationshipKind::Contains
            };
            rels.push(TypeRelationship {
                kind,
                from: ty.name.clone(),
                to: field.type_ref.name.clone(),
                via_field: Some(field.name.clone()),
            });
        }
    }

    rels
}

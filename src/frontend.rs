//! Front-end extractor seam
//!
//! Per-language/per-framework extractors live outside this crate; they plug in
//! through [`FactExtractor`] and are selected by applicability predicate, not
//! by a class hierarchy. The engine only ever sees canonical [`TypeFacts`].

use crate::schema::TypeFacts;
use crate::Result;

/// A front-end extractor that turns raw file content into canonical facts.
pub trait FactExtractor: Send + Sync {
    /// Display name ("kotlin", "openapi", ...)
    fn name(&self) -> &str;

    /// Whether this extractor can handle the given file
    fn applies_to(&self, path: &str) -> bool;

    /// Extract canonical facts from one file
    fn extract(&self, path: &str, content: &str) -> Result<TypeFacts>;
}

/// Registry of front-end extractors.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn FactExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: impl FactExtractor + 'static) {
        self.extractors.push(Box::new(extractor));
    }

    pub fn find(&self, path: &str) -> Option<&dyn FactExtractor> {
        self.extractors
            .iter()
            .find(|e| e.applies_to(path))
            .map(|e| e.as_ref())
    }

    /// Extract facts from one file, or None when no extractor applies.
    pub fn extract_file(&self, path: &str, content: &str) -> Result<Option<TypeFacts>> {
        match self.find(path) {
            Some(extractor) => extractor.extract(path, content).map(Some),
            None => Ok(None),
        }
    }

    /// Extract facts from many files, isolating per-file failures.
    ///
    /// A file that fails to extract contributes zero facts; the failure is
    /// logged and never propagates into the merged result.
    pub fn extract_all<'a>(
        &self,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> TypeFacts {
        let mut merged = TypeFacts::default();
        for (path, content) in files {
            match self.extract_file(path, content) {
                Ok(Some(facts)) => merged.merge(facts),
                Ok(None) => {}
                Err(e) => tracing::warn!("extraction failed for {}: {}", path, e),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{TypeDefinition, TypeKind};
    use crate::Error;

    struct StubExtractor;

    impl FactExtractor for StubExtractor {
        fn name(&self) -> &str {
            "stub"
        }

        fn applies_to(&self, path: &str) -> bool {
            path.ends_with(".stub")
        }

        fn extract(&self, path: &str, content: &str) -> Result<TypeFacts> {
            if content.is_empty() {
                return Err(Error::Extractor(format!("empty file: {}", path)));
            }
            Ok(TypeFacts {
                types: vec![TypeDefinition::new(content, TypeKind::Struct, path, 1)],
                ..TypeFacts::default()
            })
        }
    }

    #[test]
    fn test_registry_dispatch() {
        let mut registry = ExtractorRegistry::new();
        registry.register(StubExtractor);

        assert!(registry.find("model.stub").is_some());
        assert!(registry.find("model.other").is_none());
    }

    #[test]
    fn test_per_file_failure_is_isolated() {
        let mut registry = ExtractorRegistry::new();
        registry.register(StubExtractor);

        let merged = registry.extract_all([
            ("a.stub", "User"),
            ("broken.stub", ""),
            ("b.stub", "Order"),
            ("skipped.txt", "ignored"),
        ]);

        let names: Vec<_> = merged.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["User", "Order"]);
    }
}

//! Per-archive type loading for PlugScan
//!
//! The loader resolves every candidate name declared by one archive inside
//! a scope bound to that archive. Each candidate is handled on its own: a
//! name that fails to resolve is recorded as skipped and the batch moves on.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ResolutionError;

use super::catalog::{LoadScope, TypeResolver};
use super::types::{LoadedType, TypeRef};

/// Outcome of loading one archive.
#[derive(Debug, Default)]
pub struct LoadBatch {
    /// Types that resolved, in candidate order.
    pub loaded: Vec<TypeRef>,
    /// Candidates that failed, with the reason.
    pub skipped: Vec<(String, ResolutionError)>,
}

impl LoadBatch {
    fn push(mut self, candidate: &str, outcome: Result<LoadedType, ResolutionError>) -> Self {
        match outcome {
            Ok(loaded) => self.loaded.push(Arc::new(loaded)),
            Err(e) => {
                debug!(candidate = %candidate, error = %e, "Skipping candidate");
                self.skipped.push((candidate.to_string(), e));
            }
        }
        self
    }
}

/// Loads candidate types from archives through a shared resolver.
#[derive(Clone)]
pub struct TypeLoader {
    shared: Arc<dyn TypeResolver>,
}

impl TypeLoader {
    pub fn new(shared: Arc<dyn TypeResolver>) -> Self {
        Self { shared }
    }

    /// Resolve each of `candidates` in a scope bound to `archive`.
    pub fn load_types(&self, archive: &Path, candidates: &[String]) -> LoadBatch {
        let scope = LoadScope::new(archive, candidates.iter().cloned());

        let batch = candidates
            .iter()
            .fold(LoadBatch::default(), |batch, candidate| {
                batch.push(candidate, self.shared.resolve(candidate, &scope))
            });

        info!(
            archive = %archive.display(),
            loaded = batch.loaded.len(),
            skipped = batch.skipped.len(),
            "Loaded archive"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::catalog::{FactoryCatalog, MockTypeResolver, TypeDef};
    use std::path::PathBuf;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_types_all_resolve() {
        let catalog = FactoryCatalog::new()
            .with(TypeDef::new("com.x.Foo"))
            .with(TypeDef::new("com.x.Bar"));
        let loader = TypeLoader::new(Arc::new(catalog));

        let batch = loader.load_types(Path::new("/p/a.zip"), &names(&["com.x.Foo", "com.x.Bar"]));
        assert_eq!(batch.loaded.len(), 2);
        assert!(batch.skipped.is_empty());
        assert_eq!(batch.loaded[0].qualified_name(), "com.x.Foo");
        assert_eq!(batch.loaded[1].origin(), Path::new("/p/a.zip"));
    }

    #[test]
    fn test_load_types_skips_failures_without_aborting() {
        let catalog = FactoryCatalog::new()
            .with(TypeDef::new("com.x.Foo"))
            .with(TypeDef::new("com.x.Baz"));
        let loader = TypeLoader::new(Arc::new(catalog));

        let batch = loader.load_types(
            Path::new("/p/a.zip"),
            &names(&["com.x.Foo", "com.x.Foo$1", "com.x.Helper", "com.x.Baz"]),
        );

        let loaded: Vec<&str> = batch.loaded.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(loaded, vec!["com.x.Foo", "com.x.Baz"]);
        assert_eq!(batch.skipped.len(), 2);
        assert!(matches!(batch.skipped[0].1, ResolutionError::Malformed(_)));
        assert_eq!(
            batch.skipped[1],
            (
                "com.x.Helper".to_string(),
                ResolutionError::Unknown("com.x.Helper".to_string())
            )
        );
    }

    #[test]
    fn test_load_types_scope_is_bound_to_archive() {
        let mut resolver = MockTypeResolver::new();
        resolver
            .expect_resolve()
            .times(3)
            .returning(|name, scope| {
                assert_eq!(scope.archive(), Path::new("/p/sub/b.zip"));
                assert!(scope.declares(name));
                if name == "com.y.Broken" {
                    Err(ResolutionError::Unknown(name.to_string()))
                } else {
                    Ok(LoadedType::new(name, PathBuf::from(scope.archive()), vec![]))
                }
            });
        let loader = TypeLoader::new(Arc::new(resolver));

        let batch = loader.load_types(
            Path::new("/p/sub/b.zip"),
            &names(&["com.y.Foo", "com.y.Broken", "com.y.Bar"]),
        );
        assert_eq!(batch.loaded.len(), 2);
        assert_eq!(batch.skipped.len(), 1);
    }

    #[test]
    fn test_load_types_empty_candidates() {
        let loader = TypeLoader::new(Arc::new(FactoryCatalog::new()));
        let batch = loader.load_types(Path::new("/p/empty.zip"), &[]);
        assert!(batch.loaded.is_empty());
        assert!(batch.skipped.is_empty());
    }
}

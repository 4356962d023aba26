//! Type resolution for PlugScan
//!
//! A [`TypeResolver`] turns a qualified name found in an archive into a
//! [`LoadedType`]. The shipped resolver, [`FactoryCatalog`], is a table of
//! type definitions registered at build time: archives decide which of
//! those types get cataloged, but only types compiled into the catalog can
//! ever be resolved or instantiated.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ResolutionError;

use super::types::{Constructor, LoadedType, ParamKind, PluginObject};

static QUALIFIED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("qualified name pattern is valid")
});

/// Whether `name` is a dotted sequence of identifiers.
pub fn is_valid_qualified_name(name: &str) -> bool {
    QUALIFIED_NAME_RE.is_match(name)
}

/// Loading context for one archive.
///
/// Names declared by the archive resolve here; everything else is
/// delegated to the shared resolver behind it.
#[derive(Debug, Clone)]
pub struct LoadScope {
    archive: PathBuf,
    declared: HashSet<String>,
}

impl LoadScope {
    pub fn new(archive: impl Into<PathBuf>, declared: impl IntoIterator<Item = String>) -> Self {
        Self {
            archive: archive.into(),
            declared: declared.into_iter().collect(),
        }
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Whether the archive declares `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name)
    }
}

/// Resolves qualified names into loaded types.
#[cfg_attr(test, mockall::automock)]
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, qualified_name: &str, scope: &LoadScope)
        -> Result<LoadedType, ResolutionError>;
}

/// Build-time definition of a plugin type.
#[derive(Debug, Clone)]
pub struct TypeDef {
    qualified_name: String,
    constructors: Vec<Constructor>,
}

impl TypeDef {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            constructors: Vec::new(),
        }
    }

    /// Add a constructor taking `params`.
    pub fn constructor<F>(mut self, params: Vec<ParamKind>, factory: F) -> Self
    where
        F: Fn(&[serde_json::Value]) -> anyhow::Result<PluginObject> + Send + Sync + 'static,
    {
        self.constructors.push(Constructor::new(params, factory));
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }
}

/// Resolver backed by statically registered [`TypeDef`]s.
#[derive(Debug, Clone, Default)]
pub struct FactoryCatalog {
    defs: HashMap<String, TypeDef>,
}

impl FactoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type definition, replacing any previous one with the
    /// same qualified name.
    pub fn register(&mut self, def: TypeDef) -> &mut Self {
        self.defs.insert(def.qualified_name.clone(), def);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, def: TypeDef) -> Self {
        self.register(def);
        self
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.defs.contains_key(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl TypeResolver for FactoryCatalog {
    fn resolve(
        &self,
        qualified_name: &str,
        scope: &LoadScope,
    ) -> Result<LoadedType, ResolutionError> {
        if !is_valid_qualified_name(qualified_name) {
            return Err(ResolutionError::Malformed(qualified_name.to_string()));
        }
        if !scope.declares(qualified_name) {
            return Err(ResolutionError::OutOfScope {
                name: qualified_name.to_string(),
                archive: scope.archive().display().to_string(),
            });
        }
        let def = self
            .defs
            .get(qualified_name)
            .ok_or_else(|| ResolutionError::Unknown(qualified_name.to_string()))?;

        Ok(LoadedType::new(
            def.qualified_name.clone(),
            scope.archive(),
            def.constructors.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FactoryCatalog {
        FactoryCatalog::new()
            .with(TypeDef::new("com.x.Foo").constructor(vec![], |_| Ok(Box::new(1u32))))
            .with(TypeDef::new("com.x.Bar"))
    }

    fn scope(names: &[&str]) -> LoadScope {
        LoadScope::new("/plugins/a.zip", names.iter().map(|n| n.to_string()))
    }

    #[test]
    fn test_valid_qualified_names() {
        assert!(is_valid_qualified_name("Foo"));
        assert!(is_valid_qualified_name("com.x.Foo"));
        assert!(is_valid_qualified_name("_internal.v2.Thing_1"));
    }

    #[test]
    fn test_invalid_qualified_names() {
        assert!(!is_valid_qualified_name(""));
        assert!(!is_valid_qualified_name("com.x.Foo$1"));
        assert!(!is_valid_qualified_name("com..Foo"));
        assert!(!is_valid_qualified_name(".Foo"));
        assert!(!is_valid_qualified_name("9lives.Cat"));
        assert!(!is_valid_qualified_name("package-info"));
    }

    #[test]
    fn test_resolve_known_type() {
        let loaded = catalog()
            .resolve("com.x.Foo", &scope(&["com.x.Foo"]))
            .unwrap();
        assert_eq!(loaded.qualified_name(), "com.x.Foo");
        assert_eq!(loaded.short_name(), "Foo");
        assert_eq!(loaded.origin(), Path::new("/plugins/a.zip"));
        assert_eq!(loaded.constructors().len(), 1);
    }

    #[test]
    fn test_resolve_unknown_type() {
        let err = catalog()
            .resolve("com.x.Missing", &scope(&["com.x.Missing"]))
            .unwrap_err();
        assert_eq!(err, ResolutionError::Unknown("com.x.Missing".to_string()));
    }

    #[test]
    fn test_resolve_malformed_name() {
        let err = catalog()
            .resolve("com.x.Foo$Inner", &scope(&["com.x.Foo$Inner"]))
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Malformed(_)));
    }

    #[test]
    fn test_resolve_out_of_scope() {
        let err = catalog().resolve("com.x.Foo", &scope(&[])).unwrap_err();
        assert!(matches!(err, ResolutionError::OutOfScope { .. }));
    }

    #[test]
    fn test_register_replaces_definition() {
        let mut cat = catalog();
        assert_eq!(cat.len(), 2);
        cat.register(
            TypeDef::new("com.x.Bar").constructor(vec![ParamKind::String], |_| Ok(Box::new(()))),
        );
        assert_eq!(cat.len(), 2);
        assert!(cat.contains("com.x.Bar"));

        let loaded = cat.resolve("com.x.Bar", &scope(&["com.x.Bar"])).unwrap();
        assert_eq!(loaded.constructors()[0].params(), &[ParamKind::String]);
    }
}

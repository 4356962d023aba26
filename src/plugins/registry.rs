//! Type index for PlugScan
//!
//! This module provides [`TypeIndex`], the multi-keyed catalog of loaded
//! types. A type is reachable by its qualified name, its short name, a
//! custom tag computed from the type, and optionally an external tag given
//! by the caller when the type is added.
//!
//! Every key space is independent: a second type that collides with an
//! earlier one on any key replaces the earlier mapping for that key only.
//! Short names are not unique, so the last type added under a short name
//! shadows the others for short-name lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::types::{LoadedType, TypeRef};

/// Computes the custom tag of a type.
pub type TagProvider = Arc<dyn Fn(&LoadedType) -> String + Send + Sync>;

/// The default custom tag: the qualified name.
pub fn qualified_name_tag() -> TagProvider {
    Arc::new(|t: &LoadedType| t.qualified_name().to_string())
}

/// A catalog of loaded types indexed under several keys.
///
/// The set of all types is the value set of the qualified-name index; the
/// other indexes may hold fewer entries because of shadowing.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use plugscan::plugins::{LoadedType, TypeIndex};
///
/// let mut index = TypeIndex::new();
/// index.add(Arc::new(LoadedType::new("com.x.Foo", "/plugins/a.zip", vec![])));
///
/// assert!(index.find_by_full_name("com.x.Foo").is_some());
/// assert!(index.find_by_simple_name("Foo").is_some());
/// assert!(index.find_by_custom_tag("com.x.Foo").is_some());
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Clone)]
pub struct TypeIndex {
    by_full_name: HashMap<String, TypeRef>,
    by_simple_name: HashMap<String, TypeRef>,
    by_custom_tag: HashMap<String, TypeRef>,
    by_external_tag: HashMap<String, TypeRef>,
    tag_provider: TagProvider,
}

impl TypeIndex {
    /// Create an empty index tagging types by qualified name.
    pub fn new() -> Self {
        Self::with_tag_provider(qualified_name_tag())
    }

    /// Create an empty index with a custom tag provider.
    pub fn with_tag_provider(tag_provider: TagProvider) -> Self {
        Self {
            by_full_name: HashMap::new(),
            by_simple_name: HashMap::new(),
            by_custom_tag: HashMap::new(),
            by_external_tag: HashMap::new(),
            tag_provider,
        }
    }

    pub fn tag_provider(&self) -> &TagProvider {
        &self.tag_provider
    }

    /// Replace the custom tag provider.
    ///
    /// Existing entries keep the tags they were added with; only later
    /// calls to [`add`](Self::add) use the new provider.
    pub fn set_tag_provider(&mut self, tag_provider: TagProvider) {
        self.tag_provider = tag_provider;
    }

    /// Index a type under its qualified name, short name and custom tag.
    pub fn add(&mut self, loaded: TypeRef) {
        let tag = (self.tag_provider)(&*loaded);
        debug!(
            type_name = %loaded.qualified_name(),
            tag = %tag,
            "Indexed type"
        );

        self.by_full_name
            .insert(loaded.qualified_name().to_string(), Arc::clone(&loaded));
        self.by_simple_name
            .insert(loaded.short_name().to_string(), Arc::clone(&loaded));
        self.by_custom_tag.insert(tag, loaded);
    }

    /// [`add`](Self::add), then also index under `external_tag`.
    pub fn add_tagged(&mut self, loaded: TypeRef, external_tag: impl Into<String>) {
        self.add(Arc::clone(&loaded));
        self.by_external_tag.insert(external_tag.into(), loaded);
    }

    pub fn find_by_full_name(&self, name: &str) -> Option<TypeRef> {
        self.by_full_name.get(name).cloned()
    }

    pub fn find_by_simple_name(&self, name: &str) -> Option<TypeRef> {
        self.by_simple_name.get(name).cloned()
    }

    pub fn find_by_custom_tag(&self, tag: &str) -> Option<TypeRef> {
        self.by_custom_tag.get(tag).cloned()
    }

    pub fn find_by_external_tag(&self, tag: &str) -> Option<TypeRef> {
        self.by_external_tag.get(tag).cloned()
    }

    /// Snapshot of every indexed type. Order is unspecified.
    pub fn all_types(&self) -> Vec<TypeRef> {
        self.by_full_name.values().cloned().collect()
    }

    /// Number of distinct qualified names.
    pub fn len(&self) -> usize {
        self.by_full_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_full_name.is_empty()
    }

    /// Remove every entry from all four indexes. The tag provider is kept.
    pub fn clear(&mut self) {
        self.by_full_name.clear();
        self.by_simple_name.clear();
        self.by_custom_tag.clear();
        self.by_external_tag.clear();
    }
}

impl Default for TypeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeIndex")
            .field("types", &self.by_full_name.len())
            .field("simple_names", &self.by_simple_name.len())
            .field("custom_tags", &self.by_custom_tag.len())
            .field("external_tags", &self.by_external_tag.len())
            .finish()
    }
}

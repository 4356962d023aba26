//! Plugin profile for PlugScan
//!
//! A [`PluginProfile`] owns one plugin root directory and the [`TypeIndex`]
//! built from it. Reloading walks the root for archives, loads the types
//! each archive declares and swaps a freshly built index in as a single
//! step. Readers always see one complete index, never a partial update.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::ProfileConfig;
use crate::error::{PlugError, Result};

use super::catalog::TypeResolver;
use super::loader::TypeLoader;
use super::registry::{qualified_name_tag, TagProvider, TypeIndex};
use super::scanner::{ArchiveReader, ArchiveScanner, ZipArchiveReader};
use super::types::{LoadedType, PluginObject, TypeRef};

/// Computes an optional external tag for a type from the archive it was
/// loaded from.
pub type ExternalTagger = Arc<dyn Fn(&Path, &LoadedType) -> Option<String> + Send + Sync>;

/// Tags each type with the file stem of its archive (`a.zip` -> `a`).
pub fn archive_stem_tagger() -> ExternalTagger {
    Arc::new(|archive: &Path, _: &LoadedType| {
        archive
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
    })
}

/// Counters from one reload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReloadReport {
    /// Archives found under the root.
    pub archives: usize,
    /// Type names listed across all archives.
    pub candidates: usize,
    /// Candidates that resolved.
    pub loaded: usize,
    /// Candidates that failed to resolve.
    pub skipped: usize,
    /// Distinct qualified names in the new index.
    pub types: usize,
}

struct WriterState {
    tag_provider: TagProvider,
    external_tagger: Option<ExternalTagger>,
}

/// Builder for [`PluginProfile`].
pub struct ProfileBuilder {
    config: ProfileConfig,
    resolver: Option<Arc<dyn TypeResolver>>,
    reader: Arc<dyn ArchiveReader>,
    tag_provider: TagProvider,
    external_tagger: Option<ExternalTagger>,
}

impl ProfileBuilder {
    /// Resolver used to load every archive. Required.
    pub fn resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Archive reader, zip by default.
    pub fn archive_reader(mut self, reader: Arc<dyn ArchiveReader>) -> Self {
        self.reader = reader;
        self
    }

    /// Custom tag provider, qualified name by default.
    pub fn tag_provider(mut self, provider: TagProvider) -> Self {
        self.tag_provider = provider;
        self
    }

    /// External tagger applied while reloading. Takes precedence over
    /// `tag_by_archive` in the config.
    pub fn external_tagger(mut self, tagger: ExternalTagger) -> Self {
        self.external_tagger = Some(tagger);
        self
    }

    /// Validate the configuration, build the profile and run the first
    /// reload.
    pub fn build(mut self) -> Result<PluginProfile> {
        self.config.validate()?;
        let resolver = self
            .resolver
            .take()
            .ok_or_else(|| PlugError::Config("PluginProfile requires a type resolver".into()))?;
        Ok(self.assemble(resolver))
    }

    fn assemble(self, resolver: Arc<dyn TypeResolver>) -> PluginProfile {
        let external_tagger = self
            .external_tagger
            .or_else(|| self.config.tag_by_archive.then(archive_stem_tagger));

        let profile = PluginProfile {
            scanner: ArchiveScanner::with_reader(&self.config, self.reader),
            loader: TypeLoader::new(resolver),
            index: ArcSwap::from_pointee(TypeIndex::with_tag_provider(Arc::clone(
                &self.tag_provider,
            ))),
            writer: Mutex::new(WriterState {
                tag_provider: self.tag_provider,
                external_tagger,
            }),
            config: self.config,
        };
        profile.reload();
        profile
    }
}

/// Catalog of the plugin types found under one root directory.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use plugscan::plugins::{builtin, PluginProfile};
///
/// let profile = PluginProfile::new("/opt/plugins", Arc::new(builtin::catalog()));
/// for t in profile.all_types() {
///     println!("{} from {}", t.qualified_name(), t.origin().display());
/// }
/// let text = profile.make_object_as::<String>("Text", &["hello".into()]).unwrap();
/// assert_eq!(text, "hello");
/// ```
pub struct PluginProfile {
    config: ProfileConfig,
    scanner: ArchiveScanner,
    loader: TypeLoader,
    index: ArcSwap<TypeIndex>,
    writer: Mutex<WriterState>,
}

impl PluginProfile {
    /// Profile over `root` with default conventions, already loaded.
    pub fn new(root: impl Into<PathBuf>, resolver: Arc<dyn TypeResolver>) -> Self {
        Self::builder(ProfileConfig::with_root(root)).assemble(resolver)
    }

    /// Profile from a validated configuration, already loaded.
    pub fn from_config(config: ProfileConfig, resolver: Arc<dyn TypeResolver>) -> Result<Self> {
        Self::builder(config).resolver(resolver).build()
    }

    pub fn builder(config: ProfileConfig) -> ProfileBuilder {
        ProfileBuilder {
            config,
            resolver: None,
            reader: Arc::new(ZipArchiveReader),
            tag_provider: qualified_name_tag(),
            external_tagger: None,
        }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn root_dir(&self) -> &Path {
        &self.config.root_dir
    }

    /// Rescan the root and replace the active index.
    ///
    /// Unreadable paths and unresolvable candidates are skipped; a reload
    /// always completes.
    pub fn reload(&self) -> ReloadReport {
        let state = self.writer.lock();
        let mut index = TypeIndex::with_tag_provider(Arc::clone(&state.tag_provider));
        let mut report = ReloadReport::default();

        let archives = self.scanner.discover_archives(&self.config.root_dir);
        report.archives = archives.len();

        for archive in &archives {
            let candidates = self.scanner.list_type_names(archive);
            report.candidates += candidates.len();

            let batch = self.loader.load_types(archive, &candidates);
            report.loaded += batch.loaded.len();
            report.skipped += batch.skipped.len();

            for loaded in batch.loaded {
                let external = state
                    .external_tagger
                    .as_ref()
                    .and_then(|tagger| tagger(archive.as_path(), &*loaded));
                match external {
                    Some(tag) => index.add_tagged(loaded, tag),
                    None => index.add(loaded),
                }
            }
        }

        report.types = index.len();
        self.index.store(Arc::new(index));

        info!(
            root = %self.config.root_dir.display(),
            archives = report.archives,
            candidates = report.candidates,
            types = report.types,
            skipped = report.skipped,
            "Reloaded plugin profile"
        );
        report
    }

    /// The active index. Later writes do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<TypeIndex> {
        self.index.load_full()
    }

    /// Every cataloged type. Order is unspecified.
    pub fn all_types(&self) -> Vec<TypeRef> {
        self.index.load().all_types()
    }

    /// Exact qualified-name lookup.
    pub fn by_full_name(&self, name: &str) -> Result<TypeRef> {
        self.index.load().find_by_full_name(name).ok_or_else(|| {
            PlugError::NotFound(format!("No type with full name '{}' is plugged in", name))
        })
    }

    /// Exact short-name lookup. When several types share the short name
    /// only the last one added is reachable.
    pub fn by_simple_name(&self, name: &str) -> Result<TypeRef> {
        self.index.load().find_by_simple_name(name).ok_or_else(|| {
            PlugError::NotFound(format!("No type with simple name '{}' is plugged in", name))
        })
    }

    /// Qualified-name lookup, falling back to short name.
    ///
    /// A qualified-name match always wins, even when `name` is also the
    /// short name of a different type.
    pub fn by_name(&self, name: &str) -> Result<TypeRef> {
        let index = self.index.load();
        index
            .find_by_full_name(name)
            .or_else(|| index.find_by_simple_name(name))
            .ok_or_else(|| PlugError::NotFound(format!("No type named '{}' is plugged in", name)))
    }

    pub fn by_custom_tag(&self, tag: &str) -> Result<TypeRef> {
        self.index.load().find_by_custom_tag(tag).ok_or_else(|| {
            PlugError::NotFound(format!("No type with custom tag '{}' is plugged in", tag))
        })
    }

    pub fn by_external_tag(&self, tag: &str) -> Result<TypeRef> {
        self.index.load().find_by_external_tag(tag).ok_or_else(|| {
            PlugError::NotFound(format!("No type with external tag '{}' is plugged in", tag))
        })
    }

    /// Resolve `name` and build it with its zero-argument constructor.
    pub fn make_object(&self, name: &str) -> Result<PluginObject> {
        self.by_name(name)?.instantiate_default()
    }

    /// Resolve `name` and build it with the constructor matching `args`.
    ///
    /// Null arguments match any parameter kind; see
    /// [`LoadedType::instantiate`].
    pub fn make_object_with(&self, name: &str, args: &[Value]) -> Result<PluginObject> {
        self.by_name(name)?.instantiate(args)
    }

    /// [`make_object_with`](Self::make_object_with), downcast to `T`.
    pub fn make_object_as<T: 'static>(&self, name: &str, args: &[Value]) -> Result<T> {
        let object = self.make_object_with(name, args)?;
        object.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            PlugError::Construction(format!(
                "{} did not produce a {}",
                name,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Add a type to the active index.
    pub fn add(&self, loaded: TypeRef) {
        self.update(|index| index.add(loaded));
    }

    /// Add a type to the active index under an external tag as well.
    pub fn add_tagged(&self, loaded: TypeRef, external_tag: impl Into<String>) {
        let tag = external_tag.into();
        self.update(|index| index.add_tagged(loaded, tag));
    }

    /// Empty the active index.
    pub fn clear(&self) {
        self.update(TypeIndex::clear);
    }

    pub fn custom_tag_provider(&self) -> TagProvider {
        Arc::clone(&self.writer.lock().tag_provider)
    }

    /// Change the custom tag provider.
    ///
    /// Types already indexed keep their current tags until the next
    /// [`reload`](Self::reload), which rebuilds every entry with the new
    /// provider.
    pub fn set_custom_tag_provider(&self, provider: TagProvider) {
        let mut state = self.writer.lock();
        state.tag_provider = Arc::clone(&provider);
        let mut next = TypeIndex::clone(&self.index.load());
        next.set_tag_provider(provider);
        self.index.store(Arc::new(next));
    }

    fn update(&self, apply: impl FnOnce(&mut TypeIndex)) {
        let _state = self.writer.lock();
        let mut next = TypeIndex::clone(&self.index.load());
        apply(&mut next);
        self.index.store(Arc::new(next));
    }
}

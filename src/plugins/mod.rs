//! Plugin discovery and registry for PlugScan
//!
//! This module discovers plugin archives in a directory tree, catalogs the
//! types they declare and resolves those types by name for late-bound
//! construction.
//!
//! # Architecture
//!
//! - **scanner**: recursive archive discovery and entry listing
//! - **catalog**: the `TypeResolver` seam and the build-time `FactoryCatalog`
//! - **loader**: per-archive loading with per-candidate failure isolation
//! - **registry**: `TypeIndex`, the four-key type catalog
//! - **profile**: `PluginProfile`, which ties the pipeline together
//! - **builtin**: platform types shipped with the crate
//!
//! # Plugin Directory Structure
//!
//! ```text
//! ~/.plugscan/plugins/
//! ├── a.zip
//! │   ├── com/x/Foo.unit
//! │   └── com/x/Bar.unit
//! └── sub/
//!     └── b.zip
//!         └── com/y/Foo.unit
//! ```
//!
//! Each `.unit` entry declares one type; its path maps to the qualified
//! name (`com/x/Foo.unit` -> `com.x.Foo`). Types are only instantiable when
//! the resolver knows them, so archives select from the types compiled into
//! the catalog rather than shipping code of their own.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use plugscan::plugins::{builtin, PluginProfile};
//!
//! let profile = PluginProfile::new("/home/user/.plugscan/plugins", Arc::new(builtin::catalog()));
//! let counter = profile.make_object_as::<builtin::Counter>("Counter", &[7.into()]).unwrap();
//! println!("Loaded {} types, counter at {}", profile.all_types().len(), counter.value());
//! ```

pub mod builtin;
pub mod catalog;
mod loader;
pub mod profile;
pub mod registry;
mod scanner;
pub mod types;

pub use catalog::{FactoryCatalog, LoadScope, TypeDef, TypeResolver};
pub use loader::{LoadBatch, TypeLoader};
pub use profile::{ExternalTagger, PluginProfile, ProfileBuilder, ReloadReport};
pub use registry::{TagProvider, TypeIndex};
pub use scanner::{ArchiveEntry, ArchiveReader, ArchiveScanner, ZipArchiveReader};
pub use types::{Constructor, LoadedType, ParamKind, PluginObject, TypeRef};

//! Archive discovery for PlugScan
//!
//! This module walks a plugin directory tree collecting archive files and
//! lists the type names declared inside each archive. Nothing here loads or
//! resolves types. Unreadable directories and archives are logged and
//! skipped so a single bad path never fails the scan.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ProfileConfig;
use crate::error::{PlugError, Result};

/// One entry listed by an [`ArchiveReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry path inside the archive, `/`-separated.
    pub name: String,
    /// Whether the entry is a directory marker.
    pub is_dir: bool,
}

impl ArchiveEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Lists the entries of an archive in stored order.
pub trait ArchiveReader: Send + Sync {
    fn entries(&self, archive: &Path) -> Result<Vec<ArchiveEntry>>;
}

/// [`ArchiveReader`] for zip-format archives.
///
/// Only the central directory is read; entry data is never decompressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveReader;

impl ArchiveReader for ZipArchiveReader {
    fn entries(&self, archive: &Path) -> Result<Vec<ArchiveEntry>> {
        let file = File::open(archive).map_err(|e| {
            PlugError::UnreadableArchive(format!("{}: {}", archive.display(), e))
        })?;
        let mut zip = zip::ZipArchive::new(file)?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let entry = zip.by_index_raw(i)?;
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
            });
        }
        Ok(entries)
    }
}

/// Finds archives under a root and lists the type names they declare.
#[derive(Clone)]
pub struct ArchiveScanner {
    archive_extension: String,
    unit_suffix: String,
    follow_links: bool,
    reader: Arc<dyn ArchiveReader>,
}

impl ArchiveScanner {
    /// Scanner for zip archives using the naming conventions in `config`.
    pub fn new(config: &ProfileConfig) -> Self {
        Self::with_reader(config, Arc::new(ZipArchiveReader))
    }

    /// Scanner with a custom archive reader.
    pub fn with_reader(config: &ProfileConfig, reader: Arc<dyn ArchiveReader>) -> Self {
        Self {
            archive_extension: config.archive_extension.trim_start_matches('.').to_string(),
            unit_suffix: config.unit_suffix.clone(),
            follow_links: config.follow_links,
            reader,
        }
    }

    /// Whether `path` carries the archive extension (case-insensitive).
    pub fn is_archive(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.archive_extension))
    }

    /// Recursively collect every archive file under `root`.
    ///
    /// Subtrees that cannot be read are skipped. Results are sorted by file
    /// name within each directory so repeated scans agree.
    pub fn discover_archives(&self, root: &Path) -> Vec<PathBuf> {
        let mut archives = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let err = PlugError::UnreadableDirectory(e.to_string());
                    warn!(root = %root.display(), error = %err, "Skipping unreadable path");
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_archive(entry.path()) {
                debug!(archive = %entry.path().display(), "Discovered archive");
                archives.push(entry.into_path());
            }
        }

        archives
    }

    /// Qualified names of the types declared in `archive`.
    ///
    /// Yields every non-directory entry ending in the unit suffix, with `/`
    /// mapped to `.` and the suffix removed. An unreadable archive yields
    /// nothing.
    pub fn list_type_names(&self, archive: &Path) -> Vec<String> {
        match self.reader.entries(archive) {
            Ok(entries) => self.type_names_from(&entries),
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "Failed to read archive, skipping");
                Vec::new()
            }
        }
    }

    fn type_names_from(&self, entries: &[ArchiveEntry]) -> Vec<String> {
        entries
            .iter()
            .filter(|e| !e.is_dir)
            .filter_map(|e| e.name.strip_suffix(self.unit_suffix.as_str()))
            .filter(|stem| !stem.is_empty())
            .map(|stem| stem.replace('/', "."))
            .collect()
    }
}

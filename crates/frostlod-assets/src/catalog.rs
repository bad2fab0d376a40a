//! Catalog Scanner
//!
//! Finds one mesh template per immediate subdirectory of a samples folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::sniff::{self, classify};

/// Extension of resource files
pub const RES_EXTENSION: &str = ".res";

/// A template found in the samples folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Subdirectory name
    pub display_name: String,
    /// Template file inside the subdirectory
    pub path: PathBuf,
}

/// Scan a samples folder.
///
/// A missing or unset root yields an empty catalog. Entries are sorted
/// case-insensitively by display name.
pub fn scan(root: Option<&Path>) -> Vec<CatalogEntry> {
    let Some(root) = root.filter(|root| !root.as_os_str().is_empty()) else {
        return Vec::new();
    };
    let Ok(listing) = fs::read_dir(root) else {
        log::debug!("Samples folder not readable: {}", root.display());
        return Vec::new();
    };

    let mut entries: Vec<CatalogEntry> = listing
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let dir = entry.path();
            find_template(&dir).map(|path| CatalogEntry {
                display_name: entry.file_name().to_string_lossy().into_owned(),
                path,
            })
        })
        .collect();

    entries.sort_by_cached_key(|entry| entry.display_name.to_lowercase());
    entries
}

/// First accepted template file in a directory, in listing order
pub fn find_template(dir: &Path) -> Option<PathBuf> {
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(err) => {
            log::warn!("Skipping {}: {}", dir.display(), err);
            return None;
        }
    };

    listing
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_res_file(path) && !sniff::is_blocks_file(path))
        .find(|path| classify(path).is_template())
}

fn is_res_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(RES_EXTENSION))
        .unwrap_or(false)
}

/// Scan results cached by root path
///
/// Rescans only when asked for a different root than last time, or after
/// [`CatalogCache::invalidate`].
#[derive(Debug, Default)]
pub struct CatalogCache {
    root: Option<PathBuf>,
    entries: Vec<CatalogEntry>,
}

impl CatalogCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog for `root`, scanning only if the root changed
    pub fn entries(&mut self, root: Option<&Path>) -> &[CatalogEntry] {
        let requested = root.map(Path::to_path_buf).unwrap_or_default();
        if self.root.as_ref() != Some(&requested) {
            self.entries = scan(root);
            log::debug!("Scanned {} templates in {}", self.entries.len(), requested.display());
            self.root = Some(requested);
        }
        &self.entries
    }

    /// Force the next lookup to rescan
    pub fn invalidate(&mut self) {
        self.root = None;
    }

    /// Root of the cached scan
    pub fn cached_root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

//! File-system family catalog

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ReconcileError;

use super::ResourceName;

/// A directory of loadable family files, keyed by file name without extension
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyCatalog {
    dir: PathBuf,
    extension: String,
}

impl FamilyCatalog {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// List catalog files, sorted by path.
    ///
    /// A missing or unreadable directory is `CatalogMissing`; a directory with
    /// no file carrying the extension is `CatalogEmpty`.
    pub fn family_files(&self) -> Result<Vec<PathBuf>, ReconcileError> {
        let missing = || ReconcileError::CatalogMissing {
            path: self.dir.clone(),
        };
        if !self.exists() {
            return Err(missing());
        }
        let entries = std::fs::read_dir(&self.dir).map_err(|_| missing())?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.has_extension(path))
            .collect();
        files.sort();
        debug!(dir = %self.dir.display(), count = files.len(), "scanned family catalog");

        if files.is_empty() {
            return Err(ReconcileError::CatalogEmpty {
                path: self.dir.clone(),
                extension: self.extension.clone(),
            });
        }
        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }
}

/// File name without extension
pub fn base_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Find the file whose base name equals `name`, ignoring case
pub fn find_file<'a>(files: &'a [PathBuf], name: &ResourceName) -> Option<&'a PathBuf> {
    files
        .iter()
        .find(|path| base_name(path).is_some_and(|stem| name.matches(&stem)))
}

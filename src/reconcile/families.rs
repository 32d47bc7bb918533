//! Family reconciliation: load missing families from the catalog directory

use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use crate::catalog::{find_existing, find_file, scan_existing, DesiredSet, FamilyCatalog, ResourceName};
use crate::document::{Document, ElementId, ResourceKind, Transaction};
use crate::error::{ReconcileError, StoreError};

use super::{Outcome, ReconciliationResult};

/// Make every desired family present, loading missing ones from `catalog`.
///
/// Each load runs in its own unit: a rejected file rolls back only itself and
/// never affects families committed earlier in the same call. The catalog
/// directory is listed at most once per call, on the first missing name; a
/// missing or empty catalog fails every missing name without touching the
/// document.
pub fn reconcile_families<D: Document + ?Sized>(
    doc: &mut D,
    desired: &DesiredSet,
    catalog: &FamilyCatalog,
) -> ReconciliationResult {
    let span = info_span!(
        "reconcile_families",
        catalog = %catalog.dir().display(),
        desired = desired.len()
    );
    let _enter = span.enter();

    let existing = scan_existing(doc, ResourceKind::Family, None);
    let mut listing: Option<Result<Vec<PathBuf>, ReconcileError>> = None;
    let mut result = ReconciliationResult::default();

    for name in desired.iter() {
        let outcome = if existing.contains(name) {
            fetch_existing(doc, name)
        } else {
            match listing.get_or_insert_with(|| catalog.family_files()) {
                Err(err) => {
                    warn!(family = %name, error = %err, "catalog unavailable");
                    Outcome::Failed(err.clone())
                }
                Ok(files) => match find_file(files, name) {
                    Some(path) => load(doc, name, path),
                    None => {
                        warn!(family = %name, "no matching catalog file");
                        Outcome::Failed(ReconcileError::NotFoundInCatalog {
                            name: name.to_string(),
                            path: catalog.dir().to_path_buf(),
                        })
                    }
                },
            }
        };
        result.push(name.clone(), outcome);
    }

    result
}

fn fetch_existing<D: Document + ?Sized>(doc: &D, name: &ResourceName) -> Outcome {
    match find_existing(doc, ResourceKind::Family, name) {
        Some(id) => {
            debug!(family = %name, %id, "already in document");
            Outcome::AlreadyPresent(id)
        }
        None => {
            warn!(family = %name, "vanished between scan and lookup");
            Outcome::Failed(ReconcileError::NotFoundInDocument {
                name: name.to_string(),
            })
        }
    }
}

fn load<D: Document + ?Sized>(doc: &mut D, name: &ResourceName, path: &Path) -> Outcome {
    match load_in_unit(doc, path) {
        Ok(id) => {
            info!(family = %name, %id, path = %path.display(), "family loaded");
            Outcome::Created(id)
        }
        Err(source) => {
            warn!(family = %name, path = %path.display(), error = %source, "family load failed");
            Outcome::Failed(ReconcileError::LoadFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn load_in_unit<D: Document + ?Sized>(doc: &mut D, path: &Path) -> Result<ElementId, StoreError> {
    let mut tx = Transaction::start(doc, "Load Family")?;
    let id = tx.load_family(path)?;
    tx.commit()?;
    Ok(id)
}

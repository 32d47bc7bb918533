//! Resource Reconciler - make named resources exist in a project document
//!
//! Given the families and line styles a project should carry, this library
//! scans the document, creates only what is missing, leaves everything else
//! untouched, and reports every name it could not resolve. It never deletes,
//! renames or modifies existing resources.
//!
//! # Example
//!
//! ```rust
//! use resource_reconciler::{aggregate, reconcile_styles, DesiredSet, Document, InMemoryDocument,
//!     StyleAppearance};
//!
//! let mut doc = InMemoryDocument::new();
//! let lines = doc.category("Lines").unwrap();
//! let result = reconcile_styles(
//!     &mut doc,
//!     &DesiredSet::new(["C1", "T1"]),
//!     lines,
//!     "Solid",
//!     &StyleAppearance::default(),
//! );
//! assert!(aggregate(&result).is_clean());
//! assert_eq!(result.created().count(), 2);
//! ```

pub mod catalog;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod reconcile;
pub mod report;

pub use catalog::{DesiredSet, FamilyCatalog, ResourceName};
pub use config::{ConfigError, ReconcileConfig};
pub use document::{Document, ElementId, InMemoryDocument, Transaction};
pub use error::{FailureKind, ReconcileError, StoreError};
pub use reconcile::{
    reconcile_families, reconcile_styles, resolve_pattern, ItemOutcome, Outcome,
    ReconciliationResult, ResolvedPattern, StyleAppearance, SOLID_PATTERN_NAME,
};
pub use report::{aggregate, Report, ReportEntry};

use tracing::error;

/// Reconcile the configured families against `doc`
pub fn sync_families<D: Document + ?Sized>(doc: &mut D, config: &ReconcileConfig) -> Report {
    let result = reconcile_families(doc, &config.families.desired(), &config.families.catalog());
    aggregate(&result)
}

/// Reconcile the configured line styles against `doc`.
///
/// An unknown category is reported as a pattern-less batch failure covering
/// every configured style.
pub fn sync_line_styles<D: Document + ?Sized>(doc: &mut D, config: &ReconcileConfig) -> Report {
    let settings = &config.line_styles;
    let Some(category) = doc.category(&settings.category) else {
        error!(category = %settings.category, "category not found");
        return aggregate(&ReconciliationResult {
            items: Vec::new(),
            batch_failure: Some(ReconcileError::StyleBatchFailed {
                pending: settings.desired().iter().map(|n| n.to_string()).collect(),
                source: StoreError::Host(format!("category '{}' not found", settings.category)),
            }),
        });
    };
    let result = reconcile_styles(
        doc,
        &settings.desired(),
        category,
        &settings.pattern,
        &settings.appearance(),
    );
    aggregate(&result)
}

/// Run family then line style reconciliation, as done when a project opens
pub fn sync<D: Document + ?Sized>(doc: &mut D, config: &ReconcileConfig) -> Report {
    let mut report = sync_families(doc, config);
    report.merge(sync_line_styles(doc, config));
    report
}

//! Error types for the document store and the reconciliation workflows

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::document::ElementId;

/// Failures reported by a [`Document`](crate::document::Document) implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A transactional unit is already open on this document
    #[error("transaction '{label}' is already open")]
    UnitAlreadyOpen { label: String },

    /// A mutation or commit was attempted outside a transactional unit
    #[error("no transaction is open")]
    NoOpenUnit,

    /// The store refused to load a file (corrupt file, version mismatch, ...)
    #[error("{0}")]
    Rejected(String),

    /// A resource with the same name already exists in the collection
    #[error("a resource named '{0}' already exists")]
    DuplicateName(String),

    /// The referenced element does not exist in the document
    #[error("element {0} does not exist")]
    MissingElement(ElementId),

    /// A line pattern definition was rejected before reaching the store
    #[error("invalid line pattern: {0}")]
    InvalidPattern(String),

    /// Any other host-level failure
    #[error("{0}")]
    Host(String),
}

/// Category of reconciliation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    CatalogMissing,
    CatalogEmpty,
    NotFoundInCatalog,
    NotFoundInDocument,
    LoadFailed,
    PatternResolutionFailed,
    StyleBatchFailed,
}

impl FailureKind {
    /// Whether this failure applies to a whole call rather than one name
    pub fn is_batch_wide(self) -> bool {
        matches!(
            self,
            FailureKind::CatalogMissing
                | FailureKind::CatalogEmpty
                | FailureKind::PatternResolutionFailed
                | FailureKind::StyleBatchFailed
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::CatalogMissing => write!(f, "catalog-missing"),
            FailureKind::CatalogEmpty => write!(f, "catalog-empty"),
            FailureKind::NotFoundInCatalog => write!(f, "not-found-in-catalog"),
            FailureKind::NotFoundInDocument => write!(f, "not-found-in-document"),
            FailureKind::LoadFailed => write!(f, "load-failed"),
            FailureKind::PatternResolutionFailed => write!(f, "pattern-resolution-failed"),
            FailureKind::StyleBatchFailed => write!(f, "style-batch-failed"),
        }
    }
}

/// Errors captured while reconciling desired resources against a document.
///
/// These are carried inside a [`ReconciliationResult`](crate::ReconciliationResult)
/// and never returned as `Err` from the reconciliation entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    /// The family catalog directory does not exist
    #[error("catalog directory '{}' does not exist", path.display())]
    CatalogMissing { path: PathBuf },

    /// The catalog directory holds no file with the family extension
    #[error("no '*.{extension}' files found in catalog directory '{}'", path.display())]
    CatalogEmpty { path: PathBuf, extension: String },

    /// No catalog file matches the desired name
    #[error("'{name}' not found in catalog directory '{}'", path.display())]
    NotFoundInCatalog { name: String, path: PathBuf },

    /// The resource was seen by the scan but vanished before it could be fetched
    #[error("'{name}' was listed in the document but could not be fetched")]
    NotFoundInDocument { name: String },

    /// The store rejected the load; the unit for this item was rolled back
    #[error("failed to load '{}': {source}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// The line pattern could not be found or created
    #[error("line pattern '{name}' could not be found or created: {source}")]
    PatternResolutionFailed {
        name: String,
        #[source]
        source: StoreError,
    },

    /// A construction step failed; every pending style creation was rolled back
    #[error("line style batch rolled back ({}): {source}", pending.join(", "))]
    StyleBatchFailed {
        pending: Vec<String>,
        #[source]
        source: StoreError,
    },
}

impl ReconcileError {
    /// The taxonomy bucket of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::CatalogMissing { .. } => FailureKind::CatalogMissing,
            Self::CatalogEmpty { .. } => FailureKind::CatalogEmpty,
            Self::NotFoundInCatalog { .. } => FailureKind::NotFoundInCatalog,
            Self::NotFoundInDocument { .. } => FailureKind::NotFoundInDocument,
            Self::LoadFailed { .. } => FailureKind::LoadFailed,
            Self::PatternResolutionFailed { .. } => FailureKind::PatternResolutionFailed,
            Self::StyleBatchFailed { .. } => FailureKind::StyleBatchFailed,
        }
    }
}

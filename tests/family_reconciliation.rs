//! Integration tests for family reconciliation

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use resource_reconciler::document::{
    Color, Fault, LinePattern, ResourceEntry, ResourceKind,
};
use resource_reconciler::{
    aggregate, reconcile_families, DesiredSet, Document, ElementId, FailureKind, FamilyCatalog,
    InMemoryDocument, Outcome, StoreError,
};
use tempfile::TempDir;

/// Catalog directory holding one non-empty `.rfa` file per name
fn catalog_with(names: &[&str]) -> (TempDir, FamilyCatalog) {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in names {
        fs::write(dir.path().join(format!("{name}.rfa")), b"family definition").unwrap();
    }
    let catalog = FamilyCatalog::new(dir.path(), "rfa");
    (dir, catalog)
}

fn family_names(doc: &InMemoryDocument) -> Vec<String> {
    doc.resources_of_kind(ResourceKind::Family)
        .into_iter()
        .map(|e| e.name)
        .collect()
}

#[test]
fn test_loads_match_and_reports_missing() {
    let (dir, catalog) = catalog_with(&["Beam", "Column"]);
    let mut doc = InMemoryDocument::new();

    let result = reconcile_families(&mut doc, &DesiredSet::new(["Beam", "Girder"]), &catalog);

    assert_eq!(result.created().map(|n| n.as_str()).collect::<Vec<_>>(), vec!["Beam"]);
    let failed: Vec<_> = result.failed().map(|(n, e)| (n.to_string(), e.kind())).collect();
    assert_eq!(failed, vec![("Girder".to_string(), FailureKind::NotFoundInCatalog)]);
    assert_eq!(family_names(&doc), vec!["Beam".to_string()]);
    // Only Beam.rfa was ever handed to the store
    assert_eq!(doc.loaded_paths().to_vec(), vec![dir.path().join("Beam.rfa")]);
}

#[test]
fn test_second_call_creates_nothing() {
    let (_dir, catalog) = catalog_with(&["Beam", "Column"]);
    let mut doc = InMemoryDocument::new();
    let desired = DesiredSet::new(["Beam", "Column"]);

    let first = reconcile_families(&mut doc, &desired, &catalog);
    assert_eq!(first.created().count(), 2);

    let second = reconcile_families(&mut doc, &desired, &catalog);
    assert_eq!(second.created().count(), 0);
    assert_eq!(
        second.already_present().map(|n| n.as_str()).collect::<Vec<_>>(),
        vec!["Beam", "Column"]
    );
    assert_eq!(first.id_of("Beam"), second.id_of("Beam"));
}

#[test]
fn test_case_insensitive_match_is_not_duplicated() {
    let (_dir, catalog) = catalog_with(&["Beam"]);
    let mut doc = InMemoryDocument::new().with_family("Beam");

    let result = reconcile_families(&mut doc, &DesiredSet::new(["BEAM", "beam"]), &catalog);

    assert_eq!(result.items.len(), 1);
    assert!(matches!(result.items[0].outcome, Outcome::AlreadyPresent(_)));
    assert_eq!(family_names(&doc), vec!["Beam".to_string()]);
    assert!(doc.unit_labels().is_empty());
}

#[test]
fn test_catalog_file_matched_ignoring_case() {
    let (_dir, catalog) = catalog_with(&["Beam"]);
    let mut doc = InMemoryDocument::new();

    let result = reconcile_families(&mut doc, &DesiredSet::new(["bEAM"]), &catalog);

    assert_eq!(result.created().count(), 1);
    assert_eq!(family_names(&doc), vec!["Beam".to_string()]);
}

#[test]
fn test_missing_file_does_not_block_siblings() {
    let (_dir, catalog) = catalog_with(&["A", "C"]);
    let mut doc = InMemoryDocument::new();

    let result = reconcile_families(&mut doc, &DesiredSet::new(["A", "B", "C"]), &catalog);

    assert_eq!(
        result.created().map(|n| n.as_str()).collect::<Vec<_>>(),
        vec!["A", "C"]
    );
    let failed: Vec<_> = result.failed().map(|(n, e)| (n.to_string(), e.kind())).collect();
    assert_eq!(failed, vec![("B".to_string(), FailureKind::NotFoundInCatalog)]);
    assert_eq!(family_names(&doc), vec!["A".to_string(), "C".to_string()]);
}

#[test]
fn test_rejected_load_rolls_back_only_that_item() {
    let (_dir, catalog) = catalog_with(&["A", "B", "C"]);
    let mut doc = InMemoryDocument::new();
    doc.inject(Fault::LoadFamily("B".to_string()));

    let result = reconcile_families(&mut doc, &DesiredSet::new(["A", "B", "C"]), &catalog);

    let (name, err) = result.failed().next().expect("B failed");
    assert_eq!(name.as_str(), "B");
    assert_eq!(err.kind(), FailureKind::LoadFailed);
    assert!(err.to_string().contains("corrupt"));
    assert_eq!(family_names(&doc), vec!["A".to_string(), "C".to_string()]);
    assert!(!doc.has_open_unit());
    assert_eq!(doc.unit_labels().len(), 3);
}

#[test]
fn test_empty_file_is_load_failure() {
    let (dir, catalog) = catalog_with(&["A"]);
    fs::write(dir.path().join("Broken.rfa"), b"").unwrap();
    let mut doc = InMemoryDocument::new();

    let result = reconcile_families(&mut doc, &DesiredSet::new(["Broken", "A"]), &catalog);

    let report = aggregate(&result);
    assert_eq!(report.created, vec!["A".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::LoadFailed);
}

#[test]
fn test_catalog_missing_fails_every_missing_name() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FamilyCatalog::new(dir.path().join("Family"), "rfa");
    let mut doc = InMemoryDocument::new().with_family("Column");

    let result = reconcile_families(&mut doc, &DesiredSet::new(["Beam", "Column", "Girder"]), &catalog);

    let report = aggregate(&result);
    assert_eq!(report.already_present, vec!["Column".to_string()]);
    let failed: Vec<_> = report.failures.iter().map(|f| (f.name.as_str(), f.kind)).collect();
    assert_eq!(
        failed,
        vec![
            ("Beam", FailureKind::CatalogMissing),
            ("Girder", FailureKind::CatalogMissing)
        ]
    );
}

#[test]
fn test_catalog_empty() {
    let (_dir, catalog) = catalog_with(&[]);
    let mut doc = InMemoryDocument::new();

    let result = reconcile_families(&mut doc, &DesiredSet::new(["Beam"]), &catalog);

    let (_, err) = result.failed().next().unwrap();
    assert_eq!(err.kind(), FailureKind::CatalogEmpty);
    assert!(doc.unit_labels().is_empty());
}

#[test]
fn test_created_subset_of_desired_minus_existing() {
    let (_dir, catalog) = catalog_with(&["A", "B", "C", "D"]);
    let mut doc = InMemoryDocument::new().with_family("B").with_family("X");
    let desired = DesiredSet::new(["D", "B", "A", "Q"]);

    let result = reconcile_families(&mut doc, &desired, &catalog);

    let created: Vec<_> = result.created().map(|n| n.as_str()).collect();
    let present: Vec<_> = result.already_present().map(|n| n.as_str()).collect();
    assert_eq!(created, vec!["D", "A"]);
    assert_eq!(present, vec!["B"]);
    // Result preserves desired order
    let order: Vec<_> = result.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(order, vec!["D", "B", "A", "Q"]);
}

/// Store that forgets one family after the first family query, as if another
/// actor deleted it mid-call
struct VanishingDocument {
    inner: InMemoryDocument,
    vanishing: String,
    family_queries: Cell<usize>,
}

impl Document for VanishingDocument {
    fn resources_of_kind(&self, kind: ResourceKind) -> Vec<ResourceEntry> {
        let mut entries = self.inner.resources_of_kind(kind);
        if kind == ResourceKind::Family {
            let seen = self.family_queries.get();
            self.family_queries.set(seen + 1);
            if seen > 0 {
                entries.retain(|e| e.name != self.vanishing);
            }
        }
        entries
    }

    fn category(&self, name: &str) -> Option<ElementId> {
        self.inner.category(name)
    }

    fn solid_pattern_id(&self) -> ElementId {
        self.inner.solid_pattern_id()
    }

    fn begin_unit(&mut self, label: &str) -> Result<(), StoreError> {
        self.inner.begin_unit(label)
    }

    fn commit_unit(&mut self) -> Result<(), StoreError> {
        self.inner.commit_unit()
    }

    fn rollback_unit(&mut self) -> Result<(), StoreError> {
        self.inner.rollback_unit()
    }

    fn load_family(&mut self, path: &Path) -> Result<ElementId, StoreError> {
        self.inner.load_family(path)
    }

    fn create_line_pattern(&mut self, pattern: &LinePattern) -> Result<ElementId, StoreError> {
        self.inner.create_line_pattern(pattern)
    }

    fn create_subcategory(&mut self, parent: ElementId, name: &str) -> Result<ElementId, StoreError> {
        self.inner.create_subcategory(parent, name)
    }

    fn set_line_weight(&mut self, subcategory: ElementId, weight: u8) -> Result<(), StoreError> {
        self.inner.set_line_weight(subcategory, weight)
    }

    fn set_line_color(&mut self, subcategory: ElementId, color: Color) -> Result<(), StoreError> {
        self.inner.set_line_color(subcategory, color)
    }

    fn set_line_pattern(&mut self, subcategory: ElementId, pattern: ElementId) -> Result<(), StoreError> {
        self.inner.set_line_pattern(subcategory, pattern)
    }
}

#[test]
fn test_vanished_family_is_not_found_not_a_crash() {
    let mut doc = VanishingDocument {
        inner: InMemoryDocument::new().with_family("Beam").with_family("Column"),
        vanishing: "Beam".to_string(),
        family_queries: Cell::new(0),
    };
    let catalog = FamilyCatalog::new(PathBuf::from("/unused"), "rfa");

    let result = reconcile_families(&mut doc, &DesiredSet::new(["Beam", "Column"]), &catalog);

    let failed: Vec<_> = result.failed().map(|(n, e)| (n.to_string(), e.kind())).collect();
    assert_eq!(failed, vec![("Beam".to_string(), FailureKind::NotFoundInDocument)]);
    assert_eq!(result.already_present().count(), 1);
}

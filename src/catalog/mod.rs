//! Catalog scanning
//!
//! Builds name facts from the live document and from the on-disk family
//! catalog. Nothing here is cached: each reconciliation call scans afresh.

mod directory;

pub use directory::{base_name, find_file, FamilyCatalog};

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::document::{Document, ElementId, ResourceEntry, ResourceKind};

/// A resource name compared case-insensitively.
///
/// The original spelling is kept for display; equality and hashing use the
/// lowercased form.
#[derive(Debug, Clone)]
pub struct ResourceName {
    display: String,
    folded: String,
}

impl ResourceName {
    pub fn new(name: impl Into<String>) -> Self {
        let display = name.into();
        let folded = display.to_lowercase();
        Self { display, folded }
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// Case-insensitive comparison against a raw name
    pub fn matches(&self, other: &str) -> bool {
        self.folded == other.to_lowercase()
    }
}

impl PartialEq for ResourceName {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for ResourceName {}

impl Hash for ResourceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Ordered desired names with duplicates removed; the first spelling wins
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredSet {
    names: Vec<ResourceName>,
}

impl DesiredSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ResourceName>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .map(Into::<ResourceName>::into)
            .filter(|name| seen.insert(name.clone()))
            .collect();
        Self { names }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceName> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<ResourceName>> FromIterator<S> for DesiredSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Names of the resources of one kind present in the document at scan time
#[derive(Debug, Clone, Default)]
pub struct ExistingResourceIndex {
    names: HashSet<ResourceName>,
}

impl ExistingResourceIndex {
    pub fn contains(&self, name: &ResourceName) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Scan the document for resources of `kind`.
///
/// When `parent` is given only entries whose direct parent is that element
/// count, so a same-named subcategory under another category is ignored.
pub fn scan_existing<D: Document + ?Sized>(
    doc: &D,
    kind: ResourceKind,
    parent: Option<ElementId>,
) -> ExistingResourceIndex {
    let names = doc
        .resources_of_kind(kind)
        .into_iter()
        .filter(|entry| parent.is_none() || entry.parent == parent)
        .map(|entry| ResourceName::new(entry.name))
        .collect();
    ExistingResourceIndex { names }
}

/// Fetch the handle of an existing resource by case-insensitive name
pub fn find_existing<D: Document + ?Sized>(
    doc: &D,
    kind: ResourceKind,
    name: &ResourceName,
) -> Option<ElementId> {
    doc.resources_of_kind(kind)
        .into_iter()
        .find(|entry| name.matches(&entry.name))
        .map(|entry| entry.id)
}

/// All line styles (subcategories) directly under `category`, in document order
pub fn line_styles<D: Document + ?Sized>(doc: &D, category: ElementId) -> Vec<ResourceEntry> {
    doc.resources_of_kind(ResourceKind::Subcategory)
        .into_iter()
        .filter(|entry| entry.parent == Some(category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::InMemoryDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resource_name_case_insensitive() {
        assert_eq!(ResourceName::new("Beam"), ResourceName::new("BEAM"));
        assert!(ResourceName::new("beam").matches("bEaM"));
        assert_eq!(ResourceName::new("Beam").to_string(), "Beam");
    }

    #[test]
    fn test_desired_set_dedupes_first_spelling_wins() {
        let set = DesiredSet::new(["Beam", "Column", "BEAM", "beam"]);
        let names: Vec<_> = set.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["Beam", "Column"]);
    }

    #[test]
    fn test_scan_empty_document() {
        let doc = InMemoryDocument::new();
        assert!(scan_existing(&doc, ResourceKind::Family, None).is_empty());
    }

    #[test]
    fn test_scan_filters_by_parent() {
        let doc = InMemoryDocument::new()
            .with_category("Walls")
            .with_subcategory("Walls", "C1")
            .with_subcategory("Lines", "T1");
        let lines = doc.category("Lines").unwrap();
        let index = scan_existing(&doc, ResourceKind::Subcategory, Some(lines));
        assert!(index.contains(&"t1".into()));
        assert!(!index.contains(&"C1".into()));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_find_existing() {
        let doc = InMemoryDocument::new().with_family("Beam");
        assert!(find_existing(&doc, ResourceKind::Family, &"beam".into()).is_some());
        assert!(find_existing(&doc, ResourceKind::Family, &"Girder".into()).is_none());
    }

    #[test]
    fn test_line_styles_keeps_duplicates_across_categories_apart() {
        let doc = InMemoryDocument::new()
            .with_category("Walls")
            .with_subcategory("Lines", "C1")
            .with_subcategory("Walls", "C1");
        let lines = doc.category("Lines").unwrap();
        let styles = line_styles(&doc, lines);
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].parent, Some(lines));
    }
}

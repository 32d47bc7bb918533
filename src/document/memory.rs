//! In-memory project store
//!
//! A self-contained [`Document`] used by the CLI (persisted as a TOML project
//! file) and by tests. Rollback restores a snapshot taken when the unit began.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;

use super::{Color, Document, ElementId, LinePattern, ResourceEntry, ResourceKind, Segment};

/// Reserved identity of the built-in solid pattern
const SOLID_PATTERN_ID: ElementId = ElementId(1);

/// First identity handed out to created elements
const FIRST_ELEMENT_ID: u64 = 1000;

/// Category every fresh project starts with
const LINES_CATEGORY: &str = "Lines";

#[derive(Error, Debug)]
pub enum ProjectFileError {
    #[error("Failed to access project file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse project TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write project TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: ElementId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyRecord {
    pub id: ElementId,
    pub name: String,
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubcategoryRecord {
    pub id: ElementId,
    pub parent: ElementId,
    pub name: String,
    pub line_weight: Option<u8>,
    pub color: Option<Color>,
    pub pattern: Option<ElementId>,
}

/// Serializable contents of a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    #[serde(default)]
    pub families: Vec<FamilyRecord>,
    #[serde(default)]
    pub line_patterns: Vec<PatternRecord>,
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRecord>,
}

impl ProjectState {
    fn next_id(&self) -> ElementId {
        let max = self
            .categories
            .iter()
            .map(|c| c.id.0)
            .chain(self.families.iter().map(|f| f.id.0))
            .chain(self.line_patterns.iter().map(|p| p.id.0))
            .chain(self.subcategories.iter().map(|s| s.id.0))
            .max()
            .unwrap_or(0);
        ElementId(max.max(FIRST_ELEMENT_ID - 1) + 1)
    }
}

/// Failure to inject into an [`InMemoryDocument`]
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Reject loading the family file whose stem matches (case-insensitive)
    LoadFamily(String),
    /// Fail every line pattern creation
    CreatePattern,
    /// Fail creating a subcategory with this name
    CreateSubcategory(String),
    /// Fail the next commit, leaving the unit open
    Commit,
}

/// A project store held entirely in memory
#[derive(Debug)]
pub struct InMemoryDocument {
    state: ProjectState,
    open_unit: Option<(String, ProjectState)>,
    faults: Vec<Fault>,
    unit_labels: Vec<String>,
    loaded_paths: Vec<PathBuf>,
}

impl Default for InMemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocument {
    /// A fresh project holding only the `Lines` category
    pub fn new() -> Self {
        let mut state = ProjectState::default();
        state.categories.push(CategoryRecord {
            id: state.next_id(),
            name: LINES_CATEGORY.to_string(),
        });
        Self::from_state(state)
    }

    pub fn from_state(state: ProjectState) -> Self {
        Self {
            state,
            open_unit: None,
            faults: Vec::new(),
            unit_labels: Vec::new(),
            loaded_paths: Vec::new(),
        }
    }

    /// Load a project from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ProjectFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProjectFileError> {
        let state: ProjectState = toml::from_str(content)?;
        Ok(Self::from_state(state))
    }

    /// Serialize the committed state
    pub fn to_toml(&self) -> Result<String, ProjectFileError> {
        Ok(toml::to_string_pretty(&self.state)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ProjectFileError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    /// Add a top-level category, outside any unit
    pub fn with_category(mut self, name: &str) -> Self {
        let id = self.state.next_id();
        self.state.categories.push(CategoryRecord {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Add a family, outside any unit
    pub fn with_family(mut self, name: &str) -> Self {
        let id = self.state.next_id();
        self.state.families.push(FamilyRecord {
            id,
            name: name.to_string(),
            source: None,
        });
        self
    }

    /// Add a line pattern, outside any unit
    pub fn with_line_pattern(mut self, name: &str, segments: Vec<Segment>) -> Self {
        let id = self.state.next_id();
        self.state.line_patterns.push(PatternRecord {
            id,
            name: name.to_string(),
            segments,
        });
        self
    }

    /// Add a bare subcategory under the named category, outside any unit.
    /// Does nothing when the category is unknown.
    pub fn with_subcategory(mut self, category: &str, name: &str) -> Self {
        if let Some(parent) = self.category(category) {
            let id = self.state.next_id();
            self.state.subcategories.push(SubcategoryRecord {
                id,
                parent,
                name: name.to_string(),
                line_weight: None,
                color: None,
                pattern: None,
            });
        }
        self
    }

    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    pub fn has_open_unit(&self) -> bool {
        self.open_unit.is_some()
    }

    /// Labels of every unit begun so far, in order
    pub fn unit_labels(&self) -> &[String] {
        &self.unit_labels
    }

    /// Files passed to successful or failed family loads, in order
    pub fn loaded_paths(&self) -> &[PathBuf] {
        &self.loaded_paths
    }

    pub fn subcategory(&self, id: ElementId) -> Option<&SubcategoryRecord> {
        self.state.subcategories.iter().find(|s| s.id == id)
    }

    pub fn line_pattern(&self, id: ElementId) -> Option<&PatternRecord> {
        self.state.line_patterns.iter().find(|p| p.id == id)
    }

    fn require_unit(&self) -> Result<(), StoreError> {
        if self.open_unit.is_none() {
            return Err(StoreError::NoOpenUnit);
        }
        Ok(())
    }

    fn subcategory_mut(&mut self, id: ElementId) -> Result<&mut SubcategoryRecord, StoreError> {
        self.require_unit()?;
        self.state
            .subcategories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::MissingElement(id))
    }
}

impl Document for InMemoryDocument {
    fn resources_of_kind(&self, kind: ResourceKind) -> Vec<ResourceEntry> {
        match kind {
            ResourceKind::Family => self
                .state
                .families
                .iter()
                .map(|f| ResourceEntry {
                    name: f.name.clone(),
                    id: f.id,
                    parent: None,
                })
                .collect(),
            ResourceKind::LinePattern => self
                .state
                .line_patterns
                .iter()
                .map(|p| ResourceEntry {
                    name: p.name.clone(),
                    id: p.id,
                    parent: None,
                })
                .collect(),
            ResourceKind::Subcategory => self
                .state
                .subcategories
                .iter()
                .map(|s| ResourceEntry {
                    name: s.name.clone(),
                    id: s.id,
                    parent: Some(s.parent),
                })
                .collect(),
        }
    }

    fn category(&self, name: &str) -> Option<ElementId> {
        self.state
            .categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }

    fn solid_pattern_id(&self) -> ElementId {
        SOLID_PATTERN_ID
    }

    fn begin_unit(&mut self, label: &str) -> Result<(), StoreError> {
        if let Some((open, _)) = &self.open_unit {
            return Err(StoreError::UnitAlreadyOpen {
                label: open.clone(),
            });
        }
        self.unit_labels.push(label.to_string());
        self.open_unit = Some((label.to_string(), self.state.clone()));
        Ok(())
    }

    fn commit_unit(&mut self) -> Result<(), StoreError> {
        self.require_unit()?;
        if let Some(pos) = self.faults.iter().position(|f| *f == Fault::Commit) {
            self.faults.remove(pos);
            return Err(StoreError::Host("commit refused".to_string()));
        }
        self.open_unit = None;
        Ok(())
    }

    fn rollback_unit(&mut self) -> Result<(), StoreError> {
        let (_, snapshot) = self.open_unit.take().ok_or(StoreError::NoOpenUnit)?;
        self.state = snapshot;
        Ok(())
    }

    fn load_family(&mut self, path: &Path) -> Result<ElementId, StoreError> {
        self.require_unit()?;
        self.loaded_paths.push(path.to_path_buf());

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| StoreError::Rejected(format!("'{}' has no file name", path.display())))?;
        let rejected = self.faults.iter().any(|f| match f {
            Fault::LoadFamily(stem) => stem.to_lowercase() == name.to_lowercase(),
            _ => false,
        });
        if rejected {
            return Err(StoreError::Rejected(format!("'{name}' is corrupt or from a newer version")));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| StoreError::Rejected(format!("cannot read '{}': {e}", path.display())))?;
        if bytes.is_empty() {
            return Err(StoreError::Rejected(format!("'{}' is empty", path.display())));
        }
        let lowered = name.to_lowercase();
        if self.state.families.iter().any(|f| f.name.to_lowercase() == lowered) {
            return Err(StoreError::DuplicateName(name));
        }

        let id = self.state.next_id();
        self.state.families.push(FamilyRecord {
            id,
            name,
            source: Some(path.to_path_buf()),
        });
        Ok(id)
    }

    fn create_line_pattern(&mut self, pattern: &LinePattern) -> Result<ElementId, StoreError> {
        self.require_unit()?;
        if self.faults.contains(&Fault::CreatePattern) {
            return Err(StoreError::Host(format!(
                "cannot create line pattern '{}'",
                pattern.name()
            )));
        }
        if self.state.line_patterns.iter().any(|p| p.name == pattern.name()) {
            return Err(StoreError::DuplicateName(pattern.name().to_string()));
        }
        let id = self.state.next_id();
        self.state.line_patterns.push(PatternRecord {
            id,
            name: pattern.name().to_string(),
            segments: pattern.segments().to_vec(),
        });
        Ok(id)
    }

    fn create_subcategory(
        &mut self,
        parent: ElementId,
        name: &str,
    ) -> Result<ElementId, StoreError> {
        self.require_unit()?;
        if !self.state.categories.iter().any(|c| c.id == parent) {
            return Err(StoreError::MissingElement(parent));
        }
        if self.faults.contains(&Fault::CreateSubcategory(name.to_string())) {
            return Err(StoreError::Host(format!("cannot create subcategory '{name}'")));
        }
        let lowered = name.to_lowercase();
        if self
            .state
            .subcategories
            .iter()
            .any(|s| s.parent == parent && s.name.to_lowercase() == lowered)
        {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        let id = self.state.next_id();
        self.state.subcategories.push(SubcategoryRecord {
            id,
            parent,
            name: name.to_string(),
            line_weight: None,
            color: None,
            pattern: None,
        });
        Ok(id)
    }

    fn set_line_weight(&mut self, subcategory: ElementId, weight: u8) -> Result<(), StoreError> {
        if !(1..=16).contains(&weight) {
            return Err(StoreError::Host(format!("line weight {weight} is outside 1..=16")));
        }
        self.subcategory_mut(subcategory)?.line_weight = Some(weight);
        Ok(())
    }

    fn set_line_color(&mut self, subcategory: ElementId, color: Color) -> Result<(), StoreError> {
        self.subcategory_mut(subcategory)?.color = Some(color);
        Ok(())
    }

    fn set_line_pattern(
        &mut self,
        subcategory: ElementId,
        pattern: ElementId,
    ) -> Result<(), StoreError> {
        let known = pattern == SOLID_PATTERN_ID
            || self.state.line_patterns.iter().any(|p| p.id == pattern);
        if !known {
            return Err(StoreError::MissingElement(pattern));
        }
        self.subcategory_mut(subcategory)?.pattern = Some(pattern);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_project_has_lines_category() {
        let doc = InMemoryDocument::new();
        assert_eq!(doc.category("Lines"), Some(ElementId(FIRST_ELEMENT_ID)));
        assert!(doc.resources_of_kind(ResourceKind::Family).is_empty());
    }

    #[test]
    fn test_mutation_outside_unit_is_rejected() {
        let mut doc = InMemoryDocument::new();
        let lines = doc.category("Lines").unwrap();
        assert_eq!(
            doc.create_subcategory(lines, "C1"),
            Err(StoreError::NoOpenUnit)
        );
    }

    #[test]
    fn test_rollback_restores_snapshot() {
        let mut doc = InMemoryDocument::new().with_family("Beam");
        let before = doc.state().clone();
        let lines = doc.category("Lines").unwrap();
        doc.begin_unit("t").unwrap();
        doc.create_subcategory(lines, "C1").unwrap();
        doc.rollback_unit().unwrap();
        assert_eq!(doc.state(), &before);
        assert_eq!(doc.unit_labels().to_vec(), vec!["t".to_string()]);
    }

    #[test]
    fn test_project_toml_roundtrip_keeps_ids_monotonic() {
        let doc = InMemoryDocument::new()
            .with_family("Beam")
            .with_subcategory("Lines", "C1");
        let text = doc.to_toml().unwrap();
        let reloaded = InMemoryDocument::from_toml(&text).unwrap();
        assert_eq!(reloaded.state(), doc.state());
        assert!(reloaded.state().next_id() > ElementId(FIRST_ELEMENT_ID + 2));
    }

    #[test]
    fn test_parse_handwritten_project() {
        let text = r##"
[[categories]]
id = 1000
name = "Lines"

[[families]]
id = 1001
name = "Beam"

[[subcategories]]
id = 1002
parent = 1000
name = "C1"
line_weight = 8
color = "#ff0000"
pattern = 1
"##;
        let doc = InMemoryDocument::from_toml(text).expect("Should parse");
        let style = doc.subcategory(ElementId(1002)).unwrap();
        assert_eq!(style.color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.pattern, Some(SOLID_PATTERN_ID));
    }

    #[test]
    fn test_set_line_pattern_requires_known_pattern() {
        let mut doc = InMemoryDocument::new();
        let lines = doc.category("Lines").unwrap();
        doc.begin_unit("t").unwrap();
        let id = doc.create_subcategory(lines, "C1").unwrap();
        assert_eq!(
            doc.set_line_pattern(id, ElementId(77)),
            Err(StoreError::MissingElement(ElementId(77)))
        );
        assert!(doc.set_line_pattern(id, doc.solid_pattern_id()).is_ok());
    }
}

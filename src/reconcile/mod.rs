//! Reconciliation of desired resources against a document
//!
//! Two workflows share one result model but deliberately differ in how they
//! scope transactional units:
//!
//! - families are loaded one unit per item, so a bad file only fails itself
//! - line styles are created in a single unit, so any failure undoes the batch

mod families;
mod pattern;
mod styles;

pub use families::reconcile_families;
pub use pattern::{resolve_pattern, ResolvedPattern, SOLID_PATTERN_NAME};
pub use styles::{reconcile_styles, StyleAppearance};

use crate::catalog::ResourceName;
use crate::document::ElementId;
use crate::error::ReconcileError;

/// What happened to one desired name
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already in the document; nothing was changed
    AlreadyPresent(ElementId),
    /// Created or loaded by this call and committed
    Created(ElementId),
    Failed(ReconcileError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub name: ResourceName,
    pub outcome: Outcome,
}

/// Per-name outcomes of one reconciliation call, in desired order.
///
/// `batch_failure` is set when the call failed as a whole (pattern resolution
/// or a rolled-back style batch); names covered by it have no item entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    pub items: Vec<ItemOutcome>,
    pub batch_failure: Option<ReconcileError>,
}

impl ReconciliationResult {
    pub(crate) fn batch_failed(error: ReconcileError) -> Self {
        Self {
            items: Vec::new(),
            batch_failure: Some(error),
        }
    }

    pub(crate) fn push(&mut self, name: ResourceName, outcome: Outcome) {
        self.items.push(ItemOutcome { name, outcome });
    }

    /// Names now present in the document, with their handles
    pub fn loaded(&self) -> impl Iterator<Item = (&ResourceName, ElementId)> {
        self.items.iter().filter_map(|item| match item.outcome {
            Outcome::AlreadyPresent(id) | Outcome::Created(id) => Some((&item.name, id)),
            Outcome::Failed(_) => None,
        })
    }

    pub fn created(&self) -> impl Iterator<Item = &ResourceName> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::Created(_)))
            .map(|item| &item.name)
    }

    pub fn already_present(&self) -> impl Iterator<Item = &ResourceName> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::AlreadyPresent(_)))
            .map(|item| &item.name)
    }

    /// Per-item failures, excluding any batch failure
    pub fn failed(&self) -> impl Iterator<Item = (&ResourceName, &ReconcileError)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            Outcome::Failed(err) => Some((&item.name, err)),
            _ => None,
        })
    }

    /// True when every desired name is now present
    pub fn is_success(&self) -> bool {
        self.batch_failure.is_none() && self.failed().next().is_none()
    }

    /// Handle of a name, if it ended up present
    pub fn id_of(&self, name: &str) -> Option<ElementId> {
        self.loaded()
            .find(|(item, _)| item.matches(name))
            .map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_accessors() {
        let mut result = ReconciliationResult::default();
        result.push("A".into(), Outcome::AlreadyPresent(ElementId(1)));
        result.push("B".into(), Outcome::Created(ElementId(2)));
        result.push(
            "C".into(),
            Outcome::Failed(ReconcileError::NotFoundInDocument {
                name: "C".to_string(),
            }),
        );

        assert_eq!(result.loaded().count(), 2);
        assert_eq!(result.created().map(|n| n.as_str()).collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(result.already_present().count(), 1);
        assert_eq!(result.failed().count(), 1);
        assert_eq!(result.id_of("b"), Some(ElementId(2)));
        assert_eq!(result.id_of("c"), None);
        assert!(!result.is_success());
    }

    #[test]
    fn test_empty_result_is_success() {
        assert!(ReconciliationResult::default().is_success());
    }
}

//! Line style reconciliation: create missing subcategories of a category

use tracing::{debug, error, info, info_span};

use crate::catalog::{line_styles, scan_existing, DesiredSet, ResourceName};
use crate::document::{Color, Document, ElementId, ResourceKind, Segment, SegmentKind, Transaction};
use crate::error::{ReconcileError, StoreError};

use super::pattern::resolve_pattern;
use super::{Outcome, ReconciliationResult};

/// Visual attributes given to every newly created line style
#[derive(Debug, Clone, PartialEq)]
pub struct StyleAppearance {
    /// Projection line weight, 1..=16
    pub line_weight: u8,
    pub color: Color,
    /// Segments used when the requested pattern has to be created
    pub pattern_segments: Vec<Segment>,
}

impl Default for StyleAppearance {
    fn default() -> Self {
        Self {
            line_weight: 8,
            color: Color::rgb(255, 0, 0),
            pattern_segments: vec![
                Segment::new(SegmentKind::Dot, 0.0),
                Segment::new(SegmentKind::Space, 0.02),
                Segment::new(SegmentKind::Dash, 0.03),
                Segment::new(SegmentKind::Space, 0.02),
            ],
        }
    }
}

/// Make every desired line style present under `category`.
///
/// The pattern is resolved first; if that fails nothing else is attempted.
/// All missing styles are then created in one unit, so a failure on any of
/// them leaves none of them behind. Styles already under `category` are left
/// as they are.
pub fn reconcile_styles<D: Document + ?Sized>(
    doc: &mut D,
    desired: &DesiredSet,
    category: ElementId,
    pattern_name: &str,
    appearance: &StyleAppearance,
) -> ReconciliationResult {
    let span = info_span!(
        "reconcile_styles",
        %category,
        pattern = pattern_name,
        desired = desired.len()
    );
    let _enter = span.enter();

    let pattern = match resolve_pattern(doc, pattern_name, &appearance.pattern_segments) {
        Ok(pattern) => pattern.id(),
        Err(err) => return ReconciliationResult::batch_failed(err),
    };

    let existing = scan_existing(doc, ResourceKind::Subcategory, Some(category));
    let missing: Vec<&ResourceName> = desired
        .iter()
        .filter(|name| !existing.contains(name))
        .collect();

    let mut batch_failure = None;
    let created = if missing.is_empty() {
        Vec::new()
    } else {
        create_batch(doc, category, &missing, pattern, appearance).unwrap_or_else(|source| {
            error!(error = %source, pending = missing.len(), "line style batch rolled back");
            batch_failure = Some(ReconcileError::StyleBatchFailed {
                pending: missing.iter().map(|name| name.to_string()).collect(),
                source,
            });
            Vec::new()
        })
    };

    let styles = line_styles(doc, category);
    let mut created = created.into_iter();
    let mut result = ReconciliationResult {
        batch_failure,
        ..Default::default()
    };
    for name in desired.iter() {
        let outcome = if existing.contains(name) {
            match styles.iter().find(|entry| name.matches(&entry.name)) {
                Some(entry) => {
                    debug!(style = %name, id = %entry.id, "already in document");
                    Outcome::AlreadyPresent(entry.id)
                }
                None => Outcome::Failed(ReconcileError::NotFoundInDocument {
                    name: name.to_string(),
                }),
            }
        } else {
            // Names covered by a rolled-back batch only appear in the batch failure
            match created.next() {
                Some(id) => Outcome::Created(id),
                None => continue,
            }
        };
        result.push(name.clone(), outcome);
    }
    result
}

fn create_batch<D: Document + ?Sized>(
    doc: &mut D,
    category: ElementId,
    names: &[&ResourceName],
    pattern: ElementId,
    appearance: &StyleAppearance,
) -> Result<Vec<ElementId>, StoreError> {
    let mut tx = Transaction::start(doc, "Create Line Styles")?;
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id = tx.create_subcategory(category, name.as_str())?;
        tx.set_line_weight(id, appearance.line_weight)?;
        tx.set_line_color(id, appearance.color)?;
        tx.set_line_pattern(id, pattern)?;
        ids.push(id);
    }
    tx.commit()?;
    for (name, id) in names.iter().zip(&ids) {
        info!(style = %name, %id, "line style created");
    }
    Ok(ids)
}

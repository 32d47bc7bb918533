//! Line pattern resolution

use tracing::{debug, error, info};

use crate::document::{Document, ElementId, LinePattern, ResourceKind, Segment, Transaction};
use crate::error::{ReconcileError, StoreError};

/// Name that selects the host's built-in solid pattern
pub const SOLID_PATTERN_NAME: &str = "Solid";

/// Where the pattern a style will reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPattern {
    /// The built-in solid pattern; no scan or unit was needed
    Solid(ElementId),
    Existing(ElementId),
    Created(ElementId),
}

impl ResolvedPattern {
    pub fn id(self) -> ElementId {
        match self {
            Self::Solid(id) | Self::Existing(id) | Self::Created(id) => id,
        }
    }
}

/// Find the pattern named `name` (exact match) or create it from `segments`.
///
/// Creation runs in its own unit, committed before any style is touched.
pub fn resolve_pattern<D: Document + ?Sized>(
    doc: &mut D,
    name: &str,
    segments: &[Segment],
) -> Result<ResolvedPattern, ReconcileError> {
    if name == SOLID_PATTERN_NAME {
        return Ok(ResolvedPattern::Solid(doc.solid_pattern_id()));
    }

    if let Some(entry) = doc
        .resources_of_kind(ResourceKind::LinePattern)
        .into_iter()
        .find(|entry| entry.name == name)
    {
        debug!(pattern = name, id = %entry.id, "reusing line pattern");
        return Ok(ResolvedPattern::Existing(entry.id));
    }

    let created = LinePattern::new(name, segments.to_vec())
        .and_then(|pattern| create_in_unit(doc, &pattern));
    match created {
        Ok(id) => {
            info!(pattern = name, %id, "line pattern created");
            Ok(ResolvedPattern::Created(id))
        }
        Err(source) => {
            error!(pattern = name, error = %source, "line pattern could not be created");
            Err(ReconcileError::PatternResolutionFailed {
                name: name.to_string(),
                source,
            })
        }
    }
}

fn create_in_unit<D: Document + ?Sized>(
    doc: &mut D,
    pattern: &LinePattern,
) -> Result<ElementId, StoreError> {
    let mut tx = Transaction::start(doc, "Create Line Pattern")?;
    let id = tx.create_line_pattern(pattern)?;
    tx.commit()?;
    Ok(id)
}

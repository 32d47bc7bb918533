//! Host document adapter
//!
//! The reconciliation core never touches a global "current document". Every
//! operation receives a `&mut impl Document`, and all mutations happen inside a
//! [`Transaction`] guard that rolls back unless explicitly committed.

mod memory;
mod transaction;

pub use memory::{Fault, InMemoryDocument, ProjectFileError, ProjectState};
pub use transaction::Transaction;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Opaque handle to an element in the host document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resource collections the core knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Family,
    LinePattern,
    /// Subcategories of a category (line styles live under the `Lines` category)
    Subcategory,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Family => write!(f, "family"),
            ResourceKind::LinePattern => write!(f, "line pattern"),
            ResourceKind::Subcategory => write!(f, "subcategory"),
        }
    }
}

/// One row returned by [`Document::resources_of_kind`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEntry {
    pub name: String,
    pub id: ElementId,
    /// Direct parent category, for subcategories
    pub parent: Option<ElementId>,
}

/// RGB line color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn from_hex(value: &str) -> Result<Self, String> {
        let hex = value
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{value}' must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{value}' is not valid hex"));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(format!("color '{value}' must have 3 or 6 hex digits")),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| format!("color '{value}' is not valid hex"))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Kind of a line pattern segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Dash,
    Space,
    Dot,
}

/// One `(kind, length)` step of a line pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub length: f64,
}

impl Segment {
    pub const fn new(kind: SegmentKind, length: f64) -> Self {
        Self { kind, length }
    }
}

/// A validated, named line pattern definition
#[derive(Debug, Clone, PartialEq)]
pub struct LinePattern {
    name: String,
    segments: Vec<Segment>,
}

impl LinePattern {
    /// Build a pattern, rejecting segment lists the host would refuse.
    ///
    /// Segments must alternate between a drawn segment (dash or dot) and a
    /// space, starting with a drawn one. Dots have zero length; dashes and
    /// spaces have a positive finite length.
    pub fn new(name: impl Into<String>, segments: Vec<Segment>) -> Result<Self, StoreError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoreError::InvalidPattern("pattern name is empty".to_string()));
        }
        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPattern(format!(
                "'{name}' needs an even, non-zero number of segments, got {}",
                segments.len()
            )));
        }
        for (i, seg) in segments.iter().enumerate() {
            let expects_space = i % 2 == 1;
            if expects_space != (seg.kind == SegmentKind::Space) {
                return Err(StoreError::InvalidPattern(format!(
                    "'{name}' segment {i} must be {}",
                    if expects_space { "a space" } else { "a dash or dot" }
                )));
            }
            let valid_length = match seg.kind {
                SegmentKind::Dot => seg.length == 0.0,
                SegmentKind::Dash | SegmentKind::Space => {
                    seg.length.is_finite() && seg.length > 0.0
                }
            };
            if !valid_length {
                return Err(StoreError::InvalidPattern(format!(
                    "'{name}' segment {i} has invalid length {}",
                    seg.length
                )));
            }
        }
        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// The narrow interface to the host project store.
///
/// Queries are non-mutating. Mutating calls are only valid between
/// [`begin_unit`](Document::begin_unit) and a matching commit or rollback;
/// units do not nest. Callers should go through [`Transaction`] rather than
/// pairing these calls by hand.
pub trait Document {
    /// All resources of `kind` currently in the document
    fn resources_of_kind(&self, kind: ResourceKind) -> Vec<ResourceEntry>;

    /// Look up a top-level category by name
    fn category(&self, name: &str) -> Option<ElementId>;

    /// Identity of the built-in solid line pattern
    fn solid_pattern_id(&self) -> ElementId;

    fn begin_unit(&mut self, label: &str) -> Result<(), StoreError>;
    fn commit_unit(&mut self) -> Result<(), StoreError>;
    fn rollback_unit(&mut self) -> Result<(), StoreError>;

    /// Load a family definition file into the document
    fn load_family(&mut self, path: &Path) -> Result<ElementId, StoreError>;

    fn create_line_pattern(&mut self, pattern: &LinePattern) -> Result<ElementId, StoreError>;

    fn create_subcategory(&mut self, parent: ElementId, name: &str)
        -> Result<ElementId, StoreError>;

    fn set_line_weight(&mut self, subcategory: ElementId, weight: u8) -> Result<(), StoreError>;

    fn set_line_color(&mut self, subcategory: ElementId, color: Color) -> Result<(), StoreError>;

    fn set_line_pattern(
        &mut self,
        subcategory: ElementId,
        pattern: ElementId,
    ) -> Result<(), StoreError>;
}

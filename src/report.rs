//! Failure aggregation
//!
//! Turns a [`ReconciliationResult`] into a flat summary for whatever front end
//! displays it. Every failure is listed, grouped by kind.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{FailureKind, ReconcileError};
use crate::reconcile::ReconciliationResult;

/// One failed name (or batch) in a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub name: String,
    pub kind: FailureKind,
    pub detail: String,
}

/// Summary of one or more reconciliation calls
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub created: Vec<String>,
    pub already_present: Vec<String>,
    /// Ordered by kind, then by desired order within a kind
    pub failures: Vec<ReportEntry>,
}

/// Summarize a result. Never fails.
pub fn aggregate(result: &ReconciliationResult) -> Report {
    let mut failures: Vec<ReportEntry> = result
        .failed()
        .map(|(name, err)| entry(name.to_string(), err))
        .collect();
    if let Some(err) = &result.batch_failure {
        failures.push(entry(batch_subject(err), err));
    }
    failures.sort_by_key(|e| e.kind);

    Report {
        created: result.created().map(|n| n.to_string()).collect(),
        already_present: result.already_present().map(|n| n.to_string()).collect(),
        failures,
    }
}

fn entry(name: String, err: &ReconcileError) -> ReportEntry {
    ReportEntry {
        name,
        kind: err.kind(),
        detail: err.to_string(),
    }
}

fn batch_subject(err: &ReconcileError) -> String {
    match err {
        ReconcileError::PatternResolutionFailed { name, .. } => name.clone(),
        ReconcileError::StyleBatchFailed { pending, .. } => pending.join(", "),
        _ => "*".to_string(),
    }
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn by_kind(&self) -> BTreeMap<FailureKind, Vec<&ReportEntry>> {
        let mut groups: BTreeMap<FailureKind, Vec<&ReportEntry>> = BTreeMap::new();
        for failure in &self.failures {
            groups.entry(failure.kind).or_default().push(failure);
        }
        groups
    }

    /// Append another report, keeping failures grouped by kind
    pub fn merge(&mut self, other: Report) {
        self.created.extend(other.created);
        self.already_present.extend(other.already_present);
        self.failures.extend(other.failures);
        self.failures.sort_by_key(|e| e.kind);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(names: &[String]) -> String {
            if names.is_empty() {
                "-".to_string()
            } else {
                names.join(", ")
            }
        }

        writeln!(f, "created: {}", list(&self.created))?;
        writeln!(f, "already present: {}", list(&self.already_present))?;
        if self.failures.is_empty() {
            return write!(f, "failures: none");
        }
        write!(f, "failures:")?;
        for failure in &self.failures {
            write!(f, "\n  [{}] {}: {}", failure.kind, failure.name, failure.detail)?;
        }
        Ok(())
    }
}

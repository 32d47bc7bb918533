//! Scoped transactional unit

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::error::StoreError;

use super::Document;

/// An open transactional unit on a document.
///
/// Dropping the guard without calling [`commit`](Transaction::commit) rolls the
/// unit back, so every early return and `?` leaves the document untouched.
/// While the guard is alive the document is reachable only through it.
pub struct Transaction<'d, D: Document + ?Sized> {
    doc: &'d mut D,
    label: String,
    finished: bool,
}

impl<'d, D: Document + ?Sized> Transaction<'d, D> {
    /// Begin a unit labelled `label`
    pub fn start(doc: &'d mut D, label: impl Into<String>) -> Result<Self, StoreError> {
        let label = label.into();
        doc.begin_unit(&label)?;
        debug!(%label, "transaction started");
        Ok(Self {
            doc,
            label,
            finished: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Commit the unit. If the store refuses the commit, the unit is rolled back.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.doc.commit_unit()?;
        self.finished = true;
        debug!(label = %self.label, "transaction committed");
        Ok(())
    }

    /// Roll the unit back explicitly
    pub fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        warn!(label = %self.label, "transaction rolled back");
        self.doc.rollback_unit()
    }
}

impl<D: Document + ?Sized> Deref for Transaction<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.doc
    }
}

impl<D: Document + ?Sized> DerefMut for Transaction<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.doc
    }
}

impl<D: Document + ?Sized> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(label = %self.label, "transaction dropped without commit, rolling back");
        if let Err(e) = self.doc.rollback_unit() {
            warn!(label = %self.label, error = %e, "rollback failed");
        }
    }
}

//! Record operations: each one reads the whole document, changes it in memory,
//! and writes the whole document back.

use crate::error::{Error, Result};
use crate::record::{Action, Document, Record};
use crate::store::ReplicatedStore;
use tracing::debug;

/// The question board, on top of a [`ReplicatedStore`].
#[derive(Debug, Clone)]
pub struct Board {
    store: ReplicatedStore,
}

impl Board {
    /// Board backed by `store`.
    pub fn new(store: ReplicatedStore) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &ReplicatedStore {
        &self.store
    }

    /// Every record, newest first, hidden ones included.
    pub async fn list(&self) -> Result<Document> {
        self.store.read().await
    }

    /// Add a record with `text` at the front of the board.
    ///
    /// Blank text is rejected before storage is touched.
    pub async fn create(&self, text: &str) -> Result<Record> {
        let record = Record::new(text)?;
        let mut doc = self.store.read().await?;
        prepend(&mut doc, record.clone());
        self.store.write(&doc).await?;
        debug!(id = %record.id, "record created");
        Ok(record)
    }

    /// Apply the named action to the record with `id` and return it.
    ///
    /// Nothing is written when the id is unknown or the action isn't
    /// recognized.
    pub async fn mutate(&self, id: &str, action: &str) -> Result<Record> {
        let mut doc = self.store.read().await?;
        let row = mutate(&mut doc, id, action)?;
        self.store.write(&doc).await?;
        debug!(id, action, "record mutated");
        Ok(row)
    }

    /// Remove the record with `id`. An unknown or missing id is not an error;
    /// the document is read and written back either way.
    pub async fn delete(&self, id: Option<&str>) -> Result<()> {
        let mut doc = self.store.read().await?;
        let removed = id.is_some_and(|id| remove(&mut doc, id));
        self.store.write(&doc).await?;
        debug!(?id, removed, "record deleted");
        Ok(())
    }

    /// Drop every record.
    pub async fn delete_all(&self) -> Result<()> {
        let mut doc = self.store.read().await?;
        let dropped = doc.len();
        doc.clear();
        self.store.write(&doc).await?;
        debug!(dropped, "board cleared");
        Ok(())
    }
}

/// Put `record` at the front of `doc`.
pub fn prepend(doc: &mut Document, record: Record) {
    doc.insert(0, record);
}

/// Find the record with `id` and apply `action` to it, returning the updated
/// copy. `doc` is left untouched on error.
pub fn mutate(doc: &mut Document, id: &str, action: &str) -> Result<Record> {
    let row = doc
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| Error::NotFound(id.to_owned()))?;
    row.apply(Action::parse(action)?);
    Ok(row.clone())
}

/// Remove every record with `id`. Returns whether anything was removed.
pub fn remove(doc: &mut Document, id: &str) -> bool {
    let before = doc.len();
    doc.retain(|r| r.id != id);
    doc.len() != before
}

//! The replicated document store: primary/backup reads with read-repair, and
//! dual writes that succeed when either replica accepts them.

use crate::error::{Error, Result};
use crate::record::{Document, Record};
use crate::replica::{MemoryReplica, Replica};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whole-document store replicated over a primary and a backup.
///
/// Consistency is eventual: a write that lands on only one replica is still a
/// success, and a primary that missed it gets healed the next time a read has
/// to fall back to the backup. Concurrent read-modify-write cycles can lose
/// updates (last write wins per replica).
#[derive(Debug, Clone)]
pub struct ReplicatedStore {
    primary: Arc<dyn Replica>,
    backup: Arc<dyn Replica>,
}

impl ReplicatedStore {
    /// Store over the given replicas.
    pub fn new(primary: Arc<dyn Replica>, backup: Arc<dyn Replica>) -> Self {
        Self { primary, backup }
    }

    /// Store over two fresh in-memory replicas.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryReplica::new("primary")),
            Arc::new(MemoryReplica::new("backup")),
        )
    }

    /// Start configuring a new store.
    pub fn builder() -> ReplicatedStoreBuilder {
        ReplicatedStoreBuilder::default()
    }

    /// The primary replica.
    pub fn primary(&self) -> &Arc<dyn Replica> {
        &self.primary
    }

    /// The backup replica.
    pub fn backup(&self) -> &Arc<dyn Replica> {
        &self.backup
    }

    /// Fetch the document.
    ///
    /// Tries the primary first. If it fails, returns the backup's copy and
    /// spawns a detached task that overwrites the primary with it; that heal
    /// never reports back to the caller. Fails with [`Error::ReadFailure`]
    /// only when both replicas fail.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn read(&self) -> Result<Document> {
        let primary_err = match self.primary.get().await {
            Ok(doc) => return Ok(doc),
            Err(err) => err,
        };
        warn!(replica = self.primary.name(), %primary_err, "read failed, falling back");

        match self.backup.get().await {
            Ok(doc) => {
                self.heal_primary(doc.clone());
                Ok(doc)
            }
            Err(backup_err) => {
                warn!(replica = self.backup.name(), %backup_err, "read failed");
                Err(Error::ReadFailure(format!(
                    "{}: {primary_err}; {}: {backup_err}",
                    self.primary.name(),
                    self.backup.name()
                )))
            }
        }
    }

    /// Overwrite both replicas with `doc`.
    ///
    /// Both writes run concurrently and this waits for both to settle.
    /// Succeeds if at least one lands; fails with [`Error::WriteFailure`] only
    /// when both are rejected.
    pub async fn write(&self, doc: &[Record]) -> Result<()> {
        let (primary, backup) = tokio::join!(self.primary.put(doc), self.backup.put(doc));
        match (primary, backup) {
            (Ok(()), Ok(())) => {
                debug!(records = doc.len(), "document written to both replicas");
                Ok(())
            }
            (Err(err), Ok(())) => {
                warn!(replica = self.primary.name(), %err, "write failed, other replica accepted");
                Ok(())
            }
            (Ok(()), Err(err)) => {
                warn!(replica = self.backup.name(), %err, "write failed, other replica accepted");
                Ok(())
            }
            (Err(primary_err), Err(backup_err)) => {
                warn!(%primary_err, %backup_err, "write failed on every replica");
                Err(Error::WriteFailure(format!(
                    "{}: {primary_err}; {}: {backup_err}",
                    self.primary.name(),
                    self.backup.name()
                )))
            }
        }
    }

    fn heal_primary(&self, doc: Document) {
        let primary = Arc::clone(&self.primary);
        tokio::spawn(async move {
            match primary.put(&doc).await {
                Ok(()) => info!(replica = primary.name(), records = doc.len(), "healed from backup"),
                Err(err) => warn!(replica = primary.name(), %err, "heal failed"),
            }
        });
    }
}

/// Configures a [`ReplicatedStore`]. Unset replicas default to in-memory ones.
///
/// ```rust
/// use qboard::replica::{FileReplica, MemoryReplica};
/// use qboard::ReplicatedStore;
/// use std::sync::Arc;
///
/// let store = ReplicatedStore::builder()
///     .primary(Arc::new(FileReplica::new("primary", "board.json")))
///     .backup(Arc::new(MemoryReplica::new("backup")))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ReplicatedStoreBuilder {
    primary: Option<Arc<dyn Replica>>,
    backup: Option<Arc<dyn Replica>>,
}

impl ReplicatedStoreBuilder {
    /// Set the replica reads go to first.
    pub fn primary(mut self, replica: Arc<dyn Replica>) -> Self {
        self.primary = Some(replica);
        self
    }

    /// Set the fallback replica.
    pub fn backup(mut self, replica: Arc<dyn Replica>) -> Self {
        self.backup = Some(replica);
        self
    }

    /// Finish building.
    pub fn build(self) -> ReplicatedStore {
        ReplicatedStore {
            primary: self
                .primary
                .unwrap_or_else(|| Arc::new(MemoryReplica::new("primary"))),
            backup: self
                .backup
                .unwrap_or_else(|| Arc::new(MemoryReplica::new("backup"))),
        }
    }
}

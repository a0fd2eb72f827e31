//! Pluggable replica backends.
//!
//! Implement [`Replica`] to keep a copy of the document somewhere new. The
//! store only ever fetches or overwrites the whole document, so that is all a
//! replica has to support.

use crate::error::{Error, Result};
use crate::persist::{atomic_write, load};
use crate::record::{Document, Record};
use crate::serializer::{JsonSerializer, Serializer};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One full copy of the document.
///
/// Both calls are single-shot: no retries, no backoff. Retrying (or not) is
/// the caller's decision.
#[async_trait]
pub trait Replica: Send + Sync + std::fmt::Debug {
    /// Label used in logs (`primary`, `backup`, ...).
    fn name(&self) -> &str;

    /// Fetch the whole document.
    async fn get(&self) -> Result<Document>;

    /// Unconditionally overwrite the whole document.
    async fn put(&self, doc: &[Record]) -> Result<()>;
}

// ---- HTTP --------------------------------------------------------------------

/// A document behind a plain GET/PUT blob endpoint.
#[derive(Debug, Clone)]
pub struct HttpReplica {
    name: String,
    url: reqwest::Url,
    client: reqwest::Client,
    serializer: JsonSerializer,
}

impl HttpReplica {
    /// Replica at `url` with the client's default timeouts.
    pub fn new(name: impl Into<String>, url: &str) -> Result<Self> {
        Self::with_client(name, url, reqwest::Client::new())
    }

    /// Replica at `url` whose requests give up after `timeout`.
    pub fn with_timeout(name: impl Into<String>, url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(name, url, client)
    }

    /// Replica at `url` sharing an existing client (and its connection pool).
    pub fn with_client(name: impl Into<String>, url: &str, client: reqwest::Client) -> Result<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::Config(format!("invalid replica url {url:?}: {e}")))?;
        Ok(Self {
            name: name.into(),
            url,
            client,
            serializer: JsonSerializer::new(),
        })
    }

    /// Use `serializer` for request bodies.
    pub fn serializer(mut self, serializer: JsonSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Endpoint this replica talks to.
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

#[async_trait]
impl Replica for HttpReplica {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self) -> Result<Document> {
        let bytes = self
            .client
            .get(self.url.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        self.serializer.deserialize(&bytes)
    }

    async fn put(&self, doc: &[Record]) -> Result<()> {
        let body = self.serializer.serialize(doc)?;
        self.client
            .put(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

// ---- File --------------------------------------------------------------------

/// A document kept as a JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileReplica {
    name: String,
    path: PathBuf,
    serializer: JsonSerializer,
}

impl FileReplica {
    /// Replica stored at `path`. The file is created on first write.
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            serializer: JsonSerializer::new(),
        }
    }

    /// Use `serializer` when writing the file.
    pub fn serializer(mut self, serializer: JsonSerializer) -> Self {
        self.serializer = serializer;
        self
    }

    /// Path to the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Replica for FileReplica {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self) -> Result<Document> {
        load(&self.path, &self.serializer).await
    }

    async fn put(&self, doc: &[Record]) -> Result<()> {
        let bytes = self.serializer.serialize(doc)?;
        atomic_write(&self.path, &bytes).await
    }
}

// ---- Memory ------------------------------------------------------------------

/// Which calls an in-memory replica should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Healthy.
    #[default]
    None,
    /// `get` fails, `put` works.
    Reads,
    /// `put` fails, `get` works.
    Writes,
    /// Everything fails, as if the endpoint were down.
    All,
}

/// A document held in process memory, with switchable failures.
///
/// Handy for tests and for running the server without any storage at all.
#[derive(Debug, Default)]
pub struct MemoryReplica {
    name: String,
    doc: RwLock<Document>,
    fault: RwLock<Fault>,
    writes: AtomicUsize,
}

impl MemoryReplica {
    /// Empty, healthy replica.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Healthy replica pre-loaded with `doc`.
    pub fn with_document(name: impl Into<String>, doc: Document) -> Self {
        Self {
            name: name.into(),
            doc: RwLock::new(doc),
            ..Self::default()
        }
    }

    /// Switch which calls fail from now on.
    pub fn inject(&self, fault: Fault) {
        *self.fault.write() = fault;
    }

    /// Current contents, bypassing any injected fault.
    pub fn snapshot(&self) -> Document {
        self.doc.read().clone()
    }

    /// Number of successful `put` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn fault(&self) -> Fault {
        *self.fault.read()
    }
}

#[async_trait]
impl Replica for MemoryReplica {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self) -> Result<Document> {
        if matches!(self.fault(), Fault::Reads | Fault::All) {
            return Err(Error::Io(format!("{} is unavailable for reads", self.name)));
        }
        Ok(self.snapshot())
    }

    async fn put(&self, doc: &[Record]) -> Result<()> {
        if matches!(self.fault(), Fault::Writes | Fault::All) {
            return Err(Error::Io(format!("{} is unavailable for writes", self.name)));
        }
        *self.doc.write() = doc.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_replica_faults() {
        let r = MemoryReplica::new("m");
        let doc = vec![Record::new("x").unwrap()];
        r.put(&doc).await.unwrap();
        assert_eq!(r.get().await.unwrap(), doc);

        r.inject(Fault::Reads);
        assert!(r.get().await.is_err());
        r.put(&[]).await.unwrap();

        r.inject(Fault::Writes);
        assert!(r.get().await.unwrap().is_empty());
        assert!(r.put(&doc).await.is_err());

        r.inject(Fault::All);
        assert!(r.get().await.is_err());
        assert!(r.put(&doc).await.is_err());
        assert_eq!(r.writes(), 2);
    }

    #[test]
    fn http_replica_rejects_bad_url() {
        assert!(matches!(
            HttpReplica::new("primary", "not a url"),
            Err(Error::Config(_))
        ));
    }
}

//! In-memory backend for dry runs and tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::Storage;
use crate::{Error, Result};

/// Holds documents in a map. Revisions are the SHA-256 of the content.
#[derive(Default)]
pub struct MemoryStorage {
    base_path: String,
    documents: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Names of every stored document, sorted.
    pub fn names(&self) -> Vec<String> {
        self.documents.lock().keys().cloned().collect()
    }

    /// Replace a document without counting it as a write.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.documents.lock().insert(name.into(), bytes.into());
    }

    pub fn remove(&self, name: &str) -> Option<Vec<u8>> {
        self.documents.lock().remove(name)
    }
}

impl Storage for MemoryStorage {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.documents.lock().get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.documents.lock().insert(name.to_string(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn revision(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .documents
            .lock()
            .get(name)
            .map(|bytes| repo_fs::compute_content_checksum(bytes)))
    }

    fn write_if(&self, name: &str, bytes: &[u8], expected: Option<&str>) -> Result<()> {
        let mut documents = self.documents.lock();
        let current = documents
            .get(name)
            .map(|bytes| repo_fs::compute_content_checksum(bytes));
        if current.as_deref() != expected {
            return Err(Error::Conflict {
                name: name.to_string(),
            });
        }

        documents.insert(name.to_string(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

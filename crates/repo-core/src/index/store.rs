//! Typed document access on top of a [`Storage`] backend

use repo_meta::Repository;

use super::address::{ROOT_NAME, canonical_bytes, content_hash, resolve};
use crate::storage::Storage;
use crate::{Error, Result};

/// Reads and writes index documents by logical name.
pub struct DocumentStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> DocumentStore<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// The published root. Absent or malformed roots are consistency errors.
    pub fn read_root(&self) -> Result<Repository> {
        let bytes = self
            .storage
            .read(ROOT_NAME)?
            .ok_or_else(|| Error::consistency(format!("{ROOT_NAME} does not exist; run generate first")))?;
        parse(ROOT_NAME, &bytes)
    }

    /// The shard `template` resolved with `hash`.
    ///
    /// Fails when the shard is missing or its content does not hash to `hash`.
    pub fn read_named(&self, template: &str, hash: &str) -> Result<Repository> {
        let name = resolve(template, hash);
        let bytes = self
            .storage
            .read(&name)?
            .ok_or_else(|| Error::consistency(format!("{name} is referenced but does not exist")))?;

        let actual = content_hash(&bytes);
        if actual != hash {
            return Err(Error::consistency(format!(
                "{name} hashes to {actual}, expected {hash}"
            )));
        }
        parse(&name, &bytes)
    }

    /// Persist a shard under `template` and return its content hash.
    pub fn write_named(&self, template: &str, document: &Repository) -> Result<String> {
        let bytes = canonical_bytes(document)?;
        let hash = content_hash(&bytes);
        let name = resolve(template, &hash);

        tracing::debug!("Writing {}", name);
        self.storage.write(&name, &bytes)?;
        Ok(hash)
    }

    /// Current root revision, captured before any work starts.
    pub fn root_revision(&self) -> Result<Option<String>> {
        self.storage.revision(ROOT_NAME)
    }

    /// Persist the root if it is still at `expected`.
    pub fn write_root(&self, document: &Repository, expected: Option<&str>) -> Result<()> {
        let bytes = canonical_bytes(document)?;
        tracing::info!("Writing {}", ROOT_NAME);
        self.storage.write_if(ROOT_NAME, &bytes, expected)
    }
}

fn parse(name: &str, bytes: &[u8]) -> Result<Repository> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::consistency(format!("{name} is not a valid index document: {e}")))
}

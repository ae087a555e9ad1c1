//! Storage backends
//!
//! A backend persists named byte blobs. Names are relative, forward-slash
//! logical paths such as `packages.json` or `p/acme/widget$<hash>.json`.

mod azure;
mod file;
mod memory;

pub use azure::AzureBlobStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use repo_meta::OutputConfig;

use crate::Result;

/// Trait for byte-level document persistence.
///
/// Revisions are opaque tokens that change whenever a document's content
/// changes. They back the optimistic precondition on the root document.
pub trait Storage: Send + Sync {
    /// URL prefix under which the published documents are served.
    fn base_path(&self) -> &str;

    /// Read a document, `None` when it does not exist.
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Write a document unconditionally.
    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Current revision of a document, `None` when it does not exist.
    fn revision(&self, name: &str) -> Result<Option<String>>;

    /// Write a document only if its current revision is `expected`.
    ///
    /// `None` requires the document to be absent. Fails with
    /// [`Error::Conflict`](crate::Error::Conflict) otherwise.
    fn write_if(&self, name: &str, bytes: &[u8], expected: Option<&str>) -> Result<()>;
}

/// Build the storage backend declared in the configuration.
pub fn from_config(config: &OutputConfig) -> Result<Box<dyn Storage>> {
    Ok(match config {
        OutputConfig::File(file) => Box::new(FileStorage::new(&file.dir, file.base_path.clone())),
        OutputConfig::Azure(azure) => Box::new(AzureBlobStorage::from_config(azure)?),
        OutputConfig::Memory(memory) => Box::new(MemoryStorage::new(memory.base_path.clone())),
    })
}

//! Local directory backend

use std::path::Path;

use repo_fs::{NormalizedPath, Precondition, RobustnessConfig, io, validate_relative_name};

use super::Storage;
use crate::{Error, Result};

/// Publishes documents as files under a directory.
///
/// Writes are atomic (temp file then rename). Conditional writes of the root
/// are serialized through a short-lived sidecar lock that is removed once the
/// write lands. Revisions are the SHA-256 of the file content.
pub struct FileStorage {
    root: NormalizedPath,
    base_path: String,
    robustness: RobustnessConfig,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, base_path: impl Into<String>) -> Self {
        Self {
            root: NormalizedPath::new(dir.as_ref()),
            base_path: base_path.into(),
            robustness: RobustnessConfig::default(),
        }
    }

    /// Override lock and fsync behaviour.
    pub fn with_robustness(mut self, robustness: RobustnessConfig) -> Self {
        self.robustness = robustness;
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    fn path(&self, name: &str) -> Result<NormalizedPath> {
        validate_relative_name(name)?;
        Ok(self.root.join(name))
    }
}

impl Storage for FileStorage {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(name)?;
        tracing::debug!("Reading {}", path);
        io::read_bytes(&path).map_err(|e| Error::StorageRead {
            name: name.to_string(),
            message: e.to_string(),
        })
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.write_if_inner(name, bytes, Precondition::Any)
    }

    fn revision(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .read(name)?
            .map(|bytes| repo_fs::compute_content_checksum(&bytes)))
    }

    fn write_if(&self, name: &str, bytes: &[u8], expected: Option<&str>) -> Result<()> {
        let precondition = match expected {
            Some(checksum) => Precondition::Checksum(checksum),
            None => Precondition::Absent,
        };
        self.write_if_inner(name, bytes, precondition)
    }
}

impl FileStorage {
    fn write_if_inner(&self, name: &str, bytes: &[u8], precondition: Precondition<'_>) -> Result<()> {
        let path = self.path(name)?;
        tracing::debug!("Writing {}", path);
        io::write_atomic_if(&path, bytes, self.robustness, precondition).map_err(|e| match e {
            repo_fs::Error::PreconditionFailed { .. } => Error::Conflict {
                name: name.to_string(),
            },
            other => Error::StorageWrite {
                name: name.to_string(),
                message: other.to_string(),
            },
        })
    }
}

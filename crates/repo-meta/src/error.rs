//! Error types for repo-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] repo_fs::Error),

    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Invalid package {name:?}: {message}")]
    InvalidPackage { name: String, message: String },

    #[error("Invalid source id {id:?}: {message}")]
    InvalidSourceId { id: String, message: String },

    #[error("Invalid transformer #{index}: {message}")]
    InvalidTransform { index: usize, message: String },
}

//! Error types for repo-core

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, updating or verifying an index
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source adapter call failed upstream
    #[error("Source {source_id} failed: {message}")]
    SourceFetch { source_id: String, message: String },

    #[error("Failed to read {name}: {message}")]
    StorageRead { name: String, message: String },

    #[error("Failed to write {name}: {message}")]
    StorageWrite { name: String, message: String },

    /// The document changed since it was read
    #[error("{name} was modified concurrently; re-run the operation")]
    Conflict { name: String },

    /// A requested source is not configured
    #[error("Unknown source {source_id:?}")]
    UnknownSource { source_id: String },

    #[error("Package {name:?} is provided by both {first:?} and {second:?}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid package {name:?}: {message}")]
    InvalidPackage { name: String, message: String },

    /// The published index is missing, malformed, or does not match the request
    #[error("Index consistency error: {message}")]
    Consistency { message: String },

    #[error("Transform failed: {message}")]
    Transform { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid package reference {input:?}, expected <source>:<package>")]
    InvalidPackageRef { input: String },

    // Transparent wrappers for underlying crate errors
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    #[error(transparent)]
    Meta(repo_meta::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }

    /// Whether this error means the index or the request is inconsistent,
    /// as opposed to an I/O or upstream failure.
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Error::UnknownSource { .. }
                | Error::NameCollision { .. }
                | Error::InvalidPackage { .. }
                | Error::Consistency { .. }
        )
    }
}

/// Package validation failures keep their own variant so they count as
/// consistency errors.
impl From<repo_meta::Error> for Error {
    fn from(err: repo_meta::Error) -> Self {
        match err {
            repo_meta::Error::InvalidPackage { name, message } => {
                Error::InvalidPackage { name, message }
            }
            other => Error::Meta(other),
        }
    }
}

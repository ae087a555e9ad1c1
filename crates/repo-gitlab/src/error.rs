//! Error types for repo-gitlab

/// Result type for repo-gitlab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to GitLab
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid GitLab URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitLab returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Malformed composer.json in {project} at {reference}: {message}")]
    Manifest {
        project: String,
        reference: String,
        message: String,
    },
}

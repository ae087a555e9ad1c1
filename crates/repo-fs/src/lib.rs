//! Filesystem primitives for the Composer repository generator
//!
//! Provides normalized path handling, locked atomic writes with optional
//! content preconditions, SHA-256 checksums and format-agnostic config loading.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::compute_content_checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::{Precondition, RobustnessConfig};
pub use path::{NormalizedPath, validate_relative_name};

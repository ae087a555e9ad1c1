//! Repository index engine
//!
//! This crate aggregates package metadata from configured sources and
//! publishes it as a static, content-addressed Composer repository:
//!
//! - **Sources**: upstream package enumeration ([`Source`])
//! - **Transforms**: ordered per-package rewrites and exclusions ([`Transform`])
//! - **Storage**: byte-level persistence with an optimistic root precondition ([`Storage`])
//! - **IndexEngine**: full generation, incremental updates and verification
//!
//! # Architecture
//!
//! ```text
//!                    repoctl
//!                       |
//!                   repo-core
//!                       |
//!        +--------------+--------------+
//!        |              |              |
//!     repo-fs       repo-meta     repo-gitlab
//! ```
//!
//! # Example
//!
//! ```no_run
//! use repo_core::{IndexEngine, IndexOptions, MemoryStorage, StaticSource};
//! use repo_meta::Packages;
//!
//! fn example() -> repo_core::Result<()> {
//!     let engine = IndexEngine::new(Box::new(MemoryStorage::new("")), IndexOptions::default())
//!         .with_source(Box::new(StaticSource::new("local", Packages::new())));
//!     let report = engine.generate()?;
//!     println!("{} packages", report.packages);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod index;
pub mod source;
pub mod storage;
pub mod transform;

pub use error::{Error, Result};
pub use index::{
    DocumentStore, GenerateReport, IndexEngine, IndexOptions, PackageRef, UpdateReport,
    VerifyReport, VerifyStatus,
};
pub use source::{GitLabSource, Source, StaticSource};
pub use storage::{AzureBlobStorage, FileStorage, MemoryStorage, Storage};
pub use transform::{Exclude, SetFields, Transform};

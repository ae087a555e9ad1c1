//! Published document schemas
//!
//! - [`package`]: a single version's Composer manifest
//! - [`repository`]: root and shard index documents

pub mod package;
pub mod repository;

pub use package::{ArchiveOptions, Author, Dist, Package, PackageLink, Source, Support};
pub use repository::{PackageVersions, Packages, Reference, Repository};

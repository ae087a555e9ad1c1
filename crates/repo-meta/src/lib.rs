//! Package metadata and configuration for the Composer repository generator.
//!
//! This crate holds the published data model (package manifests and
//! repository index documents), the invariants every persisted package must
//! satisfy, and the configuration schema consumed by `repoctl`.

pub mod config;
pub mod error;
pub mod schema;
pub mod validation;

pub use config::{
    AzureOutputConfig, Config, FileOutputConfig, GitLabInputConfig, InputConfig,
    MemoryOutputConfig, OutputConfig, PROTECTED_FIELDS, StaticInputConfig, TransformConfig,
    load_config,
};
pub use error::{Error, Result};
pub use schema::{
    ArchiveOptions, Author, Dist, Package, PackageLink, PackageVersions, Packages, Reference,
    Repository, Source, Support,
};
pub use validation::{validate_package_name, validate_source_id, validate_versions};

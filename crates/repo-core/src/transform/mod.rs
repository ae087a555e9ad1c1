//! Transform stage between fetch and write
//!
//! Transforms are stateless and run in configuration order. A package is
//! dropped when any transform's [`Transform::skip`] returns true; otherwise
//! each manifest passes through every [`Transform::apply`].

mod exclude;
mod set_fields;

pub use exclude::Exclude;
pub use set_fields::SetFields;

use repo_meta::{Package, TransformConfig};

use crate::Result;

pub trait Transform: Send + Sync {
    /// Whether the package should be left out of the index entirely.
    fn skip(&self, source_id: &str, package_name: &str) -> bool;

    /// Rewrite one version's manifest.
    fn apply(&self, package: Package) -> Result<Package>;
}

/// Build the transform declared in the configuration.
pub fn from_config(config: &TransformConfig) -> Result<Box<dyn Transform>> {
    Ok(match config {
        TransformConfig::SetFields { packages, values } => {
            Box::new(SetFields::new(packages.iter().cloned(), values.clone())?)
        }
        TransformConfig::Exclude {
            packages,
            pattern,
            sources,
        } => Box::new(Exclude::new(
            packages.iter().cloned(),
            pattern.as_deref(),
            sources.iter().cloned(),
        )?),
    })
}

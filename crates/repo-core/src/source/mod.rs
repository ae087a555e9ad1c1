//! Package sources
//!
//! A source enumerates packages from one upstream system. Each configured
//! source has a stable id that names its provider shard, so the id must not
//! change between runs against the same published index.

mod gitlab;
mod static_source;

pub use gitlab::GitLabSource;
pub use static_source::StaticSource;

use repo_meta::{InputConfig, PackageVersions, Packages};

use crate::Result;

/// Trait for upstream package metadata providers.
pub trait Source: Send + Sync {
    /// Stable identifier of this configured source.
    fn id(&self) -> &str;

    /// Every package and every version this source currently knows about.
    fn list_packages(&self) -> Result<Packages>;

    /// Every version of one package. An unknown package has no versions.
    fn get_package(&self, name: &str) -> Result<PackageVersions>;
}

/// Build the source declared under `id` in the configuration.
pub fn from_config(id: &str, config: &InputConfig) -> Result<Box<dyn Source>> {
    Ok(match config {
        InputConfig::Gitlab(gitlab) => Box::new(GitLabSource::from_config(id, gitlab)?),
        InputConfig::Static(input) => Box::new(StaticSource::new(id, input.packages.clone())),
    })
}

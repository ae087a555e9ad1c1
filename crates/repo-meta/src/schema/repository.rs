//! Repository index documents
//!
//! The same shape is used for the root `packages.json` and for every shard.
//! In flat mode the root carries `packages`; in provider mode the root
//! carries `provider-includes` and `providers-url`, provider shards carry
//! `providers`, and package shards carry a single-entry `packages`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Package;

/// Version string to manifest. Every key equals its manifest's `version`.
pub type PackageVersions = BTreeMap<String, Package>;

/// Package name to its versions.
pub type Packages = BTreeMap<String, PackageVersions>;

/// Content address of a shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Hex SHA-256 of the referenced document's serialized bytes
    pub sha256: String,
}

impl Reference {
    pub fn new(sha256: impl Into<String>) -> Self {
        Self {
            sha256: sha256.into(),
        }
    }
}

/// A root or shard index document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Packages>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<BTreeMap<String, Reference>>,

    /// Path template containing `%hash%` to the reference of that shard
    #[serde(
        rename = "provider-includes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_includes: Option<BTreeMap<String, Reference>>,

    #[serde(rename = "providers-url", default, skip_serializing_if = "Option::is_none")]
    pub providers_url: Option<String>,
}

impl Repository {
    /// A flat root holding every package directly.
    pub fn flat(packages: Packages) -> Self {
        Self {
            packages: Some(packages),
            ..Self::default()
        }
    }

    /// An empty provider-mode root.
    pub fn sharded(providers_url: impl Into<String>) -> Self {
        Self {
            provider_includes: Some(BTreeMap::new()),
            providers_url: Some(providers_url.into()),
            ..Self::default()
        }
    }

    /// A package shard holding the versions of exactly one package.
    pub fn single_package(name: impl Into<String>, versions: PackageVersions) -> Self {
        Self::flat(BTreeMap::from([(name.into(), versions)]))
    }

    /// A provider shard.
    pub fn provider(providers: BTreeMap<String, Reference>) -> Self {
        Self {
            providers: Some(providers),
            ..Self::default()
        }
    }

    /// Whether this root uses provider includes instead of inline packages.
    pub fn is_sharded(&self) -> bool {
        self.provider_includes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flat_root_has_no_provider_keys() {
        let repo = Repository::flat(Packages::new());
        assert_eq!(serde_json::to_value(&repo).unwrap(), json!({"packages": {}}));
        assert!(!repo.is_sharded());
    }

    #[test]
    fn test_sharded_root_keys() {
        let mut repo = Repository::sharded("/repo/p/%package%$%hash%.json");
        repo.provider_includes
            .as_mut()
            .unwrap()
            .insert("p/provider-acme$%hash%.json".into(), Reference::new("ab12"));

        assert_eq!(
            serde_json::to_value(&repo).unwrap(),
            json!({
                "provider-includes": {"p/provider-acme$%hash%.json": {"sha256": "ab12"}},
                "providers-url": "/repo/p/%package%$%hash%.json"
            })
        );
        assert!(repo.is_sharded());
    }

    #[test]
    fn test_single_package_shard() {
        let versions = PackageVersions::from([(
            "1.0.0".to_string(),
            Package::new("acme/widget", "1.0.0"),
        )]);
        let shard = Repository::single_package("acme/widget", versions);
        let packages = shard.packages.unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages["acme/widget"]["1.0.0"].version, "1.0.0");
    }

    #[test]
    fn test_round_trip_preserves_empty_packages_map() {
        let repo = Repository::flat(Packages::new());
        let bytes = serde_json::to_vec(&repo).unwrap();
        let back: Repository = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, repo);
    }
}

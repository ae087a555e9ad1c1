//! Package manifest schema
//!
//! Mirrors the Composer `composer.json` schema. Key names are part of the
//! wire contract with package-manager clients and must not change.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "name": "acme/widget",
//!   "version": "1.0.0",
//!   "require": { "php": ">=8.1" },
//!   "source": { "type": "git", "url": "https://git.example.com/acme/widget.git", "reference": "3f2a..." }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dependency map: package name to version constraint.
pub type PackageLink = BTreeMap<String, String>;

/// One published version of a package.
///
/// Every map is ordered and empty or absent fields are omitted, so two equal
/// manifests always serialize to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Package {
    /// Stable identifier `{name}@{version}`, set for sharded indexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// A single SPDX identifier or an array of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<Support>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub require: PackageLink,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub require_dev: PackageLink,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conflict: PackageLink,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replace: PackageLink,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provide: PackageLink,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub suggest: PackageLink,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload_dev: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_stability: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prefer_stable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bin: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveOptions>,
    /// `true` or the name of a replacement package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_feature_branches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<Dist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl Package {
    /// Create a manifest with only a name and a version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// The `{name}@{version}` identifier used for `uid`.
    pub fn unique_id(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// Pointer to a downloadable archive of this version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dist {
    #[serde(rename = "type")]
    pub dist_type: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shasum: Option<String>,
}

/// Pointer to the version-control checkout of this version.
///
/// `reference` is always a commit id, never a branch name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    pub reference: String,
}

impl Source {
    /// A git checkout pinned to `commit`.
    pub fn git(url: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            source_type: "git".to_string(),
            url: url.into(),
            reference: commit.into(),
        }
    }
}

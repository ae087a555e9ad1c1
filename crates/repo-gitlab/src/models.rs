//! Subset of the GitLab REST API v4 resources the connector reads
//!
//! Unknown fields are ignored.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Group {
    pub id: u64,
    pub full_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
    pub web_url: String,
}

impl Project {
    /// Composer package name: the lower-cased namespace path.
    pub fn package_name(&self) -> String {
        self.path_with_namespace.to_lowercase()
    }

    /// Clone URL recorded in each version's `source`.
    pub fn git_url(&self) -> String {
        format!("{}.git", self.web_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: Commit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: Commit,
}

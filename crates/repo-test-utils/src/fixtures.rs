//! Package data builders.
//!
//! Every builder returns manifests that pass validation: names and versions
//! match their map keys and sources carry a commit reference.

use repo_meta::{Package, PackageVersions, Packages, Source};

/// A manifest with a git source pinned to a commit derived from the version.
pub fn package(name: &str, version: &str) -> Package {
    let mut package = Package::new(name, version);
    package.source = Some(Source::git(
        format!("https://git.example.com/{name}.git"),
        commit_for(name, version),
    ));
    package
}

/// Deterministic fake commit id for `name@version`.
pub fn commit_for(name: &str, version: &str) -> String {
    format!("{:0>40}", format!("{}{}", name.len(), version.replace('.', "")))
}

/// Versions map for one package.
pub fn versions(name: &str, list: &[&str]) -> PackageVersions {
    list.iter()
        .map(|version| (version.to_string(), package(name, version)))
        .collect()
}

/// Packages map from `(name, versions)` pairs.
///
/// # Example
///
/// ```rust
/// use repo_test_utils::fixtures::packages;
///
/// let packages = packages(&[("acme/widget", &["1.0.0"]), ("acme/gadget", &["dev-main"])]);
/// assert_eq!(packages.len(), 2);
/// ```
pub fn packages(entries: &[(&str, &[&str])]) -> Packages {
    entries
        .iter()
        .map(|(name, list)| (name.to_string(), versions(name, list)))
        .collect()
}

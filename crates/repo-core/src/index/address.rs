//! Content addressing of index documents
//!
//! Every shard name contains the literal `%hash%`, replaced at write time by
//! the hex SHA-256 of the document's canonical JSON. Canonical JSON is the
//! compact `serde_json` encoding; every map in the schema is ordered, so
//! equal documents always produce equal bytes.

use repo_meta::Repository;

use crate::Result;

/// Placeholder substituted with the content hash.
pub const HASH_PLACEHOLDER: &str = "%hash%";

/// Placeholder clients substitute with a package name.
pub const PACKAGE_PLACEHOLDER: &str = "%package%";

/// Fixed name of the root document.
pub const ROOT_NAME: &str = "packages.json";

/// Shard name template for one package's versions.
pub fn package_template(name: &str) -> String {
    format!("p/{name}${HASH_PLACEHOLDER}.json")
}

/// Shard name template for one source's provider document.
pub fn provider_template(source_id: &str) -> String {
    format!("p/provider-{source_id}${HASH_PLACEHOLDER}.json")
}

/// Source id of a provider template, the inverse of [`provider_template`].
pub fn provider_source(template: &str) -> Option<&str> {
    template
        .strip_prefix("p/provider-")?
        .strip_suffix(&format!("${HASH_PLACEHOLDER}.json"))
        .filter(|id| !id.is_empty())
}

/// `providers-url` published in a sharded root.
pub fn providers_url(base_path: &str) -> String {
    format!(
        "{}/p/{PACKAGE_PLACEHOLDER}${HASH_PLACEHOLDER}.json",
        base_path.trim_end_matches('/')
    )
}

/// Concrete storage name of `template` for `hash`.
pub fn resolve(template: &str, hash: &str) -> String {
    template.replace(HASH_PLACEHOLDER, hash)
}

pub fn canonical_bytes(document: &Repository) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(document)?)
}

pub fn content_hash(bytes: &[u8]) -> String {
    repo_fs::compute_content_checksum(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_meta::{Package, PackageVersions};

    #[test]
    fn test_templates() {
        assert_eq!(package_template("acme/widget"), "p/acme/widget$%hash%.json");
        assert_eq!(provider_template("gitlab"), "p/provider-gitlab$%hash%.json");
        assert_eq!(resolve("p/acme/widget$%hash%.json", "ab12"), "p/acme/widget$ab12.json");
    }

    #[test]
    fn test_provider_source() {
        assert_eq!(provider_source(&provider_template("gitlab")), Some("gitlab"));
        assert_eq!(provider_source(&provider_template("drupal-contrib")), Some("drupal-contrib"));
        assert_eq!(provider_source("p/provider-$%hash%.json"), None);
        assert_eq!(provider_source("p/acme/widget$%hash%.json"), None);
    }

    #[test]
    fn test_providers_url() {
        assert_eq!(providers_url(""), "/p/%package%$%hash%.json");
        assert_eq!(providers_url("/composer"), "/composer/p/%package%$%hash%.json");
        assert_eq!(providers_url("/composer/"), "/composer/p/%package%$%hash%.json");
        assert_eq!(
            providers_url("https://cdn.example.com/repo"),
            "https://cdn.example.com/repo/p/%package%$%hash%.json"
        );
    }

    #[test]
    fn test_equal_documents_hash_equally() {
        let a = Repository::single_package(
            "acme/widget",
            PackageVersions::from([
                ("1.0.0".to_string(), Package::new("acme/widget", "1.0.0")),
                ("2.0.0".to_string(), Package::new("acme/widget", "2.0.0")),
            ]),
        );
        let mut versions = PackageVersions::new();
        versions.insert("2.0.0".to_string(), Package::new("acme/widget", "2.0.0"));
        versions.insert("1.0.0".to_string(), Package::new("acme/widget", "1.0.0"));
        let b = Repository::single_package("acme/widget", versions);

        let hash_a = content_hash(&canonical_bytes(&a).unwrap());
        let hash_b = content_hash(&canonical_bytes(&b).unwrap());
        assert_eq!(hash_a, hash_b);
        assert_eq!(hash_a.len(), 64);
    }
}

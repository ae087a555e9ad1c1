//! Drop packages from the index

use std::collections::BTreeSet;

use regex::Regex;
use repo_meta::Package;

use super::Transform;
use crate::{Error, Result};

pub struct Exclude {
    packages: BTreeSet<String>,
    pattern: Option<Regex>,
    sources: BTreeSet<String>,
}

impl Exclude {
    /// Excludes names in `packages` or matching `pattern`, from the listed
    /// `sources` only (all sources when empty).
    pub fn new(
        packages: impl IntoIterator<Item = String>,
        pattern: Option<&str>,
        sources: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let pattern = pattern
            .map(Regex::new)
            .transpose()
            .map_err(|e| Error::Transform {
                message: format!("invalid exclude pattern: {e}"),
            })?;

        Ok(Self {
            packages: packages.into_iter().collect(),
            pattern,
            sources: sources.into_iter().collect(),
        })
    }
}

impl Transform for Exclude {
    fn skip(&self, source_id: &str, package_name: &str) -> bool {
        if !self.sources.is_empty() && !self.sources.contains(source_id) {
            return false;
        }
        self.packages.contains(package_name)
            || self
                .pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(package_name))
    }

    fn apply(&self, package: Package) -> Result<Package> {
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("local", "acme/secret", true)]
    #[case("local", "acme/internal-tools", true)]
    #[case("local", "acme/widget", false)]
    #[case("gitlab", "acme/secret", false)]
    fn test_skip(#[case] source: &str, #[case] name: &str, #[case] expected: bool) {
        let transform = Exclude::new(
            ["acme/secret".to_string()],
            Some("^acme/internal-"),
            ["local".to_string()],
        )
        .unwrap();
        assert_eq!(transform.skip(source, name), expected);
    }

    #[test]
    fn test_no_rules_skips_nothing() {
        let transform = Exclude::new(Vec::new(), None, Vec::new()).unwrap();
        assert!(!transform.skip("any", "acme/widget"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Exclude::new(Vec::new(), Some("("), Vec::new()).is_err());
    }
}

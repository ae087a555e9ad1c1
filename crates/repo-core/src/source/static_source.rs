//! Source backed by packages declared inline in the configuration

use repo_meta::{PackageVersions, Packages};

use super::Source;
use crate::Result;

pub struct StaticSource {
    id: String,
    packages: Packages,
}

impl StaticSource {
    /// Create a source serving `packages`.
    ///
    /// Each manifest's `name` and `version` are taken from its map keys.
    pub fn new(id: impl Into<String>, mut packages: Packages) -> Self {
        for (name, versions) in &mut packages {
            for (version, package) in versions.iter_mut() {
                package.name = name.clone();
                package.version = version.clone();
            }
        }

        Self {
            id: id.into(),
            packages,
        }
    }
}

impl Source for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_packages(&self) -> Result<Packages> {
        Ok(self.packages.clone())
    }

    fn get_package(&self, name: &str) -> Result<PackageVersions> {
        Ok(self.packages.get(name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_meta::Package;

    #[test]
    fn test_identity_forced_from_keys() {
        let packages = Packages::from([(
            "acme/widget".to_string(),
            PackageVersions::from([("1.0.0".to_string(), Package::default())]),
        )]);

        let source = StaticSource::new("local", packages);
        let versions = source.get_package("acme/widget").unwrap();

        assert_eq!(source.id(), "local");
        assert_eq!(versions["1.0.0"].name, "acme/widget");
        assert_eq!(versions["1.0.0"].version, "1.0.0");
    }

    #[test]
    fn test_unknown_package_has_no_versions() {
        let source = StaticSource::new("local", Packages::new());
        assert!(source.get_package("acme/missing").unwrap().is_empty());
        assert!(source.list_packages().unwrap().is_empty());
    }
}

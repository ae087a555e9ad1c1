//! Rules every persisted package and source id must satisfy

use crate::error::{Error, Result};
use crate::schema::PackageVersions;

/// Check that `name` can be published as a package name and embedded in a
/// shard path.
///
/// Names are lower-case, slash-joined namespace paths such as `acme/widget`.
pub fn validate_package_name(name: &str) -> Result<()> {
    let invalid = |message: &str| Error::InvalidPackage {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid("name must not start or end with '/'"));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(invalid("name must be lower-case"));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c == '$' || c == '%' || c == '\\')
    {
        return Err(invalid("name contains whitespace, '$', '%' or '\\'"));
    }
    if name.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(invalid("name contains an empty, '.' or '..' segment"));
    }
    Ok(())
}

/// Check the versions of one package before they are persisted.
pub fn validate_versions(name: &str, versions: &PackageVersions) -> Result<()> {
    validate_package_name(name)?;

    for (key, package) in versions {
        let invalid = |message: String| Error::InvalidPackage {
            name: name.to_string(),
            message,
        };

        if key.is_empty() || package.version.is_empty() {
            return Err(invalid("version is empty".to_string()));
        }
        if package.version != *key {
            return Err(invalid(format!(
                "version key {key:?} does not match manifest version {:?}",
                package.version
            )));
        }
        if package.name != name {
            return Err(invalid(format!(
                "manifest for {key} is named {:?}",
                package.name
            )));
        }
        if package
            .source
            .as_ref()
            .is_some_and(|source| source.reference.is_empty())
        {
            return Err(invalid(format!("source reference for {key} is empty")));
        }
    }
    Ok(())
}

/// Check that a source id is usable in a provider shard name.
///
/// Allowed characters are ASCII alphanumerics, `-`, `_` and `.`.
pub fn validate_source_id(id: &str) -> Result<()> {
    let invalid = |message: &str| Error::InvalidSourceId {
        id: id.to_string(),
        message: message.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("source id is empty"));
    }
    if id == "." || id == ".." {
        return Err(invalid("source id must not be '.' or '..'"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid("source id may only contain [A-Za-z0-9._-]"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Package, Source};
    use rstest::rstest;

    fn versions(name: &str, list: &[&str]) -> PackageVersions {
        list.iter()
            .map(|v| (v.to_string(), Package::new(name, *v)))
            .collect()
    }

    #[rstest]
    #[case("acme/widget")]
    #[case("acme/sub-group/widget")]
    #[case("drupal/my_module")]
    #[case("single")]
    fn test_valid_names(#[case] name: &str) {
        assert!(validate_package_name(name).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("/acme/widget")]
    #[case("acme/widget/")]
    #[case("Acme/Widget")]
    #[case("acme//widget")]
    #[case("acme/../widget")]
    #[case("acme/wid get")]
    #[case("acme/widget$x")]
    #[case("acme/%package%")]
    fn test_invalid_names(#[case] name: &str) {
        assert!(matches!(
            validate_package_name(name),
            Err(Error::InvalidPackage { .. })
        ));
    }

    #[test]
    fn test_valid_versions() {
        let v = versions("acme/widget", &["1.0.0", "dev-main"]);
        assert!(validate_versions("acme/widget", &v).is_ok());
    }

    #[test]
    fn test_empty_versions_are_valid() {
        assert!(validate_versions("acme/widget", &PackageVersions::new()).is_ok());
    }

    #[test]
    fn test_version_key_mismatch() {
        let mut v = versions("acme/widget", &["1.0.0"]);
        v.get_mut("1.0.0").unwrap().version = "1.0.1".into();
        assert!(validate_versions("acme/widget", &v).is_err());
    }

    #[test]
    fn test_manifest_name_mismatch() {
        let v = versions("acme/other", &["1.0.0"]);
        let err = validate_versions("acme/widget", &v).unwrap_err();
        assert!(err.to_string().contains("acme/widget"));
    }

    #[test]
    fn test_empty_source_reference() {
        let mut v = versions("acme/widget", &["1.0.0"]);
        v.get_mut("1.0.0").unwrap().source = Some(Source::git("https://x/acme/widget.git", ""));
        assert!(validate_versions("acme/widget", &v).is_err());
    }

    #[rstest]
    #[case("acme", true)]
    #[case("gitlab-main_2.x", true)]
    #[case("", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    #[case("a$b", false)]
    fn test_source_ids(#[case] id: &str, #[case] ok: bool) {
        assert_eq!(validate_source_id(id).is_ok(), ok);
    }
}

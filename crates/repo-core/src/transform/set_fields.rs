//! Force top-level manifest fields to fixed values

use std::collections::{BTreeMap, BTreeSet};

use repo_meta::{PROTECTED_FIELDS, Package};
use serde_json::Value;

use super::Transform;
use crate::{Error, Result};

pub struct SetFields {
    packages: BTreeSet<String>,
    values: BTreeMap<String, Value>,
}

impl SetFields {
    /// `packages` limits the transform to those names; empty means all.
    pub fn new(
        packages: impl IntoIterator<Item = String>,
        values: BTreeMap<String, Value>,
    ) -> Result<Self> {
        if let Some(field) = values
            .keys()
            .find(|key| PROTECTED_FIELDS.contains(&key.as_str()))
        {
            return Err(Error::Transform {
                message: format!("field {field:?} cannot be overridden"),
            });
        }

        Ok(Self {
            packages: packages.into_iter().collect(),
            values,
        })
    }

    fn applies_to(&self, name: &str) -> bool {
        self.packages.is_empty() || self.packages.contains(name)
    }
}

impl Transform for SetFields {
    fn skip(&self, _source_id: &str, _package_name: &str) -> bool {
        false
    }

    fn apply(&self, package: Package) -> Result<Package> {
        if !self.applies_to(&package.name) || self.values.is_empty() {
            return Ok(package);
        }

        tracing::debug!("Transforming {}@{}", package.name, package.version);

        let mut manifest = serde_json::to_value(&package)?;
        if let Value::Object(fields) = &mut manifest {
            for (key, value) in &self.values {
                fields.insert(key.clone(), value.clone());
            }
        }

        serde_json::from_value(manifest).map_err(|e| Error::Transform {
            message: format!("{}@{}: {e}", package.name, package.version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_sets_type_on_listed_package() {
        let transform = SetFields::new(
            ["acme/widget".to_string()],
            values(&[("type", json!("drupal-module"))]),
        )
        .unwrap();

        let widget = transform.apply(Package::new("acme/widget", "1.0.0")).unwrap();
        let other = transform.apply(Package::new("acme/other", "1.0.0")).unwrap();

        assert_eq!(widget.package_type.as_deref(), Some("drupal-module"));
        assert_eq!(widget.name, "acme/widget");
        assert!(other.package_type.is_none());
    }

    #[test]
    fn test_empty_filter_applies_to_all() {
        let transform =
            SetFields::new(Vec::new(), values(&[("license", json!("MIT"))])).unwrap();
        let package = transform.apply(Package::new("acme/any", "dev-main")).unwrap();
        assert_eq!(package.license, Some(json!("MIT")));
    }

    #[test]
    fn test_nested_values_replace_whole_field() {
        let transform = SetFields::new(
            Vec::new(),
            values(&[("extra", json!({"drupal": {"version": "1.x"}}))]),
        )
        .unwrap();
        let mut package = Package::new("acme/widget", "1.0.0");
        package.extra = Some(json!({"branch-alias": {}}));

        let package = transform.apply(package).unwrap();
        assert_eq!(package.extra, Some(json!({"drupal": {"version": "1.x"}})));
    }

    #[test]
    fn test_protected_fields_rejected() {
        for field in PROTECTED_FIELDS {
            assert!(SetFields::new(Vec::new(), values(&[(field, json!("x"))])).is_err());
        }
    }

    #[test]
    fn test_ill_typed_value_is_a_transform_error() {
        let transform =
            SetFields::new(Vec::new(), values(&[("require", json!("not-a-map"))])).unwrap();
        let err = transform.apply(Package::new("acme/widget", "1.0.0")).unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));
    }

    #[test]
    fn test_never_skips() {
        let transform = SetFields::new(Vec::new(), BTreeMap::new()).unwrap();
        assert!(!transform.skip("local", "acme/widget"));
    }
}

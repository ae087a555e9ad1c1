//! Configuration schema and loading for `repoctl`
//!
//! A single file (YAML, TOML or JSON, chosen by extension) declares the
//! sources to aggregate, the ordered transform chain and the output backend.
//!
//! ```yaml
//! providers: true
//! inputs:
//!   acme:
//!     type: gitlab
//!     url: https://gitlab.example.com
//!     group: acme
//! transformers:
//!   - type: set-fields
//!     values: { type: drupal-module }
//! output:
//!   type: file
//!   dir: ./public
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use repo_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::Packages;
use crate::validation::{validate_package_name, validate_source_id};

/// Manifest keys a `set-fields` transform may not override.
pub const PROTECTED_FIELDS: [&str; 4] = ["name", "version", "uid", "source"];

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Publish a sharded index with provider includes
    #[serde(default)]
    pub providers: bool,

    /// Let a later source replace a package name owned by an earlier one
    #[serde(default)]
    pub allow_overrides: bool,

    /// Sources keyed by stable source id
    #[serde(default)]
    pub inputs: BTreeMap<String, InputConfig>,

    /// Transforms, applied in order
    #[serde(default)]
    pub transformers: Vec<TransformConfig>,

    pub output: OutputConfig,
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for (id, input) in &self.inputs {
            validate_source_id(id)?;
            if let InputConfig::Static(input) = input {
                for name in input.packages.keys() {
                    validate_package_name(name)?;
                }
            }
        }

        for (index, transform) in self.transformers.iter().enumerate() {
            match transform {
                TransformConfig::SetFields { values, .. } => {
                    if let Some(field) = values
                        .keys()
                        .find(|key| PROTECTED_FIELDS.contains(&key.as_str()))
                    {
                        return Err(Error::InvalidTransform {
                            index,
                            message: format!("field {field:?} cannot be overridden"),
                        });
                    }
                }
                TransformConfig::Exclude { pattern, .. } => {
                    if let Some(pattern) = pattern {
                        regex::Regex::new(pattern).map_err(|e| Error::InvalidTransform {
                            index,
                            message: e.to_string(),
                        })?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// A package source, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InputConfig {
    Gitlab(GitLabInputConfig),
    Static(StaticInputConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GitLabInputConfig {
    /// Instance base URL, e.g. `https://gitlab.com`
    pub url: String,
    /// Full path or numeric id of the group to index
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Packages declared inline, keyed by name then version.
///
/// Names and versions are taken from the keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticInputConfig {
    #[serde(default)]
    pub packages: Packages,
}

/// A transform, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", deny_unknown_fields)]
pub enum TransformConfig {
    /// Force top-level manifest fields to fixed values.
    #[serde(alias = "static")]
    SetFields {
        /// Package names to touch; empty means every package
        #[serde(default)]
        packages: Vec<String>,
        #[serde(default)]
        values: BTreeMap<String, Value>,
    },

    /// Drop packages from the index.
    Exclude {
        #[serde(default)]
        packages: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        /// Source ids the rule applies to; empty means every source
        #[serde(default)]
        sources: Vec<String>,
    },
}

/// The storage backend, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutputConfig {
    File(FileOutputConfig),
    Azure(AzureOutputConfig),
    Memory(MemoryOutputConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub dir: PathBuf,
    /// URL prefix the published directory is served under
    #[serde(default, alias = "basePath")]
    pub base_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AzureOutputConfig {
    #[serde(alias = "accountName")]
    pub account_name: String,
    pub container: String,
    /// Shared access signature query string, without the leading `?`
    #[serde(alias = "sasToken")]
    pub sas_token: String,
    /// Overrides `https://{account}.blob.core.windows.net`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MemoryOutputConfig {
    #[serde(default)]
    pub base_path: String,
}

/// Load and validate a configuration file.
pub fn load_config(path: &NormalizedPath) -> Result<Config> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_native(),
        });
    }

    let config: Config = ConfigStore::new().load(path).map_err(|e| match e {
        repo_fs::Error::ConfigParse { message, .. } => Error::InvalidConfig {
            path: path.to_native(),
            message,
        },
        other => Error::Fs(other),
    })?;

    config.validate()?;
    tracing::debug!(
        path = %path,
        inputs = config.inputs.len(),
        transformers = config.transformers.len(),
        "Loaded configuration"
    );
    Ok(config)
}

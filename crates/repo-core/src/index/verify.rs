//! Integrity walk over a published index

use std::fmt;

use repo_meta::{Reference, Repository, validate_versions};
use serde::{Deserialize, Serialize};

use super::address::{ROOT_NAME, content_hash, package_template, resolve};
use super::store::DocumentStore;
use crate::Result;
use crate::storage::Storage;

/// Overall result of a verification walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyStatus {
    /// Every referenced document exists and matches its hash
    Healthy,
    /// Some referenced documents do not exist
    Missing,
    /// Some documents do not match their hash or hold invalid packages
    Corrupt,
}

/// Report from [`IndexEngine::verify`](crate::IndexEngine::verify)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Documents examined, including the root
    pub checked: usize,
    /// Referenced documents that do not exist
    pub missing: Vec<String>,
    /// Documents whose content does not hash to their reference
    pub mismatched: Vec<String>,
    /// Documents that parse but hold packages failing validation
    pub invalid: Vec<String>,
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerifyStatus::Healthy => "healthy",
            VerifyStatus::Missing => "missing",
            VerifyStatus::Corrupt => "corrupt",
        })
    }
}

impl VerifyReport {
    pub fn status(&self) -> VerifyStatus {
        if !self.mismatched.is_empty() || !self.invalid.is_empty() {
            VerifyStatus::Corrupt
        } else if !self.missing.is_empty() {
            VerifyStatus::Missing
        } else {
            VerifyStatus::Healthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status() == VerifyStatus::Healthy
    }
}

/// Walk root, provider shards and package shards.
///
/// Problems with individual shards are collected in the report; only a
/// missing or unreadable root, or a storage failure, is an error.
pub(crate) fn verify_index(store: &DocumentStore<'_>, storage: &dyn Storage) -> Result<VerifyReport> {
    let root = store.read_root()?;
    let mut report = VerifyReport {
        checked: 1,
        ..VerifyReport::default()
    };

    check_packages(ROOT_NAME, &root, &mut report);

    for (template, reference) in root.provider_includes.iter().flatten() {
        let Some(provider) = check_shard(storage, template, reference, &mut report)? else {
            continue;
        };

        for (name, reference) in provider.providers.iter().flatten() {
            let template = package_template(name);
            if let Some(shard) = check_shard(storage, &template, reference, &mut report)? {
                let shard_name = resolve(&template, &reference.sha256);
                if !shard.packages.as_ref().is_some_and(|p| p.contains_key(name)) {
                    report.invalid.push(shard_name);
                } else {
                    check_packages(&shard_name, &shard, &mut report);
                }
            }
        }
    }

    tracing::info!(
        "Verified {} documents: {} missing, {} mismatched, {} invalid",
        report.checked,
        report.missing.len(),
        report.mismatched.len(),
        report.invalid.len()
    );
    Ok(report)
}

/// Read one shard, recording it as missing or mismatched when it is unusable.
fn check_shard(
    storage: &dyn Storage,
    template: &str,
    reference: &Reference,
    report: &mut VerifyReport,
) -> Result<Option<Repository>> {
    let name = resolve(template, &reference.sha256);
    report.checked += 1;

    let Some(bytes) = storage.read(&name)? else {
        tracing::warn!("{} is missing", name);
        report.missing.push(name);
        return Ok(None);
    };

    if content_hash(&bytes) != reference.sha256 {
        tracing::warn!("{} does not match its hash", name);
        report.mismatched.push(name);
        return Ok(None);
    }

    match serde_json::from_slice(&bytes) {
        Ok(document) => Ok(Some(document)),
        Err(e) => {
            tracing::warn!("{} is not a valid index document: {}", name, e);
            report.invalid.push(name);
            Ok(None)
        }
    }
}

fn check_packages(document: &str, repository: &Repository, report: &mut VerifyReport) {
    for (name, versions) in repository.packages.iter().flatten() {
        if let Err(e) = validate_versions(name, versions) {
            tracing::warn!("{}: {}", document, e);
            report.invalid.push(format!("{document}#{name}"));
        }
    }
}

//! IndexEngine implementation
//!
//! The engine turns the packages reported by every configured source into a
//! published index. Shards are written before the documents that reference
//! them and the root is written exactly once, last, so a reader never sees a
//! root pointing at a shard that does not exist yet.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use repo_meta::{
    Config, PackageVersions, Packages, Reference, Repository, validate_package_name,
    validate_versions,
};
use serde::{Deserialize, Serialize};

use super::address::{
    canonical_bytes, content_hash, package_template, provider_source, provider_template,
    providers_url,
};
use super::store::DocumentStore;
use super::verify::{VerifyReport, verify_index};
use crate::source::{self, Source};
use crate::storage::{self, Storage};
use crate::transform::{self, Transform};
use crate::{Error, Result};

/// Behaviour switches for generation and updates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    /// Publish per-package shards behind provider includes
    pub use_providers: bool,
    /// Let a later source take over a package name instead of failing
    pub allow_overrides: bool,
}

/// A package to refresh, written `source:package` on the command line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageRef {
    pub source_id: String,
    pub package_name: String,
}

impl PackageRef {
    pub fn new(source_id: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            package_name: package_name.into(),
        }
    }
}

impl FromStr for PackageRef {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((source_id, package_name)) if !source_id.is_empty() && !package_name.is_empty() => {
                Ok(Self::new(source_id, package_name))
            }
            _ => Err(Error::InvalidPackageRef {
                input: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_id, self.package_name)
    }
}

/// Outcome of a full generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReport {
    /// Number of published packages
    pub packages: usize,
    /// Number of published versions across all packages
    pub versions: usize,
    /// Shards written, excluding the root
    pub shards_written: usize,
    /// The root document as written
    pub root: Repository,
}

/// Outcome of an incremental update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReport {
    /// Packages whose versions were replaced
    pub updated: Vec<PackageRef>,
    /// Packages dropped because they no longer have versions or were excluded
    pub removed: Vec<PackageRef>,
    /// Shards written, excluding the root
    pub shards_written: usize,
}

/// Engine for publishing a content-addressed package index
///
/// The IndexEngine provides three operations:
/// - **generate**: rebuild the whole index from every source
/// - **update**: re-fetch individual packages and repoint their parents
/// - **verify**: walk the published index and check every content hash
pub struct IndexEngine {
    sources: BTreeMap<String, Box<dyn Source>>,
    transforms: Vec<Box<dyn Transform>>,
    storage: Box<dyn Storage>,
    options: IndexOptions,
}

impl IndexEngine {
    pub fn new(storage: Box<dyn Storage>, options: IndexOptions) -> Self {
        Self {
            sources: BTreeMap::new(),
            transforms: Vec::new(),
            storage,
            options,
        }
    }

    /// Build an engine with every source, transform and the output declared
    /// in `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an adapter cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = storage::from_config(&config.output)?;
        Self::from_config_with_storage(config, storage)
    }

    /// Like [`IndexEngine::from_config`], but publishing to `storage`.
    pub fn from_config_with_storage(config: &Config, storage: Box<dyn Storage>) -> Result<Self> {
        let options = IndexOptions {
            use_providers: config.providers,
            allow_overrides: config.allow_overrides,
        };

        let mut engine = Self::new(storage, options);
        for (id, input) in &config.inputs {
            engine = engine.with_source(source::from_config(id, input)?);
        }
        for transform in &config.transformers {
            engine = engine.with_transform(transform::from_config(transform)?);
        }
        Ok(engine)
    }

    /// Register a source under its id, replacing any source with the same id.
    pub fn with_source(mut self, source: Box<dyn Source>) -> Self {
        self.sources.insert(source.id().to_string(), source);
        self
    }

    /// Append a transform to the chain.
    pub fn with_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Rebuild the index from every source.
    ///
    /// # Errors
    ///
    /// Any source, transform, validation or storage error aborts before the
    /// root is written. A name reported by two sources is a
    /// [`Error::NameCollision`] unless overrides are allowed. If the root
    /// changed while generating, returns [`Error::Conflict`].
    pub fn generate(&self) -> Result<GenerateReport> {
        let store = DocumentStore::new(self.storage.as_ref());
        let expected = store.root_revision()?;

        let collected = self.collect_all()?;
        let packages: usize = collected.values().map(|p| p.len()).sum();
        let versions: usize = collected
            .values()
            .flat_map(|p| p.values())
            .map(|v| v.len())
            .sum();

        let mut shards_written = 0;
        let root = if self.options.use_providers {
            let mut root = Repository::sharded(providers_url(self.storage.base_path()));
            let mut includes = BTreeMap::new();

            for (source_id, packages) in collected {
                let mut providers = BTreeMap::new();
                for (name, versions) in packages {
                    let hash = write_package_shard(&store, &name, versions)?;
                    providers.insert(name, Reference::new(hash));
                    shards_written += 1;
                }

                let template = provider_template(&source_id);
                let hash = store.write_named(&template, &Repository::provider(providers))?;
                tracing::info!("Wrote provider {} for {}", hash, source_id);
                includes.insert(template, Reference::new(hash));
                shards_written += 1;
            }

            root.provider_includes = Some(includes);
            root
        } else {
            Repository::flat(collected.into_values().flatten().collect())
        };

        store.write_root(&root, expected.as_deref())?;
        tracing::info!(
            "Generated index with {} packages and {} versions",
            packages,
            versions
        );

        Ok(GenerateReport {
            packages,
            versions,
            shards_written,
            root,
        })
    }

    /// Re-fetch the given packages and patch them into the existing index.
    ///
    /// Every package shard other than the requested ones keeps its path.
    /// A package that comes back without versions, or that a transform now
    /// excludes, is removed from the index unless another source still
    /// publishes it.
    ///
    /// # Errors
    ///
    /// Requests naming an unconfigured source, or a source the published
    /// index has no provider for, are rejected before anything is fetched
    /// or written. A package another source already publishes is a
    /// [`Error::NameCollision`] unless overrides are allowed, in which case
    /// the requesting source takes it over.
    pub fn update(&self, requests: &[PackageRef]) -> Result<UpdateReport> {
        for request in requests {
            if !self.sources.contains_key(&request.source_id) {
                return Err(Error::UnknownSource {
                    source_id: request.source_id.clone(),
                });
            }
            validate_package_name(&request.package_name)?;
        }

        let store = DocumentStore::new(self.storage.as_ref());
        let expected = store.root_revision()?;
        let mut root = store.read_root()?;

        if root.is_sharded() != self.options.use_providers {
            return Err(Error::consistency(format!(
                "published index {} provider includes but providers is {}",
                if root.is_sharded() { "uses" } else { "does not use" },
                self.options.use_providers
            )));
        }

        if self.options.use_providers {
            let includes = root.provider_includes.get_or_insert_default();
            for request in requests {
                if !includes.contains_key(&provider_template(&request.source_id)) {
                    return Err(Error::consistency(format!(
                        "no provider for source {:?} in the published index",
                        request.source_id
                    )));
                }
            }
        }

        // Fetch everything before the first write
        let mut fetched = Vec::with_capacity(requests.len());
        for request in requests {
            let versions = self.fetch_one(request)?;
            fetched.push((request.clone(), versions));
        }

        let mut report = UpdateReport::default();
        if self.options.use_providers {
            self.update_sharded(&store, &mut root, fetched, &mut report)?;
        } else {
            self.update_flat(&mut root, fetched, &mut report)?;
        }

        store.write_root(&root, expected.as_deref())?;
        Ok(report)
    }

    /// Apply fetched packages to the provider documents of a sharded root.
    ///
    /// Every published provider is read and ownership is settled in memory
    /// first, so a collision fails the update before any shard is written.
    fn update_sharded(
        &self,
        store: &DocumentStore<'_>,
        root: &mut Repository,
        fetched: Vec<(PackageRef, Option<PackageVersions>)>,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let includes = root.provider_includes.get_or_insert_default();

        let mut providers: BTreeMap<String, Repository> = BTreeMap::new();
        for (template, reference) in includes.iter() {
            if let Some(source_id) = provider_source(template) {
                providers.insert(source_id.to_string(), store.read_named(template, &reference.sha256)?);
            }
        }

        let mut dirty = BTreeSet::new();
        let mut pending = Vec::new();
        for (request, versions) in fetched {
            dirty.insert(request.source_id.clone());
            match versions {
                Some(versions) => {
                    self.claim(&mut providers, &mut dirty, &request)?;
                    let shard = package_shard(&request.package_name, versions);
                    let hash = content_hash(&canonical_bytes(&shard)?);
                    listed(&mut providers, &request.source_id)?
                        .insert(request.package_name.clone(), Reference::new(hash.clone()));
                    pending.push((request, shard, hash));
                }
                None => {
                    listed(&mut providers, &request.source_id)?.remove(&request.package_name);
                    tracing::info!("Removed {}", request);
                    report.removed.push(request);
                }
            }
        }

        for (request, shard, hash) in pending {
            let current = providers
                .get(&request.source_id)
                .and_then(|provider| provider.providers.as_ref())
                .and_then(|listed| listed.get(&request.package_name));
            if current.is_none_or(|reference| reference.sha256 != hash) {
                tracing::debug!("{} was superseded later in the same update", request);
                continue;
            }
            store.write_named(&package_template(&request.package_name), &shard)?;
            tracing::info!("Updated {} to {}", request, hash);
            report.shards_written += 1;
            report.updated.push(request);
        }

        for source_id in dirty {
            let Some(provider) = providers.get(&source_id) else {
                continue;
            };
            let template = provider_template(&source_id);
            let hash = store.write_named(&template, provider)?;
            tracing::info!("Wrote provider {} for {}", hash, source_id);
            includes.insert(template, Reference::new(hash));
            report.shards_written += 1;
        }

        Ok(())
    }

    /// Take `request.package_name` for the requesting source, failing when
    /// another published provider lists it unless overrides are allowed.
    fn claim(
        &self,
        providers: &mut BTreeMap<String, Repository>,
        dirty: &mut BTreeSet<String>,
        request: &PackageRef,
    ) -> Result<()> {
        for (source_id, provider) in providers.iter_mut() {
            if *source_id == request.source_id {
                continue;
            }
            let Some(listed) = provider.providers.as_mut() else {
                continue;
            };
            if !listed.contains_key(&request.package_name) {
                continue;
            }
            if !self.options.allow_overrides {
                return Err(Error::NameCollision {
                    name: request.package_name.clone(),
                    first: source_id.clone(),
                    second: request.source_id.clone(),
                });
            }
            tracing::warn!(
                "Package {} from {} overrides the one from {}",
                request.package_name,
                request.source_id,
                source_id
            );
            listed.remove(&request.package_name);
            dirty.insert(source_id.clone());
        }
        Ok(())
    }

    /// Apply fetched packages to the `packages` map of a flat root.
    ///
    /// A flat root does not record which source published a name, so the
    /// other configured sources are asked whether they still serve it.
    fn update_flat(
        &self,
        root: &mut Repository,
        fetched: Vec<(PackageRef, Option<PackageVersions>)>,
        report: &mut UpdateReport,
    ) -> Result<()> {
        let packages = root.packages.get_or_insert_default();
        for (request, versions) in fetched {
            let mut served = self.served_elsewhere(&request)?;
            match versions {
                Some(versions) => {
                    if let Some((other, _)) = served.first() {
                        if !self.options.allow_overrides {
                            return Err(Error::NameCollision {
                                name: request.package_name.clone(),
                                first: other.clone(),
                                second: request.source_id.clone(),
                            });
                        }
                        tracing::warn!(
                            "Package {} from {} overrides the one from {}",
                            request.package_name,
                            request.source_id,
                            other
                        );
                    }
                    packages.insert(request.package_name.clone(), versions);
                    tracing::info!("Updated {}", request);
                    report.updated.push(request);
                }
                // The last serving source wins, as in generate
                None => match served.pop() {
                    Some((other, versions)) => {
                        tracing::info!("{} is still served by {}", request.package_name, other);
                        packages.insert(request.package_name.clone(), versions);
                        report.updated.push(PackageRef::new(other, request.package_name));
                    }
                    None => {
                        packages.remove(&request.package_name);
                        tracing::info!("Removed {}", request);
                        report.removed.push(request);
                    }
                },
            }
        }
        Ok(())
    }

    /// Other configured sources that serve `request.package_name`, in
    /// source-id order, with their prepared versions.
    fn served_elsewhere(&self, request: &PackageRef) -> Result<Vec<(String, PackageVersions)>> {
        let mut served = Vec::new();
        for source_id in self.sources.keys() {
            if *source_id == request.source_id {
                continue;
            }
            let other = PackageRef::new(source_id.clone(), request.package_name.clone());
            if let Some(versions) = self.fetch_one(&other)? {
                served.push((source_id.clone(), versions));
            }
        }
        Ok(served)
    }

    /// Walk the published index and check every reference.
    pub fn verify(&self) -> Result<VerifyReport> {
        verify_index(&DocumentStore::new(self.storage.as_ref()), self.storage.as_ref())
    }

    /// List, transform and validate every source, resolving name collisions.
    fn collect_all(&self) -> Result<BTreeMap<String, Packages>> {
        let mut collected: BTreeMap<String, Packages> = BTreeMap::new();
        let mut owners: BTreeMap<String, String> = BTreeMap::new();

        for (source_id, source) in &self.sources {
            tracing::info!("Listing packages from {}", source_id);
            let packages = self.prepare(source_id, source.list_packages()?)?;

            for name in packages.keys() {
                if let Some(first) = owners.get(name) {
                    if !self.options.allow_overrides {
                        return Err(Error::NameCollision {
                            name: name.clone(),
                            first: first.clone(),
                            second: source_id.clone(),
                        });
                    }
                    tracing::warn!(
                        "Package {} from {} overrides the one from {}",
                        name,
                        source_id,
                        first
                    );
                    if let Some(earlier) = collected.get_mut(first) {
                        earlier.remove(name);
                    }
                }
                owners.insert(name.clone(), source_id.clone());
            }

            collected.insert(source_id.clone(), packages);
        }

        Ok(collected)
    }

    /// Transform and validate every package of one source, dropping packages
    /// that are excluded or have no versions.
    fn prepare(&self, source_id: &str, packages: Packages) -> Result<Packages> {
        let mut prepared = Packages::new();
        for (name, versions) in packages {
            if let Some(versions) = self.prepare_one(source_id, &name, versions)? {
                prepared.insert(name, versions);
            }
        }
        Ok(prepared)
    }

    fn prepare_one(
        &self,
        source_id: &str,
        name: &str,
        versions: PackageVersions,
    ) -> Result<Option<PackageVersions>> {
        if self.transforms.iter().any(|t| t.skip(source_id, name)) {
            tracing::debug!("Skipping {} from {}", name, source_id);
            return Ok(None);
        }
        if versions.is_empty() {
            tracing::debug!("{} from {} has no versions", name, source_id);
            return Ok(None);
        }

        let mut transformed = PackageVersions::new();
        for (version, mut package) in versions {
            for transform in &self.transforms {
                package = transform.apply(package)?;
            }
            transformed.insert(version, package);
        }

        validate_versions(name, &transformed)?;
        Ok(Some(transformed))
    }

    fn fetch_one(&self, request: &PackageRef) -> Result<Option<PackageVersions>> {
        let source = self
            .sources
            .get(&request.source_id)
            .ok_or_else(|| Error::UnknownSource {
                source_id: request.source_id.clone(),
            })?;

        tracing::info!("Fetching {}", request);
        let versions = source.get_package(&request.package_name)?;
        self.prepare_one(&request.source_id, &request.package_name, versions)
    }
}

/// Stamp `uid` on every version and write the single-package shard.
/// Shard document for one package, each version stamped with its uid.
fn package_shard(name: &str, mut versions: PackageVersions) -> Repository {
    for package in versions.values_mut() {
        package.uid = Some(package.unique_id());
    }
    Repository::single_package(name, versions)
}

fn write_package_shard(store: &DocumentStore<'_>, name: &str, versions: PackageVersions) -> Result<String> {
    store.write_named(&package_template(name), &package_shard(name, versions))
}

/// Mutable package listing of the provider published for `source_id`.
fn listed<'a>(
    providers: &'a mut BTreeMap<String, Repository>,
    source_id: &str,
) -> Result<&'a mut BTreeMap<String, Reference>> {
    providers
        .get_mut(source_id)
        .map(|provider| provider.providers.get_or_insert_default())
        .ok_or_else(|| {
            Error::consistency(format!(
                "no provider for source {source_id:?} in the published index"
            ))
        })
}

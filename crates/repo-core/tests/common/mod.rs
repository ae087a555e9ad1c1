#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use repo_core::{Error, IndexEngine, IndexOptions, MemoryStorage, Result, Source, Storage};
use repo_meta::{PackageVersions, Packages};

/// Source whose packages can be changed between engine runs.
#[derive(Clone)]
pub struct FakeSource {
    id: String,
    packages: Arc<Mutex<Packages>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeSource {
    pub fn new(id: &str, packages: Packages) -> Self {
        Self {
            id: id.to_string(),
            packages: Arc::new(Mutex::new(packages)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set(&self, name: &str, versions: PackageVersions) {
        self.packages.lock().insert(name.to_string(), versions);
    }

    pub fn remove(&self, name: &str) {
        self.packages.lock().remove(name);
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn boxed(&self) -> Box<dyn Source> {
        Box::new(self.clone())
    }
}

impl Source for FakeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_packages(&self) -> Result<Packages> {
        if *self.fail.lock() {
            return Err(Error::SourceFetch {
                source_id: self.id.clone(),
                message: "upstream unavailable".into(),
            });
        }
        Ok(self.packages.lock().clone())
    }

    fn get_package(&self, name: &str) -> Result<PackageVersions> {
        if *self.fail.lock() {
            return Err(Error::SourceFetch {
                source_id: self.id.clone(),
                message: "upstream unavailable".into(),
            });
        }
        Ok(self.packages.lock().get(name).cloned().unwrap_or_default())
    }
}

/// Memory storage shared between the engine and the test.
#[derive(Clone, Default)]
pub struct SharedStorage(pub Arc<MemoryStorage>);

impl SharedStorage {
    pub fn new(base_path: &str) -> Self {
        Self(Arc::new(MemoryStorage::new(base_path)))
    }

    pub fn boxed(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}

impl Storage for SharedStorage {
    fn base_path(&self) -> &str {
        self.0.base_path()
    }

    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.0.read(name)
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.0.write(name, bytes)
    }

    fn revision(&self, name: &str) -> Result<Option<String>> {
        self.0.revision(name)
    }

    fn write_if(&self, name: &str, bytes: &[u8], expected: Option<&str>) -> Result<()> {
        self.0.write_if(name, bytes, expected)
    }
}

pub fn engine(storage: &SharedStorage, use_providers: bool, sources: &[&FakeSource]) -> IndexEngine {
    let options = IndexOptions {
        use_providers,
        allow_overrides: false,
    };
    sources
        .iter()
        .fold(IndexEngine::new(storage.boxed(), options), |engine, source| {
            engine.with_source(source.boxed())
        })
}

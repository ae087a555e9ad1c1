//! [`TestOutput`] for end-to-end publish scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use repo_meta::Repository;
use serde_json::Value;
use tempfile::TempDir;

/// A temporary working directory holding a config file and a publish
/// directory (`public/`), with helpers for asserting on the published index.
///
/// # Example
///
/// ```rust,no_run
/// use repo_test_utils::output::TestOutput;
///
/// let output = TestOutput::new();
/// output.write_config("repo.yml", "output:\n  type: file\n  dir: public\n");
/// output.assert_file_exists("public/packages.json");
/// ```
pub struct TestOutput {
    temp_dir: TempDir,
}

impl Default for TestOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOutput {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory the index is published to.
    pub fn public_dir(&self) -> PathBuf {
        self.root().join("public")
    }

    /// Write a config file relative to the root and return its path.
    pub fn write_config(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.root().join(file_name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Parse the published root document.
    pub fn root_document(&self) -> Repository {
        self.read_document("packages.json")
    }

    /// Parse a published document by name relative to `public/`.
    pub fn read_document(&self, name: &str) -> Repository {
        let path = self.public_dir().join(name);
        let bytes = fs::read(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()));
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|e| panic!("{} is not an index document: {e}", path.display()))
    }

    /// Parse a published document as untyped JSON.
    pub fn read_json(&self, name: &str) -> Value {
        let path = self.public_dir().join(name);
        let text = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", path.display()));
        serde_json::from_str(&text).unwrap()
    }

    /// Every file under `public/`, hidden ones included, as sorted
    /// forward-slash names.
    pub fn published_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect_files(&self.public_dir(), &self.public_dir(), &mut files);
        files.sort();
        files
    }

    /// Assert that `path` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}

fn collect_files(base: &Path, dir: &Path, files: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, files);
            continue;
        }
        let relative = path.strip_prefix(base).unwrap();
        files.push(relative.to_string_lossy().replace('\\', "/"));
    }
}

//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::checksum::compute_content_checksum;
use crate::{Error, NormalizedPath, Result};

/// Tuning knobs for locked writes.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// How long to keep retrying lock acquisition before giving up.
    pub lock_timeout: Duration,
    /// Whether to fsync the temporary file before renaming it into place.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(10),
            enable_fsync: true,
        }
    }
}

/// Condition the current file content must satisfy for a write to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition<'a> {
    /// Write unconditionally.
    Any,
    /// The target must not exist yet.
    Absent,
    /// The target must exist with this SHA-256 checksum.
    Checksum(&'a str),
}

impl Precondition<'_> {
    fn expected(&self) -> Option<String> {
        match self {
            Precondition::Any | Precondition::Absent => None,
            Precondition::Checksum(c) => Some((*c).to_string()),
        }
    }

    fn holds(&self, actual: Option<&str>) -> bool {
        match (self, actual) {
            (Precondition::Any, _) => true,
            (Precondition::Absent, None) => true,
            (Precondition::Checksum(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes. No lock
/// is taken, so concurrent writers of the same path each land whole and the
/// last rename wins.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    write_atomic_if(path, content, config, Precondition::Any)
}

/// Write content atomically once `precondition` holds for the current file.
///
/// For `Absent` and `Checksum` a sidecar lock is held across the check and
/// the rename, so two cooperating writers cannot both pass the same
/// precondition. The lock file is removed again before the lock is released.
pub fn write_atomic_if(
    path: &NormalizedPath,
    content: &[u8],
    config: RobustnessConfig,
    precondition: Precondition<'_>,
) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let _lock = if precondition == Precondition::Any {
        None
    } else {
        let lock = SidecarLock::acquire(&native_path, config)?;
        let actual = read_optional(&native_path)?.map(|bytes| compute_content_checksum(&bytes));
        if !precondition.holds(actual.as_deref()) {
            return Err(Error::PreconditionFailed {
                path: native_path,
                expected: precondition.expected(),
                actual,
            });
        }
        Some(lock)
    };

    // Temp file in the same directory keeps the rename on one filesystem
    let tag = format!(
        "{}-{}",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = sidecar(&native_path, &tag, "tmp");

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    if let Err(e) = temp_file.write_all(content) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }

    if config.enable_fsync
        && let Err(e) = temp_file.sync_all()
    {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(&temp_path, e));
    }
    drop(temp_file);

    fs::rename(&temp_path, &native_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(&native_path, e)
    })?;

    tracing::debug!("Wrote {} bytes to {}", content.len(), path);
    Ok(())
}

/// Read raw bytes, returning `None` when the file does not exist.
pub fn read_bytes(path: &NormalizedPath) -> Result<Option<Vec<u8>>> {
    read_optional(&path.to_native())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Hidden sibling of `path`: `.{file_name}.{tag}.{ext}` or `.{file_name}.{ext}`.
fn sidecar(path: &Path, tag: &str, ext: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if tag.is_empty() {
        format!(".{file_name}.{ext}")
    } else {
        format!(".{file_name}.{tag}.{ext}")
    };
    path.with_file_name(name)
}

/// Exclusive advisory lock on `.{file_name}.lock`.
///
/// Dropping the guard unlinks the lock file and then releases the lock. A
/// waiter that locked the unlinked file notices the path no longer refers to
/// it and retries on a fresh one.
struct SidecarLock {
    file: File,
    path: PathBuf,
}

impl SidecarLock {
    fn acquire(target: &Path, config: RobustnessConfig) -> Result<Self> {
        let path = sidecar(target, "", "lock");

        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(250),
            max_elapsed_time: Some(config.lock_timeout),
            ..ExponentialBackoff::default()
        };

        let file = backoff::retry(policy, || {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(backoff::Error::transient)?;
            file.try_lock_exclusive().map_err(backoff::Error::transient)?;
            if is_current(&file, &path) {
                Ok(file)
            } else {
                Err(backoff::Error::transient(std::io::Error::new(
                    ErrorKind::WouldBlock,
                    "lock file was replaced",
                )))
            }
        })
        .map_err(|_| Error::LockFailed {
            path: target.to_path_buf(),
        })?;

        Ok(Self { file, path })
    }
}

impl Drop for SidecarLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(unix)]
fn is_current(file: &File, path: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(on_disk)) => held.dev() == on_disk.dev() && held.ino() == on_disk.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_current(_file: &File, path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_names_are_hidden_siblings() {
        let path = Path::new("/out/p/packages.json");
        assert_eq!(
            sidecar(path, "", "lock"),
            PathBuf::from("/out/p/.packages.json.lock")
        );
        assert_eq!(
            sidecar(path, "42-0", "tmp"),
            PathBuf::from("/out/p/.packages.json.42-0.tmp")
        );
    }

    #[test]
    fn precondition_matrix() {
        assert!(Precondition::Any.holds(None));
        assert!(Precondition::Any.holds(Some("abc")));
        assert!(Precondition::Absent.holds(None));
        assert!(!Precondition::Absent.holds(Some("abc")));
        assert!(Precondition::Checksum("abc").holds(Some("abc")));
        assert!(!Precondition::Checksum("abc").holds(Some("def")));
        assert!(!Precondition::Checksum("abc").holds(None));
    }

    #[test]
    fn lock_file_is_removed_on_release() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("packages.json");

        let lock = SidecarLock::acquire(&target, RobustnessConfig::default()).unwrap();
        assert!(dir.path().join(".packages.json.lock").exists());
        drop(lock);

        assert!(!dir.path().join(".packages.json.lock").exists());
        // A fresh lock can be taken after release
        drop(SidecarLock::acquire(&target, RobustnessConfig::default()).unwrap());
    }
}

//! Artifact tree access.
//!
//! All mutation of generated labs goes through the `ArtifactStore` trait so
//! the reconciler and parser can run against an in-memory tree in tests. The
//! discipline is whole-document read-modify-write; there is no partial or
//! streaming update.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised by artifact-store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read artifact '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write artifact '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read/modify/write access to a lab's artifact tree.
///
/// Paths are always relative to the lab root, e.g. `r1/etc/frr/frr.conf`.
pub trait ArtifactStore {
    fn read(&self, path: &Path) -> Result<String, StoreError>;
    fn write(&mut self, path: &Path, content: &str) -> Result<(), StoreError>;
    fn exists(&self, path: &Path) -> bool;
    /// Mark an artifact executable; a no-op where the backing store carries
    /// no permission bits.
    fn mark_executable(&mut self, path: &Path) -> Result<(), StoreError>;
}

/// Filesystem-backed store rooted at a lab directory
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl ArtifactStore for FsStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let full = self.full_path(path);
        if !full.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        fs::read_to_string(&full).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), StoreError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, content).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.full_path(path).exists()
    }

    #[cfg(unix)]
    fn mark_executable(&mut self, path: &Path) -> Result<(), StoreError> {
        use std::os::unix::fs::PermissionsExt;
        let full = self.full_path(path);
        fs::set_permissions(&full, fs::Permissions::from_mode(0o755)).map_err(|source| {
            StoreError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[cfg(not(unix))]
    fn mark_executable(&mut self, _path: &Path) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemStore {
    files: BTreeMap<PathBuf, String>,
    executable: BTreeSet<PathBuf>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn is_executable(&self, path: &Path) -> bool {
        self.executable.contains(path)
    }
}

impl ArtifactStore for MemStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_path_buf()))
    }

    fn write(&mut self, path: &Path, content: &str) -> Result<(), StoreError> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn mark_executable(&mut self, path: &Path) -> Result<(), StoreError> {
        self.executable.insert(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_store_round_trip() {
        let mut store = MemStore::new();
        let path = Path::new("r1/etc/frr/frr.conf");
        assert!(!store.exists(path));
        assert!(matches!(store.read(path), Err(StoreError::NotFound(_))));

        store.write(path, "router bgp 100\n").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.read(path).unwrap(), "router bgp 100\n");

        store.mark_executable(Path::new("r1.startup")).unwrap();
        assert!(store.is_executable(Path::new("r1.startup")));
    }

    #[test]
    fn test_fs_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsStore::new(dir.path());
        let path = Path::new("r1/etc/frr/daemons");

        store.write(path, "zebra=yes\n").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.read(path).unwrap(), "zebra=yes\n");
    }

    #[test]
    fn test_fs_store_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(matches!(
            store.read(Path::new("absent.conf")),
            Err(StoreError::NotFound(_))
        ));
    }
}
